//! Deferred replies to slash commands
//!
//! Slack hands each slash command a `response_url` that accepts a JSON
//! message for a limited time after the command. Delivery is attempted
//! once; failures are reported to the caller, never retried.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{ChannelError, ChannelResult};
use crate::dispatch::CallbackSink;
use crate::notifications::SlackMessage;

/// Posts messages to per-command callback URLs
#[derive(Clone)]
pub struct ResponseUrlClient {
    client: Client,
}

impl ResponseUrlClient {
    /// Create a client with a per-request timeout
    pub fn new(timeout: Duration) -> ChannelResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Post one message to `url`
    pub async fn post(&self, url: &str, message: &SlackMessage) -> ChannelResult<()> {
        url::Url::parse(url)
            .map_err(|e| ChannelError::InvalidConfig(format!("Invalid response_url: {e}")))?;

        let response = self.client.post(url).json(message).send().await?;
        if !response.status().is_success() {
            return Err(ChannelError::from_response(response).await);
        }

        tracing::debug!(status = %response.status(), "Delivered deferred response");
        Ok(())
    }
}

#[async_trait]
impl CallbackSink for ResponseUrlClient {
    async fn deliver(&self, callback: &str, message: &SlackMessage) -> ChannelResult<()> {
        self.post(callback, message).await
    }
}
