//! Slack Web API client
//!
//! Only `conversations.setTopic` is needed: the reminder keeps the channel
//! topic pointed at the current responder. The Web API reports failures in
//! the body (`{"ok": false, "error": "..."}`) with HTTP 200, so the `ok`
//! flag is checked on every response.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChannelError, ChannelResult};

/// Default Web API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";

/// Settings for the Web API client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackApiConfig {
    /// Bot token (`xoxb-...`)
    pub bot_token: String,
    /// API base URL, overridable for testing
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    10
}

impl SlackApiConfig {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }

    /// Override the API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Something that can set a channel topic
#[async_trait]
pub trait TopicChannel: Send + Sync {
    /// Replace the topic of `channel`; an empty topic clears it
    async fn set_topic(&self, channel: &str, topic: &str) -> ChannelResult<()>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Slack Web API client authenticated with a bot token
pub struct SlackApiClient {
    client: Client,
    base_url: String,
    bot_token: String,
}

impl SlackApiClient {
    /// Create a new client
    pub fn new(config: &SlackApiConfig) -> ChannelResult<Self> {
        if config.bot_token.trim().is_empty() {
            return Err(ChannelError::InvalidConfig(
                "Slack bot token cannot be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
        })
    }

    async fn call(&self, method: &str, payload: serde_json::Value) -> ChannelResult<()> {
        let response = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .bearer_auth(&self.bot_token)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ChannelError::from_response(response).await);
        }

        let body: ApiResponse = response.json().await?;
        if !body.ok {
            return Err(ChannelError::Api(
                body.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl TopicChannel for SlackApiClient {
    async fn set_topic(&self, channel: &str, topic: &str) -> ChannelResult<()> {
        self.call(
            "conversations.setTopic",
            serde_json::json!({ "channel": channel, "topic": topic }),
        )
        .await?;

        if topic.is_empty() {
            tracing::info!(channel, "Removed channel topic");
        } else {
            tracing::info!(channel, topic, "Updated channel topic");
        }
        Ok(())
    }
}
