//! Incoming webhook channel
//!
//! Posts a [`SlackMessage`] as JSON to a Slack incoming webhook URL.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Channel, ChannelError, ChannelResult, DeliveryStatus};
use crate::notifications::SlackMessage;

/// Upper bound for `max_retries`
pub const MAX_WEBHOOK_RETRIES: u32 = 8;

/// Webhook channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL endpoint
    pub url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Retry attempts after a failed post (server errors only)
    #[serde(default)]
    pub max_retries: u32,
}

fn default_timeout() -> u64 {
    10
}

impl WebhookConfig {
    /// Create a new webhook configuration
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: default_timeout(),
            max_retries: 0,
        }
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set max retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("Webhook URL cannot be empty".to_string());
        }

        let parsed = url::Url::parse(&self.url).map_err(|e| format!("Invalid webhook URL: {e}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err("Webhook URL must start with http:// or https://".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        if self.max_retries > MAX_WEBHOOK_RETRIES {
            return Err(format!(
                "max_retries must be at most {MAX_WEBHOOK_RETRIES}, got {}",
                self.max_retries
            ));
        }

        Ok(())
    }
}

/// Incoming webhook channel
///
/// # Example
///
/// ```rust,ignore
/// use dangbeon::notifications::{WebhookChannel, WebhookConfig, SlackMessage};
///
/// let channel = WebhookChannel::new(WebhookConfig::new("https://hooks.slack.com/services/..."))?;
/// channel.send(&SlackMessage::in_channel("hello")).await?;
/// ```
pub struct WebhookChannel {
    config: WebhookConfig,
    client: Client,
}

impl WebhookChannel {
    /// Create a new webhook channel
    pub fn new(config: WebhookConfig) -> ChannelResult<Self> {
        config.validate().map_err(ChannelError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Create a simple webhook channel with just a URL
    pub fn from_url(url: impl Into<String>) -> ChannelResult<Self> {
        Self::new(WebhookConfig::new(url))
    }

    /// Get the webhook URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Send the request with retry logic
    async fn send_with_retry(&self, message: &SlackMessage) -> ChannelResult<()> {
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s...
                let delay = Duration::from_secs(2_u64.saturating_pow(attempt - 1));
                tokio::time::sleep(delay).await;
                tracing::debug!(
                    "Retrying webhook request (attempt {}/{})",
                    attempt + 1,
                    self.config.max_retries + 1
                );
            }

            let error = match self.client.post(&self.config.url).json(message).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::info!(status = %response.status(), "Webhook delivered");
                    return Ok(());
                }
                Ok(response) => ChannelError::from_response(response).await,
                Err(e) => ChannelError::HttpError(e),
            };

            attempt += 1;

            // Don't retry on client errors (4xx)
            if !error.is_recoverable() || attempt > self.config.max_retries {
                return Err(error);
            }
        }
    }
}

#[async_trait]
impl Channel for WebhookChannel {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, message: &SlackMessage) -> ChannelResult<DeliveryStatus> {
        match self.send_with_retry(message).await {
            Ok(()) => Ok(DeliveryStatus::success("webhook")),
            Err(e) => {
                tracing::error!(error = %e, "Failed to deliver webhook");
                Ok(DeliveryStatus::failure("webhook", e.to_string()))
            }
        }
    }
}
