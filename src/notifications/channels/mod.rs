//! Delivery channels for Slack messages
//!
//! - [`webhook`] - Incoming webhook bound to one channel
//! - [`response_url`] - Per-command callback address
//! - [`slack_api`] - Web API calls made with a bot token

pub mod response_url;
pub mod slack_api;
pub mod webhook;

use async_trait::async_trait;
use reqwest::Response;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::SlackMessage;

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors that can occur during channel operations
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid channel configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Endpoint answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Slack Web API answered `ok: false`
    #[error("Slack API error: {0}")]
    Api(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl ChannelError {
    /// Errors worth another attempt later
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::HttpError(_) | Self::RateLimited(_) => true,
            Self::Rejected { status, .. } => *status >= 500,
            Self::InvalidConfig(_) | Self::Api(_) | Self::SerializationError(_) => false,
        }
    }

    /// Get Korean description for the error
    pub fn korean_desc(&self) -> String {
        match self {
            Self::HttpError(_) => "Slack에 연결할 수 없습니다.".to_string(),
            Self::InvalidConfig(msg) => format!("Slack 설정 오류: {msg}"),
            Self::Rejected { status, .. } => format!("Slack 응답 오류 (HTTP {status})"),
            Self::RateLimited(_) => "Slack 요청 한도를 초과했습니다.".to_string(),
            Self::Api(code) => format!("Slack API 오류: {code}"),
            Self::SerializationError(_) => "메시지 직렬화 오류".to_string(),
        }
    }

    /// Turn a non-success response into an error, reading its body
    pub(crate) async fn from_response(response: Response) -> Self {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimited(body)
        } else {
            Self::Rejected {
                status: status.as_u16(),
                body,
            }
        }
    }
}

/// Response from sending a notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryStatus {
    /// Whether the notification was successfully delivered
    pub success: bool,
    /// Channel that delivered (or failed to deliver) the notification
    pub channel: String,
    /// Optional message about the delivery
    pub message: Option<String>,
    /// Timestamp of delivery attempt
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl DeliveryStatus {
    /// Create a successful delivery status
    pub fn success(channel: impl Into<String>) -> Self {
        Self {
            success: true,
            channel: channel.into(),
            message: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create a failed delivery status
    pub fn failure(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            channel: channel.into(),
            message: Some(message.into()),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "SUCCESS" } else { "FAILED" };
        write!(f, "[{status}] {}", self.channel)?;
        if let Some(msg) = &self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

/// A destination that accepts Slack messages
#[async_trait]
pub trait Channel: Send + Sync {
    /// Get the channel name
    fn name(&self) -> &str;

    /// Send a message through this channel
    async fn send(&self, message: &SlackMessage) -> ChannelResult<DeliveryStatus>;
}
