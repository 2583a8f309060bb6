//! Slack messaging
//!
//! This module formats every user-visible message and delivers it through
//! one of three Slack surfaces.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │      messages                              │
//! │  - Swap ack / success / failure            │
//! │  - Schedule list                           │
//! │  - Weekend/holiday reminder                │
//! └────────────────────────────────────────────┘
//!                     │ SlackMessage
//!         ┌───────────┼────────────────┐
//!         ▼           ▼                ▼
//!   ┌──────────┐ ┌──────────────┐ ┌──────────────┐
//!   │ Incoming │ │ response_url │ │  Web API     │
//!   │ Webhook  │ │ (deferred)   │ │ (setTopic)   │
//!   └──────────┘ └──────────────┘ └──────────────┘
//! ```
//!
//! Messages use Block Kit with a plain `text` fallback where Slack shows
//! one in notifications.

pub mod channels;
pub mod messages;

use serde::{Deserialize, Serialize};

pub use channels::response_url::ResponseUrlClient;
pub use channels::slack_api::{SlackApiClient, SlackApiConfig, TopicChannel};
pub use channels::webhook::{WebhookChannel, WebhookConfig};
pub use channels::{Channel, ChannelError, ChannelResult, DeliveryStatus};

/// Who sees a slash-command response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Posted visibly to the whole channel
    InChannel,
    /// Visible only to the invoking user
    Ephemeral,
}

/// A Slack message payload
///
/// Serializes to the JSON shape accepted by incoming webhooks,
/// `response_url` callbacks and slash-command responses alike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackMessage {
    pub response_type: ResponseType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<serde_json::Value>,

    /// Target channel for incoming webhooks that allow overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl SlackMessage {
    /// Plain-text message visible to the channel
    pub fn in_channel(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::InChannel,
            text: Some(text.into()),
            blocks: Vec::new(),
            channel: None,
        }
    }

    /// Plain-text message visible only to the caller
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Ephemeral,
            ..Self::in_channel(text)
        }
    }

    /// Block Kit message visible to the channel
    pub fn blocks(blocks: Vec<serde_json::Value>) -> Self {
        Self {
            response_type: ResponseType::InChannel,
            text: None,
            blocks,
            channel: None,
        }
    }

    /// Set the fallback text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the target channel
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Concatenated text of the fallback and every block, for logs and assertions
    pub fn plain_text(&self) -> String {
        let mut out = self.text.clone().unwrap_or_default();
        for block in &self.blocks {
            collect_text(block, &mut out);
        }
        out
    }
}

fn collect_text(value: &serde_json::Value, out: &mut String) {
    match value {
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::String(text)) = map.get("text") {
                out.push('\n');
                out.push_str(text);
            }
            for (key, child) in map {
                if key != "text" || !child.is_string() {
                    collect_text(child, out);
                }
            }
        }
        serde_json::Value::Array(items) => items.iter().for_each(|v| collect_text(v, out)),
        _ => {}
    }
}
