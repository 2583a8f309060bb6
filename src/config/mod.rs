//! Configuration management for dangbeon
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files. Secrets (store key, Slack tokens) are normally
//! supplied through the environment and override whatever the file says.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::calendar::{CalendarPolicy, HolidaySet};
use crate::clock::Clock;
use crate::dispatch::DispatchConfig;
use crate::notifications::channels::slack_api::{SlackApiConfig, DEFAULT_API_BASE_URL};
use crate::roster::{Responder, Roster};
use crate::scheduler::TriggerConfig;
use crate::storage::PostgrestConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Responders in rotation order
    pub roster: RosterConfig,

    /// Holiday table
    pub calendar: CalendarConfig,

    /// Assignment store
    pub storage: StorageConfig,

    /// Slack endpoints and credentials
    pub slack: SlackConfig,

    /// HTTP server
    pub server: ServerConfig,

    /// Slash command deadlines
    pub dispatch: DispatchConfig,

    /// Daily job trigger used by `serve`
    pub trigger: TriggerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Timezone used for "today"
    pub timezone: TimezoneConfig,
}

/// Roster configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Responders in rotation order
    pub members: Vec<Responder>,
}

/// Calendar configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// ISO dates of weekday holidays
    pub holidays: HolidaySet,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            holidays: HolidaySet::korean_2025_2026(),
        }
    }
}

/// Which assignment store to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Local SQLite file
    #[default]
    Sqlite,
    /// Hosted PostgREST table
    Postgrest,
    /// Process memory (lost on exit)
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "postgrest" | "supabase" => Ok(Self::Postgrest),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("Unknown storage backend '{other}' (expected sqlite, postgrest or memory)"),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// SQLite database path
    pub sqlite_path: PathBuf,

    /// PostgREST connection, required for the `postgrest` backend
    pub postgrest: Option<PostgrestConfig>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            sqlite_path: PathBuf::from("data/oncall.db"),
            postgrest: None,
        }
    }
}

/// Slack configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    /// Incoming webhook for reminders
    pub webhook_url: Option<String>,

    /// Bot token for topic updates
    pub bot_token: Option<String>,

    /// Channel whose topic tracks the responder
    pub channel_id: Option<String>,

    /// Web API base URL
    pub api_base_url: String,

    /// Timeout for outbound Slack calls, in seconds
    pub request_timeout_secs: u64,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            bot_token: None,
            channel_id: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 5,
        }
    }
}

impl SlackConfig {
    /// Web API settings, when both a token and a channel are configured
    pub fn api(&self) -> Option<(SlackApiConfig, String)> {
        let token = self.bot_token.as_deref().filter(|t| !t.trim().is_empty())?;
        let channel = self.channel_id.as_deref().filter(|c| !c.trim().is_empty())?;
        let config = SlackApiConfig {
            bot_token: token.to_string(),
            base_url: self.api_base_url.clone(),
            timeout_secs: self.request_timeout_secs,
        };
        Some((config, channel.to_string()))
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub bind_address: SocketAddr,

    /// Attach request tracing to the router
    pub enable_request_logging: bool,

    /// Seconds to wait for in-flight swaps on shutdown
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            enable_request_logging: true,
            shutdown_grace_secs: 10,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

/// Timezone configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimezoneConfig {
    /// Whole hours east of UTC
    pub utc_offset_hours: i32,
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        Self { utc_offset_hours: 9 }
    }
}

/// Parse `name:slack_id:phone` entries separated by commas
pub fn parse_roster_list(list: &str) -> Result<Vec<Responder>> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
            match parts.as_slice() {
                [name, slack_id, phone] => Ok(Responder::new(*name, *slack_id, *phone)),
                _ => anyhow::bail!("Invalid roster entry '{entry}', expected name:slack_id:phone"),
            }
        })
        .collect()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup
    ///
    /// Setting `SUPABASE_URL` without `DANGBEON_STORAGE_BACKEND` selects the
    /// PostgREST backend.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(list) = lookup("DANGBEON_ROSTER") {
            self.roster.members =
                parse_roster_list(&list).context("Failed to parse DANGBEON_ROSTER")?;
        }

        if let Some(raw) = lookup("DANGBEON_HOLIDAYS") {
            let dates: Vec<&str> = raw.split(',').map(str::trim).filter(|d| !d.is_empty()).collect();
            self.calendar.holidays =
                HolidaySet::parse(&dates).context("Failed to parse DANGBEON_HOLIDAYS")?;
        }

        if let Some(path) = lookup("DANGBEON_SQLITE_PATH") {
            self.storage.sqlite_path = PathBuf::from(path);
        }

        if let Some(url) = lookup("SUPABASE_URL") {
            let key = lookup("SUPABASE_KEY").unwrap_or_default();
            match self.storage.postgrest.as_mut() {
                Some(existing) => {
                    existing.base_url = url;
                    if !key.is_empty() {
                        existing.api_key = key;
                    }
                }
                None => self.storage.postgrest = Some(PostgrestConfig::new(url, key)),
            }
            self.storage.backend = StorageBackend::Postgrest;
        } else if let (Some(key), Some(existing)) =
            (lookup("SUPABASE_KEY"), self.storage.postgrest.as_mut())
        {
            existing.api_key = key;
        }

        if let Some(backend) = lookup("DANGBEON_STORAGE_BACKEND") {
            self.storage.backend = backend.parse()?;
        }

        if let Some(url) = lookup("SLACK_WEBHOOK_URL") {
            self.slack.webhook_url = Some(url);
        }
        if let Some(token) = lookup("SLACK_BOT_TOKEN") {
            self.slack.bot_token = Some(token);
        }
        if let Some(channel) = lookup("SLACK_CHANNEL_ID") {
            self.slack.channel_id = Some(channel);
        }

        if let Some(addr) = lookup("DANGBEON_BIND_ADDRESS") {
            self.server.bind_address = addr
                .parse()
                .with_context(|| format!("Invalid DANGBEON_BIND_ADDRESS: {addr}"))?;
        }

        if let Some(ms) = lookup("DANGBEON_ACK_DEADLINE_MS").and_then(|v| v.parse().ok()) {
            self.dispatch.ack_deadline_ms = ms;
        }
        if let Some(ms) = lookup("DANGBEON_OVERALL_DEADLINE_MS").and_then(|v| v.parse().ok()) {
            self.dispatch.overall_deadline_ms = ms;
        }

        if let Some(time) = lookup("DANGBEON_RUN_TIME") {
            self.trigger.run_time = time;
        }

        if let Some(level) = lookup("DANGBEON_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("DANGBEON_LOG_FORMAT") {
            self.logging.format = format;
        }

        if let Some(hours) = lookup("DANGBEON_UTC_OFFSET_HOURS").and_then(|v| v.parse().ok()) {
            self.timezone.utc_offset_hours = hours;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.roster().context("Invalid roster")?;

        self.dispatch
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid dispatch configuration: {e}"))?;

        self.trigger.validate()?;
        self.clock()?;

        if let Some(url) = &self.slack.webhook_url {
            url::Url::parse(url).with_context(|| format!("Invalid slack.webhook_url: {url}"))?;
        }
        url::Url::parse(&self.slack.api_base_url)
            .with_context(|| format!("Invalid slack.api_base_url: {}", self.slack.api_base_url))?;

        if self.storage.backend == StorageBackend::Postgrest {
            let Some(postgrest) = &self.storage.postgrest else {
                anyhow::bail!("storage.backend is postgrest but no PostgREST settings were given (set SUPABASE_URL)");
            };
            url::Url::parse(&postgrest.base_url)
                .with_context(|| format!("Invalid PostgREST base URL: {}", postgrest.base_url))?;
        }

        if !matches!(self.logging.format.as_str(), "text" | "json" | "pretty") {
            anyhow::bail!("logging.format must be text or json, got '{}'", self.logging.format);
        }

        Ok(())
    }

    /// Build the validated roster
    pub fn roster(&self) -> Result<Roster> {
        Ok(Roster::new(self.roster.members.clone())?)
    }

    /// Calendar policy over the configured holidays
    pub fn calendar(&self) -> CalendarPolicy {
        CalendarPolicy::new(self.calendar.holidays.clone())
    }

    /// Clock in the configured offset
    pub fn clock(&self) -> Result<Clock> {
        Clock::from_offset_hours(self.timezone.utc_offset_hours).ok_or_else(|| {
            anyhow::anyhow!(
                "timezone.utc_offset_hours out of range: {}",
                self.timezone.utc_offset_hours
            )
        })
    }
}
