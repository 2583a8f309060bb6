pub mod list;
pub mod remind;
pub mod schedule;
pub mod serve;
pub mod swap;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use dangbeon::clock::Clock;
use dangbeon::config::Config;
use dangbeon::notifications::{SlackApiClient, WebhookChannel, WebhookConfig};
use dangbeon::reminder::Reminder;
use dangbeon::scheduler::RotationScheduler;
use dangbeon::storage::{open_repository, SharedAssignmentRepository};

// Re-export command functions for convenience
pub use list::list;
pub use remind::remind;
pub use schedule::schedule;
pub use serve::serve;
pub use swap::swap;

/// Components every command builds from the validated configuration
pub struct AppContext {
    pub config: Config,
    pub clock: Clock,
    pub repo: SharedAssignmentRepository,
    pub scheduler: Arc<RotationScheduler>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let clock = config.clock()?;
        let roster = config.roster()?;
        let repo = open_repository(&config.storage).context("Failed to open assignment store")?;
        let scheduler = Arc::new(RotationScheduler::new(roster, config.calendar(), repo.clone()));

        tracing::debug!(
            responders = scheduler.roster().len(),
            holidays = config.calendar.holidays.len(),
            backend = ?config.storage.backend,
            "Application context ready"
        );

        Ok(Self {
            config,
            clock,
            repo,
            scheduler,
        })
    }

    /// Daily reminder job wired to the configured Slack surfaces
    pub fn reminder(&self) -> Result<Reminder> {
        let slack = &self.config.slack;
        let mut reminder = Reminder::new(self.scheduler.clone(), self.repo.clone());

        if let Some(url) = slack.webhook_url.as_deref().filter(|u| !u.trim().is_empty()) {
            let channel = WebhookChannel::new(
                WebhookConfig::new(url).with_timeout(slack.request_timeout_secs),
            )
            .context("Failed to create reminder webhook")?;
            reminder = reminder.with_channel(Arc::new(channel));
        }

        if let Some(channel_id) = slack.channel_id.as_deref().filter(|c| !c.trim().is_empty()) {
            reminder = reminder.post_to(channel_id);
        }

        if let Some((api, channel_id)) = slack.api() {
            let client = SlackApiClient::new(&api).context("Failed to create Slack API client")?;
            reminder = reminder.with_topic(Arc::new(client), channel_id);
        }

        Ok(reminder)
    }

    /// Timeout for outbound Slack calls
    pub fn slack_timeout(&self) -> Duration {
        Duration::from_secs(self.config.slack.request_timeout_secs)
    }
}
