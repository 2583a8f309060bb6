//! Daily on-call reminder
//!
//! The periodic job run once a day:
//!
//! 1. Run the monthly scheduler so next month exists before it starts
//! 2. Look up today's assignment
//! 3. On weekends and holidays, mention the responder in the channel and
//!    point the channel topic at them
//! 4. On ordinary weekdays, clear the channel topic
//!
//! The topic is only touched after the reminder went out, and only when a
//! bot token is configured.

use chrono::NaiveDate;
use std::sync::Arc;

use crate::calendar::DayKind;
use crate::notifications::{messages, Channel, TopicChannel};
use crate::scheduler::{RotationScheduler, ScheduleReport};
use crate::storage::{SharedAssignmentRepository, StorageResult};

/// What happened to the reminder message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderAction {
    /// Posted to the channel
    Sent,
    /// Today is an ordinary weekday
    NotQualifying,
    /// Nobody is assigned today
    NoAssignment,
    /// Today's responder is not on the roster
    UnknownResponder(String),
    /// No incoming webhook configured
    NoChannel,
    /// Posting failed
    Failed(String),
}

/// What happened to the channel topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicAction {
    /// Topic set to the given text
    Updated(String),
    /// Topic cleared
    Cleared,
    /// No bot token or channel configured
    SkippedNoToken,
    /// Reminder was not sent, so the topic was left alone
    Skipped,
    /// Web API call failed
    Failed(String),
}

/// Summary of one reminder run
#[derive(Debug, Clone)]
pub struct ReminderReport {
    pub date: NaiveDate,
    pub day_kind: DayKind,
    /// Scheduler result, or its error text
    pub schedule: Result<ScheduleReport, String>,
    pub responder: Option<String>,
    pub reminder: ReminderAction,
    pub topic: TopicAction,
}

struct TopicTarget {
    client: Arc<dyn TopicChannel>,
    channel_id: String,
}

/// Runs the daily reminder job
pub struct Reminder {
    scheduler: Arc<RotationScheduler>,
    repo: SharedAssignmentRepository,
    notifier: Option<Arc<dyn Channel>>,
    post_to: Option<String>,
    topic: Option<TopicTarget>,
}

impl Reminder {
    pub fn new(scheduler: Arc<RotationScheduler>, repo: SharedAssignmentRepository) -> Self {
        Self {
            scheduler,
            repo,
            notifier: None,
            post_to: None,
            topic: None,
        }
    }

    /// Channel that receives the reminder message
    pub fn with_channel(mut self, channel: Arc<dyn Channel>) -> Self {
        self.notifier = Some(channel);
        self
    }

    /// Channel id written into the reminder payload
    pub fn post_to(mut self, channel_id: impl Into<String>) -> Self {
        self.post_to = Some(channel_id.into());
        self
    }

    /// Web API client and channel id for topic updates
    pub fn with_topic(mut self, client: Arc<dyn TopicChannel>, channel_id: impl Into<String>) -> Self {
        self.topic = Some(TopicTarget {
            client,
            channel_id: channel_id.into(),
        });
        self
    }

    /// Run the job for `today`
    pub async fn run(&self, today: NaiveDate) -> StorageResult<ReminderReport> {
        let schedule = match self.scheduler.schedule_next_month(today).await {
            Ok(report) => Ok(report),
            Err(e) => {
                tracing::error!(error = %e, "Error creating monthly on-call schedule");
                Err(e.to_string())
            }
        };

        let day_kind = self.scheduler.calendar().day_kind(today);
        let current = self.repo.on_date(today).await?;
        let responder = current.map(|a| a.responder);

        let mut report = ReminderReport {
            date: today,
            day_kind,
            schedule,
            responder: responder.clone(),
            reminder: ReminderAction::NotQualifying,
            topic: TopicAction::Skipped,
        };

        if !day_kind.is_qualifying() {
            tracing::info!(%today, "Skipping reminder - not a weekend or holiday");
            report.topic = self.set_topic("").await;
            return Ok(report);
        }

        let Some(name) = responder else {
            tracing::info!(%today, "No on-call person assigned for today; skipping notification and topic update");
            report.reminder = ReminderAction::NoAssignment;
            return Ok(report);
        };

        let Some(person) = self.scheduler.roster().find(&name) else {
            tracing::warn!(responder = %name, "Today's responder is not in the roster");
            report.reminder = ReminderAction::UnknownResponder(name);
            return Ok(report);
        };

        let Some(notifier) = &self.notifier else {
            tracing::warn!("No reminder webhook configured; skipping notification");
            report.reminder = ReminderAction::NoChannel;
            return Ok(report);
        };

        let mut message = messages::reminder(today, day_kind, person);
        if let Some(channel_id) = &self.post_to {
            message = message.with_channel(channel_id.clone());
        }
        report.reminder = match notifier.send(&message).await {
            Ok(status) if status.success => ReminderAction::Sent,
            Ok(status) => ReminderAction::Failed(status.message.unwrap_or_default()),
            Err(e) => ReminderAction::Failed(e.to_string()),
        };

        if report.reminder == ReminderAction::Sent {
            tracing::info!(responder = %person.name, kind = %day_kind, "Sent on-call reminder");
            report.topic = self.set_topic(&messages::oncall_topic(person)).await;
        } else {
            tracing::warn!(reminder = ?report.reminder, "Reminder not delivered; leaving topic unchanged");
        }

        Ok(report)
    }

    async fn set_topic(&self, topic: &str) -> TopicAction {
        let Some(target) = &self.topic else {
            tracing::warn!("SLACK_BOT_TOKEN not set, skipping channel topic update");
            return TopicAction::SkippedNoToken;
        };

        match target.client.set_topic(&target.channel_id, topic).await {
            Ok(()) if topic.is_empty() => TopicAction::Cleared,
            Ok(()) => TopicAction::Updated(topic.to_string()),
            Err(e) => {
                tracing::error!(error = %e, "Error updating channel topic");
                TopicAction::Failed(e.to_string())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
