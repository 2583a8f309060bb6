//! Daily trigger for the periodic job
//!
//! Fires a job once a day at a wall-clock time in the rotation's timezone
//! (09:00 KST by default), optionally once more right at startup. The job
//! itself is opaque to the trigger; the server wires in the reminder run.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::sync::broadcast;

use super::error::{SchedulerError, SchedulerResult};
use crate::clock::Clock;

// ============================================================================
// Trigger Configuration
// ============================================================================

/// Configuration for the daily trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Time of day to fire (24h `HH:MM`)
    pub run_time: String,

    /// Fire once immediately when the loop starts
    pub run_on_startup: bool,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            run_time: "09:00".to_string(),
            run_on_startup: true,
        }
    }
}

impl TriggerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> SchedulerResult<()> {
        self.parse_run_time().map(|_| ())
    }

    /// Parse the run time
    pub fn parse_run_time(&self) -> SchedulerResult<NaiveTime> {
        NaiveTime::parse_from_str(&self.run_time, "%H:%M").map_err(|_| {
            SchedulerError::trigger_config(
                "run_time",
                format!("Invalid time format '{}'. Expected HH:MM", self.run_time),
            )
        })
    }
}

// ============================================================================
// Daily Trigger
// ============================================================================

/// Event emitted each time the trigger fires
#[derive(Debug, Clone)]
pub struct TriggerEvent {
    pub fired_at: DateTime<Utc>,
    pub on_startup: bool,
}

/// Runs a job every day at a fixed local time
pub struct DailyTrigger {
    config: TriggerConfig,
    run_time: NaiveTime,
    clock: Clock,
    event_sender: broadcast::Sender<TriggerEvent>,
}

impl DailyTrigger {
    /// Create a trigger, validating the run time
    pub fn new(config: TriggerConfig, clock: Clock) -> SchedulerResult<Self> {
        let run_time = config.parse_run_time()?;
        let (event_sender, _) = broadcast::channel(16);

        Ok(Self {
            config,
            run_time,
            clock,
            event_sender,
        })
    }

    /// Subscribe to fire events
    pub fn subscribe(&self) -> broadcast::Receiver<TriggerEvent> {
        self.event_sender.subscribe()
    }

    /// Time from `now` until the next run time, always positive
    pub fn duration_until_next(&self, now: DateTime<FixedOffset>) -> Duration {
        let local = now.naive_local();
        let target = local.date().and_time(self.run_time);
        let until = target - local;

        if until > Duration::zero() {
            until
        } else {
            until + Duration::days(1)
        }
    }

    fn emit(&self, on_startup: bool) {
        let _ = self.event_sender.send(TriggerEvent {
            fired_at: Utc::now(),
            on_startup,
        });
    }

    /// Run `job` daily until `shutdown` resolves
    pub async fn run<F, Fut, S>(&self, mut job: F, shutdown: S)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        if self.config.run_on_startup {
            tracing::info!("Running periodic job on startup");
            job().await;
            self.emit(true);
        }

        loop {
            let wait = self
                .duration_until_next(self.clock.now())
                .to_std()
                .unwrap_or(std::time::Duration::from_secs(60));
            tracing::debug!(wait_secs = wait.as_secs(), run_time = %self.run_time, "Waiting for next run");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    job().await;
                    self.emit(false);
                }
                _ = &mut shutdown => {
                    tracing::info!("Daily trigger stopped");
                    break;
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
