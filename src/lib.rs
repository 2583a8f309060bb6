//! dangbeon - weekend/holiday on-call rotation
//!
//! Assigns one responder to every weekend day and public holiday, a month at
//! a time, and lets responders trade duties through a Slack slash command.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`calendar`] - Weekend and holiday classification
//! - [`roster`] - Ordered list of responders
//! - [`storage`] - Assignment stores (SQLite, PostgREST, in-memory)
//! - [`scheduler`] - Monthly rotation and the daily trigger
//! - [`swap`] - Slash-command parsing and the two-record swap
//! - [`dispatch`] - Immediate acknowledgment with deadline-bound background work
//! - [`notifications`] - Slack message builders and delivery channels
//! - [`reminder`] - Daily reminder and channel topic
//! - [`server`] - HTTP endpoints for the slash commands
//! - [`config`] - Configuration management and settings
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use dangbeon::config::Config;
//! use dangbeon::scheduler::RotationScheduler;
//! use dangbeon::storage::open_repository;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     config.validate()?;
//!
//!     let repo = open_repository(&config.storage)?;
//!     let scheduler = RotationScheduler::new(config.roster()?, config.calendar(), repo);
//!     let report = scheduler.schedule_next_month(config.clock()?.today()).await?;
//!     println!("created {}", report.created_count());
//!     Ok(())
//! }
//! ```

pub mod calendar;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod notifications;
pub mod reminder;
pub mod roster;
pub mod scheduler;
pub mod server;
pub mod storage;
pub mod swap;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::calendar::{CalendarPolicy, DayKind, HolidaySet};
    pub use crate::clock::Clock;
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::roster::{Responder, Roster};
    pub use crate::scheduler::{RotationScheduler, ScheduleReport};
    pub use crate::storage::{Assignment, AssignmentRepository, SharedAssignmentRepository};
    pub use crate::swap::{SwapCommand, SwapCoordinator, SwapOutcome};
}
