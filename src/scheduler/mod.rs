//! Monthly on-call rotation scheduling
//!
//! This module assigns responders to weekend and holiday dates one month at
//! a time.
//!
//! # Overview
//!
//! Each run reads the most recent stored assignment, decides whether the
//! following month is due, and if so walks that month day by day handing
//! qualifying days to the roster in round-robin order. The rotation cursor
//! is recovered from the last assignment's responder, so rotation continues
//! across month boundaries without storing any extra state.
//!
//! # Run Decisions
//!
//! | Condition | Result |
//! |-----------|--------|
//! | No history | Schedule the current month from the first responder |
//! | Last assignment more than 30 days from its month end | `TooEarly` |
//! | Target month already has an assignment | `AlreadyScheduled` |
//! | Target month has no qualifying day | `NoQualifyingDays` |
//! | Otherwise | `Created`, one batch insert |
//!
//! # Quick Start
//!
//! ```ignore
//! use dangbeon::scheduler::{RotationScheduler, ScheduleReport};
//!
//! let scheduler = RotationScheduler::new(roster, calendar, repo);
//! match scheduler.schedule_next_month(today).await? {
//!     ScheduleReport::Created(plan) => println!("{} assignments", plan.assignments.len()),
//!     ScheduleReport::NoOp(reason) => println!("skipped: {reason}"),
//!     ScheduleReport::Planned(_) => {}
//! }
//! ```
//!
//! # Modules
//!
//! - [`rotation`] - Round-robin month planning and the run decision
//! - [`trigger`] - Daily wall-clock trigger for the periodic job
//! - [`error`] - Scheduler errors

pub mod error;
pub mod rotation;
pub mod trigger;

pub use error::{SchedulerError, SchedulerResult};
pub use rotation::{
    days_until_end_of_month, MonthPlan, NoOpReason, RotationScheduler, ScheduleReport,
    DEFAULT_LOOKAHEAD_DAYS,
};
pub use trigger::{DailyTrigger, TriggerConfig, TriggerEvent};
