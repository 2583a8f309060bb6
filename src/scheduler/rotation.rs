//! Monthly round-robin rotation
//!
//! This module implements the monthly scheduling pass that ensures:
//! - Every qualifying day of a month gets exactly one responder
//! - Rotation continues across month boundaries from the last stored assignment
//! - Running the pass twice for the same month never double-books
//!
//! The rotation cursor is never stored. It is recovered on each run from the
//! responder of the most recent assignment.

use chrono::{Datelike, Duration, NaiveDate};
use std::fmt;

use super::error::{SchedulerError, SchedulerResult};
use crate::calendar::{month_bounds, next_month, CalendarPolicy};
use crate::roster::Roster;
use crate::storage::{NewAssignment, SharedAssignmentRepository};

/// Scheduling is due once the last assignment is this close to its month end
///
/// The distance is measured from the last stored assignment, not from today.
/// A month's last weekend day is always within a week of its month end, so
/// every run books one more month: a daily trigger advances the schedule by
/// one month per day.
pub const DEFAULT_LOOKAHEAD_DAYS: i64 = 30;

// ============================================================================
// Reports
// ============================================================================

/// Why a scheduling pass created nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoOpReason {
    /// The last assignment's month ends too far in the future
    TooEarly {
        last_date: NaiveDate,
        days_until_month_end: i64,
    },
    /// The target month already has at least one assignment
    AlreadyScheduled { year: i32, month: u32 },
    /// The target month has no weekend or holiday
    NoQualifyingDays { year: i32, month: u32 },
}

impl fmt::Display for NoOpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooEarly {
                last_date,
                days_until_month_end,
            } => write!(
                f,
                "last assignment {} is {} days from its month end; not due yet",
                last_date, days_until_month_end
            ),
            Self::AlreadyScheduled { year, month } => {
                write!(f, "schedule already exists for {}-{:02}", year, month)
            }
            Self::NoQualifyingDays { year, month } => {
                write!(f, "no weekend/holiday assignments needed for {}-{:02}", year, month)
            }
        }
    }
}

/// Assignments generated for one month
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthPlan {
    pub year: i32,
    pub month: u32,
    /// Roster index given the first qualifying day
    pub start_index: usize,
    /// Roster index the following month will start from
    pub next_index: usize,
    pub assignments: Vec<NewAssignment>,
}

/// Result of a scheduling pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleReport {
    /// Assignments were generated and persisted
    Created(MonthPlan),
    /// Assignments were generated but not persisted (dry run)
    Planned(MonthPlan),
    /// Nothing to do
    NoOp(NoOpReason),
}

impl ScheduleReport {
    /// Number of assignments persisted by this pass
    pub fn created_count(&self) -> usize {
        match self {
            Self::Created(plan) => plan.assignments.len(),
            Self::Planned(_) | Self::NoOp(_) => 0,
        }
    }

    /// Generated plan, persisted or not
    pub fn plan(&self) -> Option<&MonthPlan> {
        match self {
            Self::Created(plan) | Self::Planned(plan) => Some(plan),
            Self::NoOp(_) => None,
        }
    }
}

/// Days from `date` to the first day of the following month
///
/// A date on the last day of its month yields 1.
pub fn days_until_end_of_month(date: NaiveDate) -> Option<i64> {
    let (_, last) = month_bounds(date.year(), date.month())?;
    Some(((last + Duration::days(1)) - date).num_days())
}

#[derive(Debug, Clone, Copy)]
struct Target {
    year: i32,
    month: u32,
    start_index: usize,
}

// ============================================================================
// Rotation Scheduler
// ============================================================================

/// Produces next month's assignments exactly once
pub struct RotationScheduler {
    roster: Roster,
    calendar: CalendarPolicy,
    repo: SharedAssignmentRepository,
    lookahead_days: i64,
}

impl RotationScheduler {
    /// Create a scheduler over a roster, calendar and store
    pub fn new(roster: Roster, calendar: CalendarPolicy, repo: SharedAssignmentRepository) -> Self {
        Self {
            roster,
            calendar,
            repo,
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
        }
    }

    /// Override the lookahead window
    pub fn with_lookahead_days(mut self, days: i64) -> Self {
        self.lookahead_days = days.max(0);
        self
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn calendar(&self) -> &CalendarPolicy {
        &self.calendar
    }

    /// Walk a month day by day, assigning qualifying days round-robin
    ///
    /// Pure: reads nothing from the store.
    pub fn plan_month(&self, year: i32, month: u32, start_index: usize) -> SchedulerResult<MonthPlan> {
        let days = self
            .calendar
            .qualifying_days(year, month)
            .ok_or_else(|| SchedulerError::invalid_month(year, month))?;

        let start_index = start_index % self.roster.len();
        let mut cursor = start_index;
        let mut assignments = Vec::with_capacity(days.len());

        for date in days {
            assignments.push(NewAssignment::new(date, self.roster.at(cursor).name.clone()));
            cursor = self.roster.next_index(cursor);
        }

        Ok(MonthPlan {
            year,
            month,
            start_index,
            next_index: cursor,
            assignments,
        })
    }

    async fn resolve_target(&self, today: NaiveDate) -> SchedulerResult<Result<Target, NoOpReason>> {
        let Some(last) = self.repo.latest().await? else {
            tracing::info!("No existing on-call schedule found, creating schedule for current month");
            return Ok(Ok(Target {
                year: today.year(),
                month: today.month(),
                start_index: 0,
            }));
        };

        let remaining = days_until_end_of_month(last.date).ok_or_else(|| {
            SchedulerError::invalid_month(last.date.year(), last.date.month())
        })?;

        tracing::debug!(
            last_date = %last.date,
            last_responder = %last.responder,
            days_until_month_end = remaining,
            "Latest assignment found"
        );

        if remaining > self.lookahead_days {
            return Ok(Err(NoOpReason::TooEarly {
                last_date: last.date,
                days_until_month_end: remaining,
            }));
        }

        let last_index = self
            .roster
            .index_of(&last.responder)
            .ok_or_else(|| SchedulerError::unknown_responder(&last.responder, &self.roster.names()))?;

        let (year, month) = next_month(last.date.year(), last.date.month());

        Ok(Ok(Target {
            year,
            month,
            start_index: self.roster.next_index(last_index),
        }))
    }

    async fn run(&self, today: NaiveDate, persist: bool) -> SchedulerResult<ScheduleReport> {
        let target = match self.resolve_target(today).await? {
            Ok(target) => target,
            Err(reason) => {
                tracing::info!(%reason, "Scheduling skipped");
                return Ok(ScheduleReport::NoOp(reason));
            }
        };

        let (first, last) = month_bounds(target.year, target.month)
            .ok_or_else(|| SchedulerError::invalid_month(target.year, target.month))?;

        if self.repo.exists_between(first, last).await? {
            let reason = NoOpReason::AlreadyScheduled {
                year: target.year,
                month: target.month,
            };
            tracing::info!(%reason, "Scheduling skipped");
            return Ok(ScheduleReport::NoOp(reason));
        }

        let plan = self.plan_month(target.year, target.month, target.start_index)?;

        if plan.assignments.is_empty() {
            let reason = NoOpReason::NoQualifyingDays {
                year: target.year,
                month: target.month,
            };
            tracing::info!(%reason, "Scheduling skipped");
            return Ok(ScheduleReport::NoOp(reason));
        }

        if !persist {
            return Ok(ScheduleReport::Planned(plan));
        }

        let inserted = self.repo.insert_batch(&plan.assignments).await?;

        tracing::info!(
            year = plan.year,
            month = plan.month,
            count = inserted,
            first_responder = %plan.assignments[0].responder,
            "Created monthly on-call schedule"
        );
        for assignment in &plan.assignments {
            tracing::debug!(date = %assignment.date, responder = %assignment.responder, "Assigned");
        }

        Ok(ScheduleReport::Created(plan))
    }

    /// Generate and persist the next month's assignments if due
    pub async fn schedule_next_month(&self, today: NaiveDate) -> SchedulerResult<ScheduleReport> {
        self.run(today, true).await
    }

    /// Same decision as [`schedule_next_month`](Self::schedule_next_month) without writing
    pub async fn preview_next_month(&self, today: NaiveDate) -> SchedulerResult<ScheduleReport> {
        self.run(today, false).await
    }

    /// Format a plan as a table
    pub fn format_plan(&self, plan: &MonthPlan) -> String {
        let mut output = format!("Schedule for {}-{:02}\n", plan.year, plan.month);
        output.push_str(&format!("{:=<40}\n", ""));
        output.push_str(&format!("{:<14} | {:<6} | {}\n", "Date", "Day", "Responder"));
        output.push_str(&format!("{:-<40}\n", ""));

        for assignment in &plan.assignments {
            output.push_str(&format!(
                "{:<14} | {:<6} | {}\n",
                assignment.date.to_string(),
                self.calendar.day_kind(assignment.date).korean_label(),
                assignment.responder
            ));
        }

        output
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::HolidaySet;
    use crate::roster::Responder;
    use crate::storage::MockAssignmentRepository;
    use std::sync::Arc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn roster(names: &[&str]) -> Roster {
        Roster::new(
            names
                .iter()
                .enumerate()
                .map(|(i, n)| Responder::new(*n, format!("U{i}"), format!("010-0000-{i:04}")))
                .collect(),
        )
        .unwrap()
    }

    fn scheduler(repo: Arc<MockAssignmentRepository>) -> RotationScheduler {
        RotationScheduler::new(roster(&["A", "B", "C"]), CalendarPolicy::default(), repo)
    }

    #[test]
    fn test_days_until_end_of_month() {
        assert_eq!(days_until_end_of_month(d(2025, 5, 31)), Some(1));
        assert_eq!(days_until_end_of_month(d(2025, 5, 1)), Some(31));
        assert_eq!(days_until_end_of_month(d(2024, 2, 1)), Some(29));
    }

    #[test]
    fn test_plan_month_wraps_roster() {
        let s = scheduler(Arc::new(MockAssignmentRepository::new()));
        let plan = s.plan_month(2025, 6, 0).unwrap();

        let names: Vec<_> = plan.assignments.iter().map(|a| a.responder.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C", "A", "B", "C", "A", "B", "C"]);
        assert_eq!(plan.next_index, 0);
    }

    #[test]
    fn test_plan_month_invalid_month() {
        let s = scheduler(Arc::new(MockAssignmentRepository::new()));
        assert!(matches!(
            s.plan_month(2025, 0, 0),
            Err(SchedulerError::InvalidMonth { .. })
        ));
    }

    #[test]
    fn test_plan_month_includes_holidays() {
        let repo = Arc::new(MockAssignmentRepository::new());
        let s = RotationScheduler::new(
            roster(&["A", "B"]),
            CalendarPolicy::new(HolidaySet::new([d(2025, 6, 6)])),
            repo,
        );
        let plan = s.plan_month(2025, 6, 0).unwrap();
        assert_eq!(plan.assignments.len(), 10);
        assert!(plan.assignments.iter().any(|a| a.date == d(2025, 6, 6)));
    }

    #[tokio::test]
    async fn test_first_run_starts_current_month_at_roster_head() {
        let repo = Arc::new(MockAssignmentRepository::new());
        let s = scheduler(repo.clone());

        let report = s.schedule_next_month(d(2025, 6, 15)).await.unwrap();
        let plan = report.plan().unwrap();
        assert_eq!((plan.year, plan.month), (2025, 6));
        assert_eq!(plan.assignments[0].responder, "A");
        assert_eq!(repo.len(), 9);
    }

    #[tokio::test]
    async fn test_too_early() {
        let repo = Arc::new(MockAssignmentRepository::new());
        repo.seed(d(2025, 7, 1), "A");
        let s = scheduler(repo.clone());

        let report = s.schedule_next_month(d(2025, 6, 15)).await.unwrap();
        assert!(matches!(
            report,
            ScheduleReport::NoOp(NoOpReason::TooEarly { days_until_month_end: 31, .. })
        ));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_last_responder() {
        let repo = Arc::new(MockAssignmentRepository::new());
        repo.seed(d(2025, 5, 31), "Z");
        let s = scheduler(repo);

        let err = s.schedule_next_month(d(2025, 5, 20)).await.unwrap_err();
        assert!(matches!(err, SchedulerError::UnknownResponder { .. }));
    }

    #[tokio::test]
    async fn test_preview_does_not_write() {
        let repo = Arc::new(MockAssignmentRepository::new());
        repo.seed(d(2025, 5, 31), "C");
        let s = scheduler(repo.clone());

        let report = s.preview_next_month(d(2025, 5, 20)).await.unwrap();
        assert!(matches!(report, ScheduleReport::Planned(_)));
        assert_eq!(report.created_count(), 0);
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_format_plan() {
        let s = scheduler(Arc::new(MockAssignmentRepository::new()));
        let plan = s.plan_month(2025, 6, 0).unwrap();
        let formatted = s.format_plan(&plan);
        assert!(formatted.contains("2025-06"));
        assert!(formatted.contains("2025-06-07"));
        assert!(formatted.contains("주말"));
    }
}
