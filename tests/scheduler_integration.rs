//! Integration tests for the monthly rotation
//!
//! These tests run the scheduler against real stores:
//! - Fresh history and cross-month continuity
//! - Idempotence per month
//! - Coverage of qualifying days only

mod common;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Weekday};
use common::{d, roster, weekends_only};
use dangbeon::calendar::{CalendarPolicy, HolidaySet};
use dangbeon::scheduler::{NoOpReason, RotationScheduler, ScheduleReport};
use dangbeon::storage::{
    Assignment, AssignmentRepository, MockAssignmentRepository, NewAssignment, RecordId,
    SqliteAssignmentRepository, StorageResult,
};
use std::sync::Arc;
use tempfile::TempDir;

// ============================================================================
// Rotation Order
// ============================================================================

#[tokio::test]
async fn test_continues_after_last_responder() {
    let repo = Arc::new(MockAssignmentRepository::new());
    repo.seed(d(2025, 5, 31), "C");
    let scheduler = RotationScheduler::new(roster(&["A", "B", "C"]), weekends_only(), repo.clone());

    let report = scheduler.schedule_next_month(d(2025, 5, 25)).await.unwrap();
    let plan = report.plan().unwrap();
    assert_eq!((plan.year, plan.month), (2025, 6));

    let names: Vec<(u32, &str)> = plan
        .assignments
        .iter()
        .take(4)
        .map(|a| (a.date.day(), a.responder.as_str()))
        .collect();
    assert_eq!(names, vec![(1, "A"), (7, "B"), (8, "C"), (14, "A")]);
}

#[tokio::test]
async fn test_fresh_history_starts_with_first_responder() {
    let repo = Arc::new(MockAssignmentRepository::new());
    let scheduler = RotationScheduler::new(roster(&["A", "B"]), weekends_only(), repo.clone());

    let report = scheduler.schedule_next_month(d(2025, 6, 10)).await.unwrap();
    let plan = report.plan().unwrap();

    assert_eq!((plan.year, plan.month), (2025, 6));
    assert_eq!(plan.assignments[0].date, d(2025, 6, 1));
    assert_eq!(plan.assignments[0].responder, "A");
    assert_eq!(plan.assignments[1].responder, "B");
}

#[tokio::test]
async fn test_cursor_carries_across_months() {
    let dir = TempDir::new().unwrap();
    let repo = Arc::new(SqliteAssignmentRepository::new(dir.path().join("oncall.db")).unwrap());
    let scheduler = RotationScheduler::new(roster(&["A", "B", "C"]), weekends_only(), repo.clone());

    let june = scheduler.schedule_next_month(d(2025, 6, 1)).await.unwrap();
    let june_last = june.plan().unwrap().assignments.last().unwrap().clone();

    let july = scheduler.schedule_next_month(d(2025, 6, 25)).await.unwrap();
    let july_plan = july.plan().unwrap();
    assert_eq!((july_plan.year, july_plan.month), (2025, 7));

    let names = ["A", "B", "C"];
    let last_index = names.iter().position(|n| *n == june_last.responder).unwrap();
    assert_eq!(july_plan.assignments[0].responder, names[(last_index + 1) % 3]);
}

// ============================================================================
// Idempotence and Coverage
// ============================================================================

/// Store whose `latest` lags behind, as seen by a runner racing another one
struct StaleLatest {
    inner: Arc<MockAssignmentRepository>,
    latest: Assignment,
}

#[async_trait]
impl AssignmentRepository for StaleLatest {
    async fn latest(&self) -> StorageResult<Option<Assignment>> {
        Ok(Some(self.latest.clone()))
    }

    async fn list_between(&self, from: NaiveDate, to: NaiveDate) -> StorageResult<Vec<Assignment>> {
        self.inner.list_between(from, to).await
    }

    async fn insert_batch(&self, rows: &[NewAssignment]) -> StorageResult<usize> {
        self.inner.insert_batch(rows).await
    }

    async fn nearest_future(&self, responder: &str, from: NaiveDate) -> StorageResult<Option<Assignment>> {
        self.inner.nearest_future(responder, from).await
    }

    async fn on_date(&self, date: NaiveDate) -> StorageResult<Option<Assignment>> {
        self.inner.on_date(date).await
    }

    async fn update_responder(&self, id: RecordId, responder: &str) -> StorageResult<u64> {
        self.inner.update_responder(id, responder).await
    }
}

#[tokio::test]
async fn test_second_run_for_same_month_is_already_scheduled() {
    let inner = Arc::new(MockAssignmentRepository::new());
    let may_id = inner.seed(d(2025, 5, 31), "A");

    let first = RotationScheduler::new(roster(&["A", "B"]), weekends_only(), inner.clone());
    let created = first.schedule_next_month(d(2025, 5, 20)).await.unwrap();
    assert_eq!(created.plan().unwrap().month, 6);
    let stored = inner.len();

    let stale = Arc::new(StaleLatest {
        inner: inner.clone(),
        latest: Assignment {
            id: may_id,
            date: d(2025, 5, 31),
            responder: "A".to_string(),
        },
    });
    let second = RotationScheduler::new(roster(&["A", "B"]), weekends_only(), stale);
    let report = second.schedule_next_month(d(2025, 5, 20)).await.unwrap();

    assert_eq!(
        report,
        ScheduleReport::NoOp(NoOpReason::AlreadyScheduled { year: 2025, month: 6 })
    );
    assert_eq!(inner.len(), stored);
}

#[tokio::test]
async fn test_each_run_advances_one_month() {
    let repo = Arc::new(MockAssignmentRepository::new());
    repo.seed(d(2025, 5, 31), "A");
    let scheduler = RotationScheduler::new(roster(&["A", "B"]), weekends_only(), repo.clone());

    let june = scheduler.schedule_next_month(d(2025, 5, 20)).await.unwrap();
    let july = scheduler.schedule_next_month(d(2025, 5, 20)).await.unwrap();

    assert_eq!(june.plan().unwrap().month, 6);
    assert_eq!(july.plan().unwrap().month, 7);
    let june_dates = june.plan().unwrap().assignments.len();
    let july_dates = july.plan().unwrap().assignments.len();
    assert_eq!(repo.len(), 1 + june_dates + july_dates);
}

#[tokio::test]
async fn test_covers_exactly_qualifying_days() {
    let dir = TempDir::new().unwrap();
    let repo = Arc::new(SqliteAssignmentRepository::new(dir.path().join("oncall.db")).unwrap());
    let calendar = CalendarPolicy::new(HolidaySet::new([d(2025, 6, 3), d(2025, 6, 6)]));
    let scheduler = RotationScheduler::new(roster(&["A", "B", "C"]), calendar.clone(), repo.clone());

    scheduler.schedule_next_month(d(2025, 6, 1)).await.unwrap();
    let rows = repo.list_between(d(2025, 6, 1), d(2025, 6, 30)).await.unwrap();

    let expected = calendar.qualifying_days(2025, 6).unwrap();
    let dates: Vec<_> = rows.iter().map(|a| a.date).collect();
    assert_eq!(dates, expected);

    assert!(dates.contains(&d(2025, 6, 3)));
    assert!(dates
        .iter()
        .all(|date| matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
            || *date == d(2025, 6, 3)
            || *date == d(2025, 6, 6)));
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let repo = Arc::new(MockAssignmentRepository::new());
    let scheduler = RotationScheduler::new(roster(&["A", "B"]), weekends_only(), repo.clone());

    let report = scheduler.preview_next_month(d(2025, 6, 1)).await.unwrap();
    assert!(matches!(report, ScheduleReport::Planned(_)));
    assert_eq!(report.created_count(), 0);
    assert!(repo.is_empty());
}
