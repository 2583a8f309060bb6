//! Integration tests for the two-record swap
//!
//! - Happy path against SQLite
//! - Lookup misses leave the store untouched
//! - Failed second update is compensated

mod common;

use common::d;
use dangbeon::storage::{
    AssignmentRepository, MockAssignmentRepository, NewAssignment, SqliteAssignmentRepository,
    UpdateScript,
};
use dangbeon::swap::{SwapCommand, SwapCoordinator, SwapError, SwapStep};
use std::sync::Arc;
use tempfile::TempDir;

async fn sqlite_with(rows: &[(chrono::NaiveDate, &str)]) -> (TempDir, Arc<SqliteAssignmentRepository>) {
    let dir = TempDir::new().unwrap();
    let repo = Arc::new(SqliteAssignmentRepository::new(dir.path().join("oncall.db")).unwrap());
    let rows: Vec<_> = rows
        .iter()
        .map(|(date, name)| NewAssignment::new(*date, *name))
        .collect();
    repo.insert_batch(&rows).await.unwrap();
    (dir, repo)
}

// ============================================================================
// Happy Path
// ============================================================================

#[tokio::test]
async fn test_swap_exchanges_nearest_records() {
    let (_dir, repo) = sqlite_with(&[
        (d(2025, 6, 7), "A"),
        (d(2025, 6, 8), "C"),
        (d(2025, 6, 21), "B"),
        (d(2025, 6, 28), "A"),
    ])
    .await;
    let coordinator = SwapCoordinator::new(repo.clone());

    let outcome = coordinator.swap("A", "B", d(2025, 6, 1)).await.unwrap();
    assert_eq!(outcome.first.date, d(2025, 6, 7));
    assert_eq!(outcome.second.date, d(2025, 6, 21));

    let rows = repo.list_between(d(2025, 6, 1), d(2025, 6, 30)).await.unwrap();
    let names: Vec<_> = rows.iter().map(|a| (a.date, a.responder.as_str())).collect();
    assert_eq!(
        names,
        vec![
            (d(2025, 6, 7), "B"),
            (d(2025, 6, 8), "C"),
            (d(2025, 6, 21), "A"),
            (d(2025, 6, 28), "A"),
        ]
    );
}

#[tokio::test]
async fn test_swap_ignores_past_assignments() {
    let (_dir, repo) = sqlite_with(&[
        (d(2025, 5, 31), "A"),
        (d(2025, 6, 14), "A"),
        (d(2025, 6, 15), "B"),
    ])
    .await;
    let coordinator = SwapCoordinator::new(repo.clone());

    let outcome = coordinator.swap("A", "B", d(2025, 6, 1)).await.unwrap();
    assert_eq!(outcome.first.date, d(2025, 6, 14));
    assert_eq!(
        repo.on_date(d(2025, 5, 31)).await.unwrap().unwrap().responder,
        "A"
    );
}

#[tokio::test]
async fn test_today_counts_as_future() {
    let (_dir, repo) = sqlite_with(&[(d(2025, 6, 7), "A"), (d(2025, 6, 8), "B")]).await;
    let coordinator = SwapCoordinator::new(repo.clone());

    coordinator.swap("A", "B", d(2025, 6, 7)).await.unwrap();
    assert_eq!(repo.on_date(d(2025, 6, 7)).await.unwrap().unwrap().responder, "B");
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_lookup_miss_leaves_store_unchanged() {
    let repo = Arc::new(MockAssignmentRepository::new());
    repo.seed(d(2025, 6, 7), "A");
    let before = repo.all();

    let err = SwapCoordinator::new(repo.clone())
        .swap("A", "로쿤", d(2025, 6, 1))
        .await
        .unwrap_err();

    assert!(matches!(err, SwapError::NoFutureAssignment(ref name) if name == "로쿤"));
    assert!(err.is_user_error());
    assert_eq!(repo.all(), before);
    assert!(repo.update_calls().is_empty());
}

#[tokio::test]
async fn test_second_update_miss_is_compensated() {
    let repo = Arc::new(MockAssignmentRepository::new());
    let a = repo.seed(d(2025, 6, 7), "A");
    let b = repo.seed(d(2025, 6, 21), "B");
    repo.script_updates([UpdateScript::Apply, UpdateScript::NoMatch, UpdateScript::Apply]);

    let err = SwapCoordinator::new(repo.clone())
        .swap("A", "B", d(2025, 6, 1))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SwapError::PartialMutation { step: SwapStep::Second, record_id, .. } if record_id == b
    ));
    assert_eq!(repo.responder_on(d(2025, 6, 7)).as_deref(), Some("A"));
    assert_eq!(repo.responder_on(d(2025, 6, 21)).as_deref(), Some("B"));
    assert_eq!(
        repo.update_calls(),
        vec![(a, "B".to_string()), (b, "A".to_string()), (a, "A".to_string())]
    );
}

#[tokio::test]
async fn test_failed_compensation_reports_inconsistent() {
    let repo = Arc::new(MockAssignmentRepository::new());
    let a = repo.seed(d(2025, 6, 7), "A");
    let b = repo.seed(d(2025, 6, 21), "B");
    repo.script_updates([
        UpdateScript::Apply,
        UpdateScript::Unavailable,
        UpdateScript::Unavailable,
    ]);

    let err = SwapCoordinator::new(repo.clone())
        .swap("A", "B", d(2025, 6, 1))
        .await
        .unwrap_err();

    match err {
        SwapError::Inconsistent {
            applied_id,
            failed_id,
            ..
        } => {
            assert_eq!(applied_id, a);
            assert_eq!(failed_id, b);
        }
        other => panic!("expected Inconsistent, got {other:?}"),
    }
    assert_eq!(repo.responder_on(d(2025, 6, 7)).as_deref(), Some("B"));
    assert_eq!(repo.responder_on(d(2025, 6, 21)).as_deref(), Some("B"));
}

#[test]
fn test_self_swap_rejected_before_store() {
    assert!(SwapCommand::parse("A A").is_err());
    assert!(SwapCommand::parse("A").is_err());
    assert!(SwapCommand::parse("A B C").is_err());
    assert_eq!(SwapCommand::parse("  A   B ").unwrap().second, "B");
}
