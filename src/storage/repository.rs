//! Repository Pattern for the assignment store
//!
//! The scheduler, the swap coordinator and the reminder path all talk to
//! the assignment table through [`AssignmentRepository`], so the backing
//! store can be swapped without touching rotation logic:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │          RotationScheduler / SwapCoordinator / Reminder     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   AssignmentRepository                      │
//! └─────────────────────────────────────────────────────────────┘
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │     SQLite      │ │    PostgREST    │ │      Mock       │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//! ```
//!
//! Ordering contract for every lookup that returns "the first" row:
//! ascending date, then ascending record id.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::{StorageError, StorageResult};

// ============================================================================
// Core Types
// ============================================================================

/// Store-assigned record identifier
pub type RecordId = i64;

/// A persisted on-call assignment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment {
    /// Record identifier
    pub id: RecordId,
    /// Calendar day covered
    pub date: NaiveDate,
    /// Responder display name
    #[serde(rename = "member")]
    pub responder: String,
}

/// An assignment not yet persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAssignment {
    /// Calendar day covered
    pub date: NaiveDate,
    /// Responder display name
    #[serde(rename = "member")]
    pub responder: String,
}

impl NewAssignment {
    pub fn new(date: NaiveDate, responder: impl Into<String>) -> Self {
        Self {
            date,
            responder: responder.into(),
        }
    }
}

// ============================================================================
// Repository Trait
// ============================================================================

/// Operations the rotation core needs from the assignment store
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Most recent assignment across all history (max date)
    async fn latest(&self) -> StorageResult<Option<Assignment>>;

    /// Assignments with `from <= date <= to`, ascending
    async fn list_between(&self, from: NaiveDate, to: NaiveDate)
        -> StorageResult<Vec<Assignment>>;

    /// Whether any assignment exists with `from <= date <= to`
    async fn exists_between(&self, from: NaiveDate, to: NaiveDate) -> StorageResult<bool> {
        Ok(!self.list_between(from, to).await?.is_empty())
    }

    /// Insert a batch of assignments, returning the number inserted
    async fn insert_batch(&self, rows: &[NewAssignment]) -> StorageResult<usize>;

    /// Earliest assignment for `responder` dated on or after `from`
    async fn nearest_future(
        &self,
        responder: &str,
        from: NaiveDate,
    ) -> StorageResult<Option<Assignment>>;

    /// First assignment on exactly `date`
    async fn on_date(&self, date: NaiveDate) -> StorageResult<Option<Assignment>>;

    /// Set the responder of one record, returning the affected row count
    ///
    /// Implementations must report `0` when no row matched `id`.
    async fn update_responder(&self, id: RecordId, responder: &str) -> StorageResult<u64>;
}

/// Thread-safe shared repository handle
pub type SharedAssignmentRepository = Arc<dyn AssignmentRepository>;

// ============================================================================
// SQLite Implementation
// ============================================================================

/// SQLite implementation of [`AssignmentRepository`]
///
/// Uses `Mutex` to ensure thread-safety for the SQLite connection. The
/// guard is never held across an await point.
pub struct SqliteAssignmentRepository {
    conn: Mutex<Connection>,
}

impl SqliteAssignmentRepository {
    /// Open (or create) an SQLite database file
    pub fn new(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.create_schema()?;

        tracing::info!(path = %path.display(), "SQLite assignment store initialized");
        Ok(repo)
    }

    /// Create in-memory repository (for testing)
    pub fn in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.create_schema()?;
        Ok(repo)
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn create_schema(&self) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
                CREATE TABLE IF NOT EXISTS oncall_rotation (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    date TEXT NOT NULL,
                    member TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_oncall_rotation_date
                    ON oncall_rotation(date);

                CREATE INDEX IF NOT EXISTS idx_oncall_rotation_member_date
                    ON oncall_rotation(member, date);
                "#,
        )?;
        Ok(())
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Assignment> {
        Ok(Assignment {
            id: row.get(0)?,
            date: row.get(1)?,
            responder: row.get(2)?,
        })
    }
}

#[async_trait]
impl AssignmentRepository for SqliteAssignmentRepository {
    async fn latest(&self) -> StorageResult<Option<Assignment>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, date, member FROM oncall_rotation
                 ORDER BY date DESC, id DESC LIMIT 1",
                [],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    async fn list_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StorageResult<Vec<Assignment>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, date, member FROM oncall_rotation
             WHERE date >= ?1 AND date <= ?2
             ORDER BY date ASC, id ASC",
        )?;
        let rows = stmt
            .query_map(params![from, to], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    async fn exists_between(&self, from: NaiveDate, to: NaiveDate) -> StorageResult<bool> {
        let conn = self.conn()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM oncall_rotation WHERE date >= ?1 AND date <= ?2)",
            params![from, to],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    async fn insert_batch(&self, rows: &[NewAssignment]) -> StorageResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO oncall_rotation (date, member) VALUES (?1, ?2)")?;
            for row in rows {
                stmt.execute(params![row.date, row.responder])?;
            }
        }
        tx.commit()?;

        Ok(rows.len())
    }

    async fn nearest_future(
        &self,
        responder: &str,
        from: NaiveDate,
    ) -> StorageResult<Option<Assignment>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, date, member FROM oncall_rotation
                 WHERE member = ?1 AND date >= ?2
                 ORDER BY date ASC, id ASC LIMIT 1",
                params![responder, from],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    async fn on_date(&self, date: NaiveDate) -> StorageResult<Option<Assignment>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, date, member FROM oncall_rotation
                 WHERE date = ?1 ORDER BY id ASC LIMIT 1",
                params![date],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    async fn update_responder(&self, id: RecordId, responder: &str) -> StorageResult<u64> {
        let conn = self.conn()?;
        let affected = conn.execute(
            "UPDATE oncall_rotation SET member = ?1 WHERE id = ?2",
            params![responder, id],
        )?;
        Ok(affected as u64)
    }
}

// ============================================================================
// Mock Implementation (for testing)
// ============================================================================

/// Scripted behaviour for one `update_responder` call on the mock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateScript {
    /// Apply the update normally
    Apply,
    /// Pretend no row matched (affected count 0)
    NoMatch,
    /// Fail as if the transport broke
    Unavailable,
}

/// In-memory mock implementation of [`AssignmentRepository`]
///
/// Updates can be scripted to fail so two-step swap failures are testable,
/// and an artificial latency can be added to every call.
#[derive(Default)]
pub struct MockAssignmentRepository {
    rows: RwLock<Vec<Assignment>>,
    next_id: Mutex<RecordId>,
    update_script: Mutex<VecDeque<UpdateScript>>,
    update_calls: Mutex<Vec<(RecordId, String)>>,
    latency: Option<Duration>,
}

impl MockAssignmentRepository {
    /// Create a new mock repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queue scripted results for upcoming updates; later updates apply normally
    pub fn script_updates(&self, script: impl IntoIterator<Item = UpdateScript>) {
        if let Ok(mut queue) = self.update_script.lock() {
            queue.extend(script);
        }
    }

    /// Insert a row directly, returning its id
    pub fn seed(&self, date: NaiveDate, responder: &str) -> RecordId {
        let id = self.allocate_id();
        if let Ok(mut rows) = self.rows.write() {
            rows.push(Assignment {
                id,
                date,
                responder: responder.to_string(),
            });
        }
        id
    }

    /// Snapshot of all rows in insertion order
    pub fn all(&self) -> Vec<Assignment> {
        self.rows.read().map(|r| r.clone()).unwrap_or_default()
    }

    /// Responder currently stored on `date` (first by id)
    pub fn responder_on(&self, date: NaiveDate) -> Option<String> {
        self.all()
            .into_iter()
            .filter(|a| a.date == date)
            .min_by_key(|a| a.id)
            .map(|a| a.responder)
    }

    /// Every `(id, responder)` passed to `update_responder`, in call order
    pub fn update_calls(&self) -> Vec<(RecordId, String)> {
        self.update_calls
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Get the number of records
    pub fn len(&self) -> usize {
        self.rows.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn allocate_id(&self) -> RecordId {
        match self.next_id.lock() {
            Ok(mut next) => {
                *next += 1;
                *next
            }
            Err(_) => 0,
        }
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn read_rows(&self) -> StorageResult<Vec<Assignment>> {
        self.rows
            .read()
            .map(|r| r.clone())
            .map_err(|_| StorageError::LockPoisoned)
    }

    fn first_ordered(rows: impl Iterator<Item = Assignment>) -> Option<Assignment> {
        rows.min_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)))
    }
}

#[async_trait]
impl AssignmentRepository for MockAssignmentRepository {
    async fn latest(&self) -> StorageResult<Option<Assignment>> {
        self.pause().await;
        Ok(self
            .read_rows()?
            .into_iter()
            .max_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id))))
    }

    async fn list_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StorageResult<Vec<Assignment>> {
        self.pause().await;
        let mut rows: Vec<_> = self
            .read_rows()?
            .into_iter()
            .filter(|a| a.date >= from && a.date <= to)
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn insert_batch(&self, rows: &[NewAssignment]) -> StorageResult<usize> {
        self.pause().await;
        for row in rows {
            self.seed(row.date, &row.responder);
        }
        Ok(rows.len())
    }

    async fn nearest_future(
        &self,
        responder: &str,
        from: NaiveDate,
    ) -> StorageResult<Option<Assignment>> {
        self.pause().await;
        Ok(Self::first_ordered(
            self.read_rows()?
                .into_iter()
                .filter(|a| a.responder == responder && a.date >= from),
        ))
    }

    async fn on_date(&self, date: NaiveDate) -> StorageResult<Option<Assignment>> {
        self.pause().await;
        Ok(Self::first_ordered(
            self.read_rows()?.into_iter().filter(|a| a.date == date),
        ))
    }

    async fn update_responder(&self, id: RecordId, responder: &str) -> StorageResult<u64> {
        self.pause().await;

        if let Ok(mut calls) = self.update_calls.lock() {
            calls.push((id, responder.to_string()));
        }

        let script = self
            .update_script
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?
            .pop_front()
            .unwrap_or(UpdateScript::Apply);

        match script {
            UpdateScript::NoMatch => Ok(0),
            UpdateScript::Unavailable => Err(StorageError::Unavailable(format!(
                "scripted failure updating record {id}"
            ))),
            UpdateScript::Apply => {
                let mut rows = self.rows.write().map_err(|_| StorageError::LockPoisoned)?;
                let mut affected = 0;
                for row in rows.iter_mut().filter(|a| a.id == id) {
                    row.responder = responder.to_string();
                    affected += 1;
                }
                Ok(affected)
            }
        }
    }
}

/// Create a shared SQLite repository
pub fn create_sqlite_repository(path: impl AsRef<Path>) -> StorageResult<SharedAssignmentRepository> {
    let repo = SqliteAssignmentRepository::new(path)?;
    Ok(Arc::new(repo))
}

// ============================================================================
// Tests
// ============================================================================
