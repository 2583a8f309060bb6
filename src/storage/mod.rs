//! Assignment persistence
//!
//! The assignment store is the only shared mutable resource in the system.
//! This module provides the repository abstraction plus SQLite, PostgREST
//! and in-memory backends.

pub mod postgrest;
pub mod repository;

use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};

pub use postgrest::{PostgrestAssignmentRepository, PostgrestConfig};
pub use repository::{
    create_sqlite_repository, Assignment, AssignmentRepository, MockAssignmentRepository,
    NewAssignment, RecordId, SharedAssignmentRepository, SqliteAssignmentRepository,
    UpdateScript,
};

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by assignment stores
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote store answered with a non-success status
    #[error("Store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Filesystem error while opening a store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Store settings are unusable
    #[error("Invalid storage configuration: {0}")]
    InvalidConfig(String),

    /// Store temporarily unavailable
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A connection mutex was poisoned by a panicking holder
    #[error("Storage lock poisoned")]
    LockPoisoned,
}

impl StorageError {
    /// Transport problems are worth retrying on the next run
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Unavailable(_) | Self::Io(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Database(_) | Self::InvalidConfig(_) | Self::LockPoisoned => false,
        }
    }

    /// Korean description for user-facing messages
    pub fn korean_desc(&self) -> String {
        match self {
            Self::Database(_) | Self::LockPoisoned => "데이터베이스 오류가 발생했습니다.".to_string(),
            Self::Http(_) | Self::Unavailable(_) => "저장소에 연결할 수 없습니다.".to_string(),
            Self::Status { status, .. } => format!("저장소 응답 오류 (HTTP {status})"),
            Self::Io(_) => "입출력 오류가 발생했습니다.".to_string(),
            Self::InvalidConfig(msg) => format!("저장소 설정 오류: {msg}"),
        }
    }
}

/// Open the configured assignment store
pub fn open_repository(config: &StorageConfig) -> StorageResult<SharedAssignmentRepository> {
    match config.backend {
        StorageBackend::Sqlite => create_sqlite_repository(&config.sqlite_path),
        StorageBackend::Postgrest => {
            let settings = config.postgrest.as_ref().ok_or_else(|| {
                StorageError::InvalidConfig(
                    "postgrest backend selected but [storage.postgrest] is missing".to_string(),
                )
            })?;
            let repo = PostgrestAssignmentRepository::new(settings)?;
            tracing::info!(endpoint = %repo.endpoint(), "PostgREST assignment store configured");
            Ok(Arc::new(repo))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory assignment store; data is lost on exit");
            Ok(Arc::new(MockAssignmentRepository::new()))
        }
    }
}
