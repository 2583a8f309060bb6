//! Error types for the scheduler module

use crate::storage::StorageError;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The last stored responder is not on the current roster
    #[error("Responder '{name}' from the latest assignment is not in the roster. Valid options: {}", .valid_options.join(", "))]
    UnknownResponder {
        name: String,
        valid_options: Vec<String>,
    },

    /// Year/month pair does not form a calendar month
    #[error("Invalid target month: {year}-{month:02}")]
    InvalidMonth { year: i32, month: u32 },

    /// Daily trigger settings are unusable
    #[error("Invalid trigger configuration for '{field}': {message}")]
    TriggerConfig { field: String, message: String },

    /// Store failure while reading history or writing the batch
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl SchedulerError {
    /// Create an unknown responder error
    pub fn unknown_responder(name: impl Into<String>, valid_options: &[&str]) -> Self {
        Self::UnknownResponder {
            name: name.into(),
            valid_options: valid_options.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Create an invalid month error
    pub fn invalid_month(year: i32, month: u32) -> Self {
        Self::InvalidMonth { year, month }
    }

    /// Create a trigger configuration error
    pub fn trigger_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TriggerConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Get Korean description for the error
    pub fn korean_desc(&self) -> String {
        match self {
            Self::UnknownResponder { name, .. } => {
                format!("명단에 없는 담당자: '{}'", name)
            }
            Self::InvalidMonth { year, month } => {
                format!("잘못된 월: {}-{:02}", year, month)
            }
            Self::TriggerConfig { field, .. } => {
                format!("트리거 설정 오류: {}", field)
            }
            Self::Storage(e) => e.korean_desc(),
        }
    }

    /// Check if the error is recoverable
    ///
    /// The periodic trigger re-runs the scheduler, so a transient store
    /// failure heals on the next run.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_recoverable(),
            Self::UnknownResponder { .. }
            | Self::InvalidMonth { .. }
            | Self::TriggerConfig { .. } => false,
        }
    }
}
