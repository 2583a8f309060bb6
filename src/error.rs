//! Unified error handling for the dangbeon crate
//!
//! Each module keeps its own error enum. [`Error`] wraps them at module
//! boundaries (CLI commands, server handlers) so callers can classify a
//! failure without matching on every domain type.
//!
//! # Usage
//!
//! ```rust,ignore
//! use dangbeon::error::Error;
//!
//! fn report(err: &Error) {
//!     if err.is_recoverable() {
//!         println!("Retrying: {}", err.korean_desc());
//!     } else {
//!         eprintln!("Fatal error: {err}");
//!     }
//! }
//! ```

use thiserror::Error;

pub use crate::notifications::ChannelError;
pub use crate::roster::RosterError;
pub use crate::scheduler::SchedulerError;
pub use crate::storage::StorageError;
pub use crate::swap::{CommandError, SwapError};

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Assignment store errors
    Storage,
    /// Slack delivery errors
    Network,
    /// Rotation and trigger errors
    Scheduler,
    /// Swap transaction errors
    Swap,
    /// Configuration and validation errors
    Config,
    /// Malformed user input
    Input,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Korean name of the category
    pub fn korean_desc(&self) -> &'static str {
        match self {
            Self::Storage => "저장소 오류",
            Self::Network => "네트워크 오류",
            Self::Scheduler => "스케줄러 오류",
            Self::Swap => "일정 변경 오류",
            Self::Config => "설정 오류",
            Self::Input => "입력 오류",
            Self::Other => "기타 오류",
        }
    }
}

/// Unified error type for the dangbeon crate
#[derive(Error, Debug)]
pub enum Error {
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Swap error: {0}")]
    Swap(#[from] SwapError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Slack error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Roster error: {0}")]
    Roster(#[from] RosterError),

    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Scheduler(e) => e.is_recoverable(),
            Self::Swap(e) => e.is_recoverable(),
            Self::Storage(e) => e.is_recoverable(),
            Self::Channel(e) => e.is_recoverable(),
            Self::Command(_) | Self::Roster(_) | Self::Config(_) | Self::Other(_) => false,
        }
    }

    /// Korean description for user-facing messages
    pub fn korean_desc(&self) -> String {
        match self {
            Self::Scheduler(e) => e.korean_desc(),
            Self::Swap(e) => e.korean_desc(),
            Self::Storage(e) => e.korean_desc(),
            Self::Channel(e) => e.korean_desc(),
            Self::Command(e) => e.korean_desc(),
            Self::Roster(e) => match e {
                RosterError::Empty => "온콜 명단이 비어 있습니다.".to_string(),
                RosterError::DuplicateName(name) => format!("명단에 중복된 이름이 있습니다: {name}"),
                RosterError::BlankName => "명단에 이름이 비어 있는 멤버가 있습니다.".to_string(),
            },
            Self::Config(msg) => format!("설정 오류: {msg}"),
            Self::Other(context) => context.clone(),
        }
    }

    /// Error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Scheduler(SchedulerError::Storage(_)) | Self::Storage(_) => ErrorCategory::Storage,
            Self::Scheduler(SchedulerError::TriggerConfig { .. }) => ErrorCategory::Config,
            Self::Scheduler(_) => ErrorCategory::Scheduler,
            Self::Swap(SwapError::Store(_)) => ErrorCategory::Storage,
            Self::Swap(e) if e.is_user_error() => ErrorCategory::Input,
            Self::Swap(_) => ErrorCategory::Swap,
            Self::Channel(ChannelError::InvalidConfig(_)) => ErrorCategory::Config,
            Self::Channel(_) => ErrorCategory::Network,
            Self::Command(_) => ErrorCategory::Input,
            Self::Roster(_) | Self::Config(_) => ErrorCategory::Config,
            Self::Other(_) => ErrorCategory::Other,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(format!("{err:#}"))
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category() {
        let err: Error = StorageError::Unavailable("down".into()).into();
        assert_eq!(err.category(), ErrorCategory::Storage);

        let err: Error = SwapError::NoFutureAssignment("A".into()).into();
        assert_eq!(err.category(), ErrorCategory::Input);

        let err: Error = CommandError::Usage { token_count: 1 }.into();
        assert_eq!(err.category(), ErrorCategory::Input);
    }

    #[test]
    fn test_is_recoverable() {
        let err: Error = StorageError::Unavailable("down".into()).into();
        assert!(err.is_recoverable());

        let err = Error::config("missing roster");
        assert!(!err.is_recoverable());
        assert_eq!(err.category(), ErrorCategory::Config);
    }

    #[test]
    fn test_korean_desc_passthrough() {
        let err: Error = SwapError::NoFutureAssignment("로쿤".into()).into();
        assert_eq!(err.korean_desc(), "'로쿤'의 향후 온콜 일정을 찾을 수 없습니다.");

        let err: Error = RosterError::Empty.into();
        assert_eq!(err.korean_desc(), "온콜 명단이 비어 있습니다.");
    }

    #[test]
    fn test_error_category_korean() {
        assert_eq!(ErrorCategory::Network.korean_desc(), "네트워크 오류");
        assert_eq!(ErrorCategory::Storage.korean_desc(), "저장소 오류");
    }
}
