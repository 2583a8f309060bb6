//! Two-party swap of nearest upcoming assignments
//!
//! A swap is two single-record updates issued in a fixed order (the first
//! responder's record, then the second's). The store offers no multi-record
//! transaction, so when the second update fails after the first applied,
//! the first record is written back to its original responder. Only when
//! that compensation also fails is the store left inconsistent.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

use crate::storage::{Assignment, RecordId, SharedAssignmentRepository, StorageError};

/// Result type for swap operations
pub type SwapResult<T> = Result<T, SwapError>;

/// Which of the two updates failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapStep {
    /// First responder's record
    First,
    /// Second responder's record
    Second,
}

impl fmt::Display for SwapStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => f.write_str("first"),
            Self::Second => f.write_str("second"),
        }
    }
}

/// Swap failures
#[derive(Debug, thiserror::Error)]
pub enum SwapError {
    /// Responder has no assignment dated today or later
    #[error("No future assignment found for '{0}'")]
    NoFutureAssignment(String),

    /// Both names are the same responder
    #[error("Cannot swap '{0}' with themselves")]
    SameResponder(String),

    /// Both lookups landed on one record
    #[error("Both lookups resolved to record {0}")]
    SameRecord(RecordId),

    /// An update failed; the store holds its pre-swap state
    #[error("Swap failed at {step} update (record {record_id}): {reason}")]
    PartialMutation {
        step: SwapStep,
        record_id: RecordId,
        reason: String,
    },

    /// Second update and the compensating write both failed
    #[error(
        "Store left inconsistent: record {applied_id} modified, record {failed_id} not: {reason}"
    )]
    Inconsistent {
        applied_id: RecordId,
        failed_id: RecordId,
        reason: String,
    },

    /// Lookup failed in the store
    #[error("Storage error: {0}")]
    Store(#[from] StorageError),
}

impl SwapError {
    /// Errors caused by the caller's input, reported verbatim
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::NoFutureAssignment(_) | Self::SameResponder(_) | Self::SameRecord(_)
        )
    }

    /// Get Korean description for the error
    pub fn korean_desc(&self) -> String {
        match self {
            Self::NoFutureAssignment(name) => {
                format!("'{}'의 향후 온콜 일정을 찾을 수 없습니다.", name)
            }
            Self::SameResponder(name) => {
                format!("'{}' 본인과는 일정을 바꿀 수 없습니다.", name)
            }
            Self::SameRecord(_) => "두 멤버의 일정이 같은 기록을 가리킵니다.".to_string(),
            Self::PartialMutation { .. } | Self::Inconsistent { .. } => {
                "데이터베이스 업데이트 중 오류가 발생했습니다.".to_string()
            }
            Self::Store(e) => e.korean_desc(),
        }
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::PartialMutation { .. } => true,
            Self::Store(e) => e.is_recoverable(),
            _ => false,
        }
    }
}

/// A completed swap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOutcome {
    /// First responder's record before the swap
    pub first: Assignment,
    /// Second responder's record before the swap
    pub second: Assignment,
    pub swapped_at: DateTime<Utc>,
}

impl SwapOutcome {
    /// Name requested as the first party
    pub fn first_name(&self) -> &str {
        &self.first.responder
    }

    /// Name requested as the second party
    pub fn second_name(&self) -> &str {
        &self.second.responder
    }
}

/// Executes swaps against the assignment store
#[derive(Clone)]
pub struct SwapCoordinator {
    repo: SharedAssignmentRepository,
}

impl SwapCoordinator {
    pub fn new(repo: SharedAssignmentRepository) -> Self {
        Self { repo }
    }

    /// Exchange responders on the nearest upcoming assignment of each name
    pub async fn swap(&self, first: &str, second: &str, today: NaiveDate) -> SwapResult<SwapOutcome> {
        if first == second {
            return Err(SwapError::SameResponder(first.to_string()));
        }

        let (a, b) = tokio::try_join!(
            self.repo.nearest_future(first, today),
            self.repo.nearest_future(second, today),
        )?;

        let a = a.ok_or_else(|| SwapError::NoFutureAssignment(first.to_string()))?;
        let b = b.ok_or_else(|| SwapError::NoFutureAssignment(second.to_string()))?;

        if a.id == b.id {
            return Err(SwapError::SameRecord(a.id));
        }

        tracing::info!(
            first = %a.responder,
            first_date = %a.date,
            first_id = a.id,
            second = %b.responder,
            second_date = %b.date,
            second_id = b.id,
            "Swapping assignments"
        );

        if let Err(reason) = self.write(a.id, &b.responder).await {
            tracing::warn!(record_id = a.id, %reason, "First swap update failed");
            return Err(SwapError::PartialMutation {
                step: SwapStep::First,
                record_id: a.id,
                reason,
            });
        }

        if let Err(reason) = self.write(b.id, &a.responder).await {
            tracing::warn!(record_id = b.id, %reason, "Second swap update failed, compensating");

            return match self.write(a.id, &a.responder).await {
                Ok(()) => Err(SwapError::PartialMutation {
                    step: SwapStep::Second,
                    record_id: b.id,
                    reason,
                }),
                Err(compensation) => {
                    tracing::error!(
                        applied_id = a.id,
                        failed_id = b.id,
                        original_responder = %a.responder,
                        %reason,
                        %compensation,
                        "Compensation failed; assignment store is inconsistent"
                    );
                    Err(SwapError::Inconsistent {
                        applied_id: a.id,
                        failed_id: b.id,
                        reason: format!("{reason}; compensation: {compensation}"),
                    })
                }
            };
        }

        tracing::info!(first_id = a.id, second_id = b.id, "Swap completed");

        Ok(SwapOutcome {
            first: a,
            second: b,
            swapped_at: Utc::now(),
        })
    }

    /// One update that must touch exactly the given record
    async fn write(&self, id: RecordId, responder: &str) -> Result<(), String> {
        match self.repo.update_responder(id, responder).await {
            Ok(0) => Err(format!("no row matched record {id}")),
            Ok(_) => Ok(()),
            Err(e) => Err(e.to_string()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
