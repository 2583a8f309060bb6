//! Deadline-bound background dispatch
//!
//! Slash commands must be answered within a few seconds, while a swap makes
//! several store round trips. The dispatcher splits the two:
//!
//! ```text
//!  request ──► dispatch() ──► ImmediateAck (HTTP response body)
//!                  │
//!                  └─► supervisor task
//!                          │ timeout(overall_deadline)
//!                          ├─► work task ──► SlackMessage
//!                          └─► CallbackSink::deliver(response_url)
//! ```
//!
//! Each request moves through
//! `Received → AckSent → Working → {Delivered | DeadlineExceeded | DeliveryFailed}`.
//! When the deadline passes the work task is detached rather than aborted:
//! it may still finish, and any store writes it already made remain.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::notifications::{ChannelResult, SlackMessage};

// ============================================================================
// Configuration
// ============================================================================

/// Deadlines for deferred work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Budget for the immediate acknowledgment, in milliseconds
    pub ack_deadline_ms: u64,

    /// Budget for the background work, in milliseconds
    pub overall_deadline_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            ack_deadline_ms: 3_000,
            overall_deadline_ms: 8_000,
        }
    }
}

impl DispatchConfig {
    pub fn ack_deadline(&self) -> Duration {
        Duration::from_millis(self.ack_deadline_ms)
    }

    pub fn overall_deadline(&self) -> Duration {
        Duration::from_millis(self.overall_deadline_ms)
    }

    /// The ack budget must be non-zero and shorter than the overall budget
    pub fn validate(&self) -> Result<(), String> {
        if self.ack_deadline_ms == 0 {
            return Err("ack_deadline_ms must be greater than 0".to_string());
        }
        if self.ack_deadline_ms >= self.overall_deadline_ms {
            return Err(format!(
                "ack_deadline_ms ({}) must be less than overall_deadline_ms ({})",
                self.ack_deadline_ms, self.overall_deadline_ms
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Core Types
// ============================================================================

/// Where deferred results are delivered
#[async_trait]
pub trait CallbackSink: Send + Sync {
    /// Deliver `message` to `callback` once
    async fn deliver(&self, callback: &str, message: &SlackMessage) -> ChannelResult<()>;
}

/// Lifecycle of one dispatched request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchState {
    Received,
    AckSent,
    Working,
    /// Result delivered to the callback
    Delivered,
    /// Work outlived the deadline; nothing delivered
    DeadlineExceeded,
    /// Work finished but delivery failed (or the work panicked)
    DeliveryFailed,
}

impl DispatchState {
    /// Whether the state is final
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Delivered | Self::DeadlineExceeded | Self::DeliveryFailed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::AckSent => "ack_sent",
            Self::Working => "working",
            Self::Delivered => "delivered",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::DeliveryFailed => "delivery_failed",
        }
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acknowledgment returned to the caller before any work runs
#[derive(Debug, Clone)]
pub struct ImmediateAck {
    pub message: SlackMessage,
    /// Time from dispatch start until the ack was ready
    pub issued_after: Duration,
}

impl ImmediateAck {
    /// Whether the ack was ready within `deadline`
    pub fn within(&self, deadline: Duration) -> bool {
        self.issued_after <= deadline
    }
}

/// Terminal record of a dispatch
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub state: DispatchState,
    pub elapsed: Duration,
    pub error: Option<String>,
}

/// Handle to a dispatched request
pub struct DispatchHandle {
    state: watch::Receiver<DispatchState>,
    task: JoinHandle<DispatchOutcome>,
}

impl DispatchHandle {
    /// Latest published state
    pub fn state(&self) -> DispatchState {
        *self.state.borrow()
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<DispatchState> {
        self.state.clone()
    }

    /// Whether the supervisor has finished
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the terminal outcome
    pub async fn join(self) -> DispatchOutcome {
        Self::settle(self.task.await)
    }

    /// Wait at most `limit`, handing the handle back if still running
    pub async fn join_timeout(mut self, limit: Duration) -> Result<DispatchOutcome, Self> {
        match tokio::time::timeout(limit, &mut self.task).await {
            Ok(result) => Ok(Self::settle(result)),
            Err(_) => Err(self),
        }
    }

    fn settle(result: Result<DispatchOutcome, tokio::task::JoinError>) -> DispatchOutcome {
        result.unwrap_or_else(|e| DispatchOutcome {
            state: DispatchState::DeliveryFailed,
            elapsed: Duration::ZERO,
            error: Some(format!("supervisor task failed: {e}")),
        })
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Runs work in the background and delivers its message before a deadline
#[derive(Clone)]
pub struct DeadlineDispatcher {
    sink: Arc<dyn CallbackSink>,
    config: DispatchConfig,
}

impl DeadlineDispatcher {
    pub fn new(sink: Arc<dyn CallbackSink>, config: DispatchConfig) -> Self {
        Self { sink, config }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Acknowledge now, run `work` in the background, deliver its result to `callback`
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch<W>(
        &self,
        callback: impl Into<String>,
        ack: SlackMessage,
        work: W,
    ) -> (ImmediateAck, DispatchHandle)
    where
        W: Future<Output = SlackMessage> + Send + 'static,
    {
        let started = Instant::now();
        let callback = callback.into();
        let (state_tx, state_rx) = watch::channel(DispatchState::Received);

        let ack = ImmediateAck {
            message: ack,
            issued_after: started.elapsed(),
        };
        state_tx.send_replace(DispatchState::AckSent);

        if !ack.within(self.config.ack_deadline()) {
            tracing::warn!(
                issued_after_ms = ack.issued_after.as_millis() as u64,
                "Acknowledgment missed its deadline"
            );
        }

        let sink = self.sink.clone();
        let overall = self.config.overall_deadline();

        let task = tokio::spawn(async move {
            state_tx.send_replace(DispatchState::Working);
            let work_task = tokio::spawn(work);

            let (state, error) = match tokio::time::timeout(overall, work_task).await {
                Ok(Ok(message)) => match sink.deliver(&callback, &message).await {
                    Ok(()) => (DispatchState::Delivered, None),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to deliver deferred response");
                        (DispatchState::DeliveryFailed, Some(e.to_string()))
                    }
                },
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Deferred work task failed");
                    (
                        DispatchState::DeliveryFailed,
                        Some(format!("work task failed: {e}")),
                    )
                }
                Err(_) => {
                    tracing::warn!(
                        deadline_ms = overall.as_millis() as u64,
                        "Deferred work exceeded its deadline; result will not be delivered"
                    );
                    (DispatchState::DeadlineExceeded, None)
                }
            };

            state_tx.send_replace(state);
            let outcome = DispatchOutcome {
                state,
                elapsed: started.elapsed(),
                error,
            };
            tracing::debug!(state = %outcome.state, elapsed_ms = outcome.elapsed.as_millis() as u64, "Dispatch finished");
            outcome
        });

        (
            ack,
            DispatchHandle {
                state: state_rx,
                task,
            },
        )
    }
}

// ============================================================================
// In-flight Tracking
// ============================================================================

/// Dispatches still running, drained on shutdown
#[derive(Default, Clone)]
pub struct InflightDispatches {
    handles: Arc<Mutex<Vec<DispatchHandle>>>,
}

impl InflightDispatches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a handle, forgetting any that already finished
    pub async fn track(&self, handle: DispatchHandle) {
        let mut handles = self.handles.lock().await;
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Number of tracked unfinished dispatches
    pub async fn len(&self) -> usize {
        let handles = self.handles.lock().await;
        handles.iter().filter(|h| !h.is_finished()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Wait up to `limit` for every tracked dispatch, returning their outcomes
    pub async fn drain(&self, limit: Duration) -> Vec<DispatchOutcome> {
        let handles: Vec<_> = std::mem::take(&mut *self.handles.lock().await);
        let deadline = tokio::time::Instant::now() + limit;
        let mut outcomes = Vec::with_capacity(handles.len());

        for handle in handles {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            match handle.join_timeout(remaining).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(_) => tracing::warn!("Dispatch still running at shutdown; abandoning"),
            }
        }

        outcomes
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::ChannelError;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingSink {
        delivered: StdMutex<Vec<(String, SlackMessage)>>,
        fail: bool,
    }

    #[async_trait]
    impl CallbackSink for RecordingSink {
        async fn deliver(&self, callback: &str, message: &SlackMessage) -> ChannelResult<()> {
            if self.fail {
                return Err(ChannelError::Rejected {
                    status: 404,
                    body: "expired_url".into(),
                });
            }
            self.delivered
                .lock()
                .unwrap()
                .push((callback.to_string(), message.clone()));
            Ok(())
        }
    }

    async fn exploding_work() -> SlackMessage {
        panic!("boom")
    }

    fn config(overall_ms: u64) -> DispatchConfig {
        DispatchConfig {
            ack_deadline_ms: 10,
            overall_deadline_ms: overall_ms,
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(DispatchConfig::default().validate().is_ok());
        assert!(DispatchConfig {
            ack_deadline_ms: 5_000,
            overall_deadline_ms: 5_000
        }
        .validate()
        .is_err());
        assert!(config(100).validate().is_ok());
    }

    #[tokio::test]
    async fn test_ack_is_immediate_and_result_delivered_once() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = DeadlineDispatcher::new(sink.clone(), config(500));

        let (ack, handle) = dispatcher.dispatch(
            "https://hooks.example/cb",
            SlackMessage::ephemeral("working"),
            async { SlackMessage::in_channel("done") },
        );
        assert!(ack.within(Duration::from_millis(10)));
        assert_eq!(ack.message.text.as_deref(), Some("working"));

        let outcome = handle.join().await;
        assert_eq!(outcome.state, DispatchState::Delivered);

        let delivered = sink.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, "https://hooks.example/cb");
        assert_eq!(delivered[0].1.text.as_deref(), Some("done"));
    }

    #[tokio::test]
    async fn test_deadline_exceeded_delivers_nothing() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = DeadlineDispatcher::new(sink.clone(), config(30));

        let (_, handle) = dispatcher.dispatch("cb", SlackMessage::ephemeral("ack"), async {
            tokio::time::sleep(Duration::from_millis(300)).await;
            SlackMessage::in_channel("late")
        });

        let outcome = handle.join().await;
        assert_eq!(outcome.state, DispatchState::DeadlineExceeded);
        assert!(sink.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_recorded() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let dispatcher = DeadlineDispatcher::new(sink, config(500));

        let (_, handle) = dispatcher.dispatch("cb", SlackMessage::ephemeral("ack"), async {
            SlackMessage::in_channel("done")
        });

        let outcome = handle.join().await;
        assert_eq!(outcome.state, DispatchState::DeliveryFailed);
        assert!(outcome.error.unwrap().contains("expired_url"));
    }

    #[tokio::test]
    async fn test_panicking_work_is_delivery_failure() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = DeadlineDispatcher::new(sink.clone(), config(500));

        let (_, handle) =
            dispatcher.dispatch("cb", SlackMessage::ephemeral("ack"), exploding_work());

        let outcome = handle.join().await;
        assert_eq!(outcome.state, DispatchState::DeliveryFailed);
        assert!(sink.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_join_timeout_returns_handle() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = DeadlineDispatcher::new(sink, config(500));

        let (_, handle) = dispatcher.dispatch("cb", SlackMessage::ephemeral("ack"), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            SlackMessage::in_channel("done")
        });

        let handle = handle
            .join_timeout(Duration::from_millis(5))
            .await
            .expect_err("should still be running");
        assert!(!handle.state().is_terminal());

        let outcome = handle.join().await;
        assert_eq!(outcome.state, DispatchState::Delivered);
    }

    #[tokio::test]
    async fn test_inflight_drain() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = DeadlineDispatcher::new(sink.clone(), config(500));
        let inflight = InflightDispatches::new();

        for i in 0..3 {
            let work = async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                SlackMessage::in_channel(format!("done {i}"))
            };
            let (_, handle) =
                dispatcher.dispatch(format!("cb{i}"), SlackMessage::ephemeral("ack"), work);
            inflight.track(handle).await;
        }

        let outcomes = inflight.drain(Duration::from_secs(2)).await;
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.state == DispatchState::Delivered));
        assert_eq!(sink.delivered.lock().unwrap().len(), 3);
        assert!(inflight.is_empty().await);
    }
}
