//! Slash-command server
//!
//! Wires the swap coordinator, the deadline dispatcher and the assignment
//! store behind an axum router.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::clock::Clock;
use crate::config::ServerConfig;
use crate::dispatch::{CallbackSink, DeadlineDispatcher, DispatchConfig, InflightDispatches};
use crate::storage::SharedAssignmentRepository;
use crate::swap::SwapCoordinator;

use super::api::create_router;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Swap transactions
    pub swaps: SwapCoordinator,

    /// Background work with a response deadline
    pub dispatcher: Arc<DeadlineDispatcher>,

    /// Swaps still running
    pub inflight: InflightDispatches,

    /// Assignment store
    pub repo: SharedAssignmentRepository,

    /// Source of "today"
    pub clock: Clock,

    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        repo: SharedAssignmentRepository,
        sink: Arc<dyn CallbackSink>,
        dispatch: DispatchConfig,
        clock: Clock,
    ) -> Self {
        Self {
            swaps: SwapCoordinator::new(repo.clone()),
            dispatcher: Arc::new(DeadlineDispatcher::new(sink, dispatch)),
            inflight: InflightDispatches::new(),
            repo,
            clock,
            start_time: Instant::now(),
        }
    }
}

// ============================================================================
// Server
// ============================================================================

/// HTTP server for the slash commands
pub struct OnCallServer {
    config: ServerConfig,
    state: AppState,
}

impl OnCallServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let router = create_router(self.state.clone());

        if self.config.enable_request_logging {
            router.layer(TraceLayer::new_for_http())
        } else {
            router
        }
    }

    /// Bind the configured address and serve until `shutdown_signal` resolves
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| ServerError::Bind {
                addr: self.config.bind_address,
                message: e.to_string(),
            })?;

        self.serve(listener, shutdown_signal).await
    }

    /// Serve on an already bound listener
    ///
    /// After the listener stops, in-flight swaps get the configured grace
    /// period to deliver their results.
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let addr = listener
            .local_addr()
            .map_err(|e| ServerError::Serve(e.to_string()))?;
        tracing::info!(%addr, "Starting on-call server (with graceful shutdown)");

        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))?;

        let grace = Duration::from_secs(self.config.shutdown_grace_secs);
        let outcomes = self.state.inflight.drain(grace).await;
        tracing::info!(drained = outcomes.len(), "On-call server shutdown complete");
        Ok(())
    }
}

// ============================================================================
// Server Errors
// ============================================================================

/// Server errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to address
    #[error("Failed to bind {addr}: {message}")]
    Bind { addr: SocketAddr, message: String },

    /// Server error
    #[error("Server error: {0}")]
    Serve(String),
}

// ============================================================================
// Tests
// ============================================================================
