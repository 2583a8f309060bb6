//! HTTP handlers for the slash-command server
//!
//! Slash commands arrive as `application/x-www-form-urlencoded` POSTs and are
//! answered with a Slack message JSON body. GET on the same paths returns a
//! small usage descriptor so the endpoints can be probed by hand.

use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::notifications::{messages, SlackMessage};
use crate::scheduler::DEFAULT_LOOKAHEAD_DAYS;
use crate::swap::{CommandError, SwapCommand};

use super::app::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

/// Slash command payload
///
/// Slack sends many more fields; only the ones used here are kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlashCommand {
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub response_url: Option<String>,

    #[serde(default)]
    pub user_name: Option<String>,
}

/// GET probe response
#[derive(Debug, Serialize, Deserialize)]
pub struct UsageResponse {
    pub message: String,
    pub usage: String,
}

impl UsageResponse {
    fn new(message: &str, command: &str) -> Self {
        Self {
            message: message.to_string(),
            usage: format!("This endpoint is designed for Slack slash command '{command}'"),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub inflight: usize,
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/slack/swap", get(swap_usage).post(swap_command))
        .route("/slack/oncall", get(list_usage).post(list_command))
        .with_state(state)
}

// ============================================================================
// Health Handlers
// ============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        inflight: state.inflight.len().await,
    })
}

// ============================================================================
// Swap Handlers
// ============================================================================

async fn swap_usage() -> impl IntoResponse {
    Json(UsageResponse::new("Swap Oncall Webhook is running!", "/온콜바꿔"))
}

/// `/온콜바꿔 A B`
///
/// Replies with an acknowledgment right away; the swap result is posted to
/// `response_url` once the background work finishes.
async fn swap_command(
    State(state): State<AppState>,
    Form(payload): Form<SlashCommand>,
) -> Json<SlackMessage> {
    let command = match SwapCommand::parse(&payload.text) {
        Ok(command) => command,
        Err(e) => {
            tracing::info!(text = %payload.text, user = ?payload.user_name, error = %e, "Rejected swap command");
            return Json(messages::usage_error(&e));
        }
    };

    let Some(response_url) = payload
        .response_url
        .filter(|url| !url.trim().is_empty())
    else {
        tracing::warn!("Swap command without response_url");
        return Json(messages::usage_error(&CommandError::MissingResponseUrl));
    };

    tracing::info!(%command, user = ?payload.user_name, "Received swap command");

    let ack = messages::swap_in_progress(&command);
    let swaps = state.swaps.clone();
    let clock = state.clock;
    let work = async move {
        match swaps.swap(&command.first, &command.second, clock.today()).await {
            Ok(outcome) => messages::swap_success(&outcome, clock.now()),
            Err(e) => {
                if e.is_user_error() {
                    tracing::info!(error = %e, "Swap rejected");
                } else {
                    tracing::error!(error = %e, "Swap failed");
                }
                messages::swap_failure(&e)
            }
        }
    };

    let (ack, handle) = state.dispatcher.dispatch(response_url, ack, work);
    state.inflight.track(handle).await;

    Json(ack.message)
}

// ============================================================================
// List Handlers
// ============================================================================

async fn list_usage() -> impl IntoResponse {
    Json(UsageResponse::new("Oncall Schedule Webhook is running!", "/온콜리스트"))
}

/// `/온콜리스트`: assignments from today through the lookahead window
async fn list_command(State(state): State<AppState>) -> impl IntoResponse {
    let today = state.clock.today();
    let until = today + Duration::days(DEFAULT_LOOKAHEAD_DAYS);

    match state.repo.list_between(today, until).await {
        Ok(rows) => {
            tracing::info!(count = rows.len(), %today, %until, "Listed upcoming assignments");
            (StatusCode::OK, Json(messages::schedule_list(&rows, state.clock.now())))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to list assignments");
            (StatusCode::OK, Json(messages::internal_error(&e.to_string())))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
