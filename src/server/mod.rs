//! Slash-command HTTP server
//!
//! | Method | Path            | Purpose                          |
//! |--------|-----------------|----------------------------------|
//! | POST   | `/slack/swap`   | `/온콜바꿔 A B`                  |
//! | POST   | `/slack/oncall` | `/온콜리스트`                    |
//! | GET    | both of the above | usage probe                    |
//! | GET    | `/api/health`   | liveness and in-flight count     |

pub mod api;
pub mod app;

pub use api::{create_router, HealthResponse, SlashCommand, UsageResponse};
pub use app::{AppState, OnCallServer, ServerError};
