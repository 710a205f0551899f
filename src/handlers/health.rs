//! Root and health endpoints.
//!
//! Both are bypass paths: the gateway forwards them untouched so load
//! balancer probes and humans poking the root never need an alias.

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use tracing::instrument;

use crate::models::{HealthResponse, WelcomeResponse};
use crate::state::AppState;

/// Root welcome endpoint.
pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: format!("Welcome to the {} gateway", env!("CARGO_PKG_NAME")),
    })
}

/// Health check endpoint.
///
/// The gateway holds no connections and no mutable state, so health is
/// simply "the process is up".
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        timestamp: Utc::now(),
    })
}
