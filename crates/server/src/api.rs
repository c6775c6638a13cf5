//! HTTP endpoints: on-demand pass trigger and health.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::{AppState, LastPass, TriggerSource};

// ── On-demand trigger ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub success: bool,
    pub sent_count: usize,
}

#[derive(Debug, Serialize)]
pub struct CheckErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Run one reminder pass now.
///
/// Per-task failures are not itemized; they only show up as a lower
/// `sentCount`. A pass that cannot read the store answers 500.
pub async fn check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CheckResponse>, (StatusCode, Json<CheckErrorResponse>)> {
    match state.run_pass(TriggerSource::Manual).await {
        Ok(summary) => Ok(Json(CheckResponse {
            success: true,
            sent_count: summary.sent_count,
        })),
        Err(e) => {
            tracing::error!(error = %e, "manual pass failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CheckErrorResponse {
                    success: false,
                    error: e.to_string(),
                }),
            ))
        }
    }
}

// ── Health ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub store: String,
    pub transport: String,
    pub due_window_secs: i64,
    pub uptime_secs: i64,
    pub last_pass: Option<LastPass>,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let last_pass = state.last_pass.read().await.clone();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        store: state.dispatcher.store_name().to_string(),
        transport: state.dispatcher.transport_name().to_string(),
        due_window_secs: state.dispatcher.window().tolerance().num_seconds(),
        uptime_secs: (chrono::Utc::now() - state.started_at).num_seconds(),
        last_pass,
    })
}
