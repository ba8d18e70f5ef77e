use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::alerts::{AlertChecker, AlertKind, AlertSummary, CheckError, Clock, PauseOutcome};

/// Body of every legacy 500 response
pub const SERVER_ERROR_BODY: &str = "Server Error";

/// Application state shared across handlers
pub struct AppState {
    pub checker: Arc<AlertChecker>,
    pub clock: Arc<dyn Clock>,
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================================
// Alert Checks
// ============================================================================

pub async fn check_rdp_sessions(State(state): State<Arc<AppState>>) -> Result<String, ApiError> {
    check(&state, AlertKind::RdpSessions).await
}

pub async fn check_containers(State(state): State<Arc<AppState>>) -> Result<String, ApiError> {
    check(&state, AlertKind::ContainerCount).await
}

pub async fn check_sql_injections(State(state): State<Arc<AppState>>) -> Result<String, ApiError> {
    check(&state, AlertKind::SqlInjections).await
}

async fn check(state: &AppState, kind: AlertKind) -> Result<String, ApiError> {
    let status = state.checker.evaluate(kind, state.clock.now()).await?;
    Ok(status.to_string())
}

// ============================================================================
// Pause
// ============================================================================

/// `{ "pauseHours": <number> }`. Anything else in that field clears the pause.
#[derive(Debug, Default, Deserialize)]
pub struct PauseRequest {
    #[serde(rename = "pauseHours", default)]
    pub pause_hours: Option<serde_json::Value>,
}

impl PauseRequest {
    /// Lenient parse: a missing or malformed body is an empty request
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    /// Requested duration, if it is a JSON number
    pub fn hours(&self) -> Option<f64> {
        self.pause_hours.as_ref().and_then(serde_json::Value::as_f64)
    }
}

pub async fn pause_rdp(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<String, ApiError> {
    pause(&state, AlertKind::RdpSessions, &body).await
}

/// Pausing also empties the container artifact; clearing leaves it alone
pub async fn reset_container_alert(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<String, ApiError> {
    pause(&state, AlertKind::ContainerCount, &body).await
}

pub async fn pause_sql_injections(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<String, ApiError> {
    pause(&state, AlertKind::SqlInjections, &body).await
}

async fn pause(state: &AppState, kind: AlertKind, body: &[u8]) -> Result<String, ApiError> {
    let request = PauseRequest::from_body(body);
    let outcome = state
        .checker
        .pause(kind, request.hours(), state.clock.now())
        .await?;

    Ok(match outcome {
        PauseOutcome::Paused { hours, .. } => kind.paused_message(hours),
        PauseOutcome::Cleared => kind.cleared_message().to_string(),
    })
}

// ============================================================================
// Summary & Artifacts
// ============================================================================

#[derive(Serialize)]
pub struct AlertsResponse {
    pub checked_at: DateTime<Utc>,
    pub alerts: Vec<AlertSummary>,
}

pub async fn list_alerts(State(state): State<Arc<AppState>>) -> Json<AlertsResponse> {
    let now = state.clock.now();
    Json(AlertsResponse {
        checked_at: now,
        alerts: state.checker.summary(now).await,
    })
}

/// Raw artifact text, for the dashboard charts
pub async fn artifact(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> Result<String, ApiError> {
    let kind = kind.parse::<AlertKind>().map_err(ApiError::NotFound)?;
    Ok(state.checker.read_artifact(kind).await?)
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    /// Logged with its cause; the client only sees the fixed body
    Server(String),
}

impl From<CheckError> for ApiError {
    fn from(e: CheckError) -> Self {
        ApiError::Server(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::NotFound(msg) => {
                let body = serde_json::json!({
                    "error": msg
                });
                (StatusCode::NOT_FOUND, Json(body)).into_response()
            }
            ApiError::Server(cause) => {
                tracing::error!(error = %cause, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_BODY).into_response()
            }
        }
    }
}
