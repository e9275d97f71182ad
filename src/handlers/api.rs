use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::info;

use crate::core::recovery::{BackendStatus, RecoveryOutcome};
use crate::core::retention::RetentionStatus;
use crate::core::voice::Engine;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Number of voices in the catalog
    pub available_voices: usize,
    /// Unix time in seconds
    pub timestamp: f64,
    pub backends: Vec<BackendStatus>,
}

/// Liveness plus a per-backend recovery view.
///
/// Always reports `healthy`; degraded backends keep serving.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let now = OffsetDateTime::now_utc();
    Json(HealthResponse {
        status: "healthy",
        available_voices: state.service.voice_count(),
        timestamp: now.unix_timestamp_nanos() as f64 / 1e9,
        backends: state.service.backend_health(),
    })
}

#[derive(Debug, Serialize)]
pub struct RecoveryResult {
    pub engine: Engine,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<(Engine, RecoveryOutcome)> for RecoveryResult {
    fn from((engine, outcome): (Engine, RecoveryOutcome)) -> Self {
        let (label, error) = match outcome {
            RecoveryOutcome::Recovered => ("recovered", None),
            RecoveryOutcome::InProgress => ("in_progress", None),
            RecoveryOutcome::CoolingDown => ("cooling_down", None),
            RecoveryOutcome::Failed(message) => ("failed", Some(message)),
        };
        Self {
            engine,
            outcome: label,
            error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecoverResponse {
    pub success: bool,
    pub backends: Vec<RecoveryResult>,
}

/// Rebuild every backend immediately, ignoring the recovery cooldown.
///
/// Individual failures are reported per backend; the call itself succeeds.
pub async fn recover(State(state): State<Arc<AppState>>) -> Json<RecoverResponse> {
    info!("Manual recovery of all backends requested");
    let backends = state
        .service
        .recover_all()
        .await
        .into_iter()
        .map(RecoveryResult::from)
        .collect();

    Json(RecoverResponse {
        success: true,
        backends,
    })
}

pub async fn cleanup_status(State(state): State<Arc<AppState>>) -> Json<RetentionStatus> {
    Json(state.retention.status())
}
