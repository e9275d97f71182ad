use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ClearSessionRequest {
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClearSessionResponse {
    pub success: bool,
    pub message: String,
}

/// Drop a session and any text still queued for it.
///
/// Clearing an unknown session succeeds.
pub async fn clear_session(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ClearSessionRequest>, JsonRejection>,
) -> AppResult<Json<ClearSessionResponse>> {
    let session_id = payload
        .ok()
        .and_then(|Json(body)| body.session_id)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("Missing session_id"))?;

    state.service.clear_session(&session_id);

    Ok(Json(ClearSessionResponse {
        success: true,
        message: "Session cleared successfully".to_string(),
    }))
}
