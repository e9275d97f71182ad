use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::core::service::{GenerateOutcome, GenerateRequest};
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateRealtimeRequest {
    pub text: Option<String>,
    pub voice_id: Option<String>,
    pub session_id: Option<String>,
    #[serde(default)]
    pub target_language: Option<String>,
}

impl From<GenerateRealtimeRequest> for GenerateRequest {
    fn from(body: GenerateRealtimeRequest) -> Self {
        Self {
            text: body.text,
            voice_id: body.voice_id,
            session_id: body.session_id,
            target_language: body.target_language,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TimingInfo {
    /// Seconds spent in synthesis
    pub total_generation_time: f64,
}

#[derive(Debug, Serialize)]
pub struct GenerateRealtimeResponse {
    pub success: bool,
    /// URL path the audio can be fetched from, `/audio/<filename>`
    pub file_path: String,
    pub message: String,
    pub needs_audio: bool,
    pub timing_info: TimingInfo,
}

/// Queue text for a session and synthesize the next pending piece.
pub async fn generate_realtime(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRealtimeRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(body) = payload
        .map_err(|e| AppError::validation(format!("Invalid request body: {}", e.body_text())))?;
    debug!(
        session_id = body.session_id.as_deref().unwrap_or(""),
        voice_id = body.voice_id.as_deref().unwrap_or(""),
        "Generate request"
    );

    match state.service.generate(body.into()).await? {
        GenerateOutcome::Generated(audio) => Ok(Json(GenerateRealtimeResponse {
            success: true,
            file_path: format!("/audio/{}", audio.filename),
            message: "Audio generated successfully".to_string(),
            needs_audio: true,
            timing_info: TimingInfo {
                total_generation_time: audio.elapsed.as_secs_f64(),
            },
        })
        .into_response()),
        GenerateOutcome::NothingPending => Ok(Json(json!({
            "success": false,
            "message": "No new complete sentence to process",
            "needs_audio": false,
        }))
        .into_response()),
    }
}
