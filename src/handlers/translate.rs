use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: Option<String>,
    pub target_language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub success: bool,
    pub translated_text: String,
    pub source_language: Option<String>,
    pub target_language: String,
}

pub async fn translate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> AppResult<Json<TranslateResponse>> {
    let Json(body) = payload
        .map_err(|e| AppError::bad_request(format!("Invalid request body: {}", e.body_text())))?;

    let translation = state
        .service
        .translate(
            body.text.as_deref().unwrap_or_default(),
            body.target_language.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(TranslateResponse {
        success: true,
        translated_text: translation.translated_text,
        source_language: translation.source_language,
        target_language: translation.target_language,
    }))
}
