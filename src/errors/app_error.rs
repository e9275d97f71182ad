//! HTTP-facing error type.
//!
//! Every failure renders as JSON with `success: false`. Validation errors on
//! the generation route also carry `needs_audio: false` and a `message`, the
//! shape clients already poll for.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{error, warn};

use crate::core::translate::TranslationError;
use crate::core::tts::TTSError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Rejected input. `needs_audio` selects the generation-route body shape.
    #[error("{message}")]
    Validation { message: String, needs_audio: bool },

    #[error(transparent)]
    Synthesis(#[from] TTSError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            needs_audio: false,
        }
    }

    /// Validation error rendered with `error` rather than `message`.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            needs_audio: true,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Synthesis(TTSError::InvalidVoice { .. }) => StatusCode::BAD_REQUEST,
            Self::Synthesis(e) if e.is_resource_exhausted() => StatusCode::SERVICE_UNAVAILABLE,
            Self::Synthesis(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Translation(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Translation(TranslationError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Translation(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Value {
        match self {
            Self::Validation {
                message,
                needs_audio: false,
            } => json!({
                "success": false,
                "message": message,
                "needs_audio": false,
            }),
            Self::Validation { message, .. } => json!({
                "success": false,
                "error": message,
            }),
            Self::Synthesis(TTSError::InvalidVoice { voice_id, reason }) => json!({
                "success": false,
                "error": self.to_string(),
                "error_type": "InvalidVoice",
                "details": {"voice_id": voice_id, "reason": reason},
            }),
            Self::Synthesis(TTSError::Synthesis {
                engine,
                stage,
                message,
                details,
                resource_exhausted,
            }) => {
                let mut body = json!({
                    "success": false,
                    "error": message,
                    "error_type": if *resource_exhausted {
                        "ResourceExhaustionError"
                    } else {
                        "SynthesisError"
                    },
                    "engine": engine.as_str(),
                    "stage": stage.as_str(),
                    "details": details,
                });
                if *resource_exhausted {
                    body["message"] = json!("service degraded, backend is being reinitialized");
                    body["requires_restart"] = json!(true);
                }
                body
            }
            Self::Synthesis(e @ TTSError::InvalidConfiguration(_)) => json!({
                "success": false,
                "error": e.to_string(),
                "error_type": "ConfigurationError",
            }),
            Self::Translation(e) => json!({
                "success": false,
                "error": e.to_string(),
                "error_type": "TranslationError",
            }),
            Self::NotFound(message) | Self::Internal(message) => json!({
                "success": false,
                "error": message,
            }),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}
