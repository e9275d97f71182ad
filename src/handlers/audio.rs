use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

const CONTENT_TYPE: &str = "audio/wav";

/// Reduce a requested path to a bare filename that is safe to join onto the
/// output directory. Only the last path component is kept.
fn sanitize_filename(requested: &str) -> Option<&str> {
    let name = requested
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    valid.then_some(name)
}

/// Stream a generated WAV file from the output directory.
pub async fn serve_audio(
    State(state): State<Arc<AppState>>,
    Path(requested): Path<String>,
) -> AppResult<Response> {
    let not_found = || AppError::not_found("Audio file not found");

    let Some(filename) = sanitize_filename(&requested) else {
        warn!(requested = %requested, "Rejected audio path");
        return Err(not_found());
    };
    let path = state.config.audio_output_dir.join(filename);

    let metadata = match tokio::fs::symlink_metadata(&path).await {
        Ok(metadata) if metadata.file_type().is_file() => metadata,
        _ => {
            debug!(file = filename, "Audio file not found");
            return Err(not_found());
        }
    };
    let file = tokio::fs::File::open(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            not_found()
        } else {
            AppError::Internal(format!("Failed to open audio file: {e}"))
        }
    })?;

    let mut response = Body::from_stream(ReaderStream::new(file)).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(metadata.len()));
    if let Ok(disposition) = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\"")) {
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }
    Ok(response)
}
