use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;

use crate::core::voice::CatalogSnapshot;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub success: bool,
    /// Engine display name -> language -> voices
    pub voices: CatalogSnapshot,
}

/// List every voice, grouped by engine and language.
///
/// Never fails: a broken backend listing yields an empty catalog.
pub async fn list_voices(State(state): State<Arc<AppState>>) -> Json<VoicesResponse> {
    let snapshot = state.service.voices().await;
    tracing::debug!(engines = snapshot.len(), "Serving voice catalog");
    Json(VoicesResponse {
        success: true,
        voices: CatalogSnapshot::clone(&snapshot),
    })
}
