use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, audio, generate, session, translate, voices};
use crate::state::AppState;
use std::sync::Arc;

/// Create the API router
///
/// Note: CORS, rate limiting and security headers are applied in main.rs
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/voices", get(voices::list_voices))
        .route("/translate", post(translate::translate))
        .route("/generate-realtime", post(generate::generate_realtime))
        .route("/clear-session", post(session::clear_session))
        .route("/audio/{*filename}", get(audio::serve_audio))
        .route("/health", get(api::health_check))
        .route("/recover", get(api::recover))
        .route("/cleanup-status", get(api::cleanup_status))
        .layer(TraceLayer::new_for_http())
}
