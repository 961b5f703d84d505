use axum::{routing::get, Extension, Router};
use std::path::Path;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::controllers;
use crate::AppState;

/// /health, /ws e, per tutto il resto, i file statici di `public_dir`.
pub fn router(state: Arc<AppState>, public_dir: &Path) -> Router {
    Router::new()
        .route("/health", get(controllers::health))
        .route("/ws", get(controllers::ws_handler))
        .fallback_service(ServeDir::new(public_dir))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}
