//! HTTP API route definitions.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use super::handlers::{add_certificate, health, metrics_export, test_qr, verify, AppState};

/// Create the API router.
///
/// Anything not matched by an API route is served from the public directory,
/// which also holds the generated QR images.
pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.public_dir);
    let cors = state.config.cors_permissive;

    let router = Router::new()
        // Certificate endpoints
        .route("/add-certificate", post(add_certificate))
        .route("/verify", get(verify))
        // Diagnostics
        .route("/test-qr", get(test_qr))
        .route("/health", get(health))
        .route("/metrics", get(metrics_export))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
