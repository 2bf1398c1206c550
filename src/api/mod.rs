//! HTTP API module for issuance, verification, static assets and diagnostics.

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
