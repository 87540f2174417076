mod auth;
pub mod error;
pub mod response;
mod routes;
pub mod state;
pub mod validation;

use axum::{Json, Router, routing::get};
use serde_json::json;

pub use state::{AppState, SessionSettings, UploadSettings};

/// `/health` plus the JSON API under `/api`.
pub fn router(state: AppState) -> Router {
    let api = routes::api_router(state.uploads.max_bytes);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
