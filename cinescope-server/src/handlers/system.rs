use axum::{Json, extract::State};
use serde_json::{Value, json};
use tracing::debug;

use crate::infra::app_state::AppState;

pub async fn root_handler() -> Json<Value> {
    Json(json!({ "message": "Welcome to CINESCOPE API" }))
}

pub async fn ping_handler() -> Json<Value> {
    debug!("Ping endpoint called");
    Json(json!({
        "status": "ok",
        "message": "Cinescope API is running",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "checks": {
            "cache": { "backend": state.catalog().cache_backend() },
            "tmdb": { "configured": !state.config().tmdb.api_key.is_empty() }
        }
    }))
}
