//! HTTP server for the Cinescope API.
//!
//! [`create_app`] builds the axum router over an [`AppState`]; the binary in
//! `main.rs` handles configuration, storage bootstrap and serving.

pub mod handlers;
pub mod infra;
pub mod routes;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method},
    routing::get,
};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::system::{health_handler, ping_handler, root_handler};
pub use crate::infra::app_state::AppState;
use crate::infra::config::CorsConfig;

pub fn create_app(state: AppState) -> Router {
    // Build CORS layer (permissive in dev, allow-list in prod)
    let cors_layer = if state.config().dev_mode {
        CorsLayer::permissive()
    } else {
        build_cors_layer(&state.config().cors)
    };

    Router::new()
        .route("/", get(root_handler))
        .route("/ping", get(ping_handler))
        .route("/health", get(health_handler))
        .merge(routes::create_api_router())
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(cors: &CorsConfig) -> CorsLayer {
    // Entries were validated during config load; anything unparseable is skipped.
    let origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .map(|s| s.trim())
        .filter(|s| *s != "*")
        .filter_map(|s| HeaderValue::from_str(s).ok())
        .collect();
    let explicit_origins = !origins.is_empty();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    let methods: Vec<Method> = cors
        .allowed_methods
        .iter()
        .filter_map(|m| Method::from_bytes(m.trim().as_bytes()).ok())
        .collect();

    let headers: Vec<HeaderName> = cors
        .allowed_headers
        .iter()
        .filter_map(|h| HeaderName::from_bytes(h.trim().as_bytes()).ok())
        .collect();

    let mut layer = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::list(methods))
        .allow_headers(AllowHeaders::list(headers));

    // tower-http rejects credentials combined with a wildcard origin.
    if cors.allow_credentials && explicit_origins {
        layer = layer.allow_credentials(true);
    }

    layer
}
