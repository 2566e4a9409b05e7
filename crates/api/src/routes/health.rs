use axum::extract::State;
use axum::{routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::response::MessageResponse;
use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status, always `healthy` when the server answers.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether a remote generator is configured.
    pub model_loaded: bool,
    /// Generator name (model id), if configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    /// Fallback strategy in use.
    pub fallback_mode: &'static str,
    /// Server time.
    pub timestamp: DateTime<Utc>,
}

/// GET /health -- returns service health and generator availability.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let generator = state.engine.generator_name().map(str::to_string);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        model_loaded: generator.is_some(),
        generator,
        fallback_mode: state.engine.fallback_mode().name(),
        timestamp: Utc::now(),
    })
}

/// GET / -- greeting.
async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Welcome to Virtual Try-On API",
    })
}

/// Mount root-level routes (`/` and `/health`, NOT under `/api`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}

/// The same health check, mounted under `/api`.
pub fn api_router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
