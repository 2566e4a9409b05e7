//! Response payload types for API handlers.
//!
//! Successful try-on calls answer with [`TryOnResponse`]; errors go through
//! [`crate::error::AppError`] and share the `{ "success": false, "error", "code" }`
//! shape.

use serde::Serialize;

use crate::engine::ResultSource;

/// Payload of `POST /api/try-on`.
#[derive(Debug, Serialize)]
pub struct TryOnResponse {
    /// Always `true`; failures use the error envelope.
    pub success: bool,
    /// Stored result filename, e.g. `result_<uuid>.png`.
    pub result_image: String,
    /// Path the result can be fetched from.
    pub result_url: String,
    /// Whether the image came from the generator or the local fallback.
    pub source: ResultSource,
    /// Why the fallback was used; absent for generated results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    /// Wall time spent producing the result.
    pub processing_time_ms: u64,
}

/// Plain `{ "message": ... }` payload.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
