//! Stored file serving.
//!
//! The same router is mounted at `/uploads` (root level) and at
//! `/api/results`.

use axum::routing::get;
use axum::Router;

use crate::handlers::files;
use crate::state::AppState;

/// ```text
/// GET    /{filename}      -> serve_file
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{filename}", get(files::serve_file))
}
