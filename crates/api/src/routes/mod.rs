pub mod files;
pub mod health;
pub mod tryon;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /health                                          health (GET)
/// /try-on                                          run a try-on (POST, multipart)
/// /results/{filename}                              stored result (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::api_router())
        .merge(tryon::router())
        .nest("/results", files::router())
}
