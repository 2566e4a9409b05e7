//! Handlers for stored uploads and results.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tryon_core::naming::content_type_for_filename;

use crate::error::AppResult;
use crate::state::AppState;

/// GET /uploads/{filename}, GET /api/results/{filename}
///
/// Names are validated by the store; anything that is not a plain filename
/// is rejected with 400 before touching the disk.
pub async fn serve_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> AppResult<Response> {
    let data = state.store.read(&filename).await?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for_filename(&filename)),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        data,
    )
        .into_response())
}
