use axum::routing::post;
use axum::Router;

use crate::handlers::tryon;
use crate::state::AppState;

/// Routes mounted under `/api`.
///
/// ```text
/// POST   /try-on          -> try_on (multipart: person_image, garment_image)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/try-on", post(tryon::try_on))
}
