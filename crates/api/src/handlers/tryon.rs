//! Handler for `POST /api/try-on`.

use axum::extract::{Multipart, State};
use axum::Json;
use tryon_core::generation::InputImage;
use tryon_core::image_format::validate_upload;
use tryon_core::naming::{result_filename, upload_filename, UploadRole};

use crate::engine::TryOnOutcome;
use crate::error::{AppError, AppResult};
use crate::response::TryOnResponse;
use crate::state::AppState;

/// Map a multipart field name to the upload it carries.
fn role_for_field(name: &str) -> Option<UploadRole> {
    match name {
        "person_image" | "person" => Some(UploadRole::Person),
        "garment_image" | "garment" => Some(UploadRole::Garment),
        _ => None,
    }
}

/// POST /api/try-on
///
/// Accepts `person_image` and `garment_image` (or `person` / `garment`) as
/// multipart file fields. Both uploads are stored, the engine produces a
/// result (generated or fallback), the result is stored as
/// `result_<uuid>.png`, and the uploads are removed unless
/// `RETAIN_UPLOADS` is set.
pub async fn try_on(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<TryOnResponse>> {
    let mut person: Option<Vec<u8>> = None;
    let mut garment: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let Some(role) = role_for_field(&name) else {
            tracing::debug!(field = %name, "Ignoring unknown multipart field");
            continue;
        };

        let data = field.bytes().await?.to_vec();
        match role {
            UploadRole::Person => person = Some(data),
            UploadRole::Garment => garment = Some(data),
        }
    }

    let (Some(person), Some(garment)) = (person, garment) else {
        return Err(AppError::BadRequest(
            "Both person and garment images are required".to_string(),
        ));
    };
    if person.is_empty() || garment.is_empty() {
        return Err(AppError::BadRequest("Please select both images".to_string()));
    }

    let person_format = validate_upload(UploadRole::Person.label(), &person)?;
    let garment_format = validate_upload(UploadRole::Garment.label(), &garment)?;
    let person = InputImage::new(person, person_format);
    let garment = InputImage::new(garment, garment_format);

    // Detached so upload cleanup still runs when this request is dropped
    // (timeout or client disconnect).
    tokio::spawn(process_uploads(state, person, garment))
        .await
        .map_err(|e| AppError::InternalError(format!("Try-on task failed: {e}")))?
        .map(Json)
}

/// Store both uploads, run the engine, remove the uploads (unless retained)
/// and store the result.
async fn process_uploads(
    state: AppState,
    person: InputImage,
    garment: InputImage,
) -> AppResult<TryOnResponse> {
    let person_name = upload_filename(UploadRole::Person, person.format);
    let garment_name = upload_filename(UploadRole::Garment, garment.format);

    tracing::info!(
        person = %person_name,
        garment = %garment_name,
        person_bytes = person.bytes.len(),
        garment_bytes = garment.bytes.len(),
        "Try-on request received"
    );

    let outcome = save_and_run(&state, &person_name, &garment_name, person, garment).await;

    if !state.config.retain_uploads {
        for name in [&person_name, &garment_name] {
            if let Err(e) = state.store.delete(name).await {
                tracing::warn!(file = %name, error = %e, "Failed to remove upload");
            }
        }
    }

    let outcome = outcome?;

    let result_name = result_filename();
    state.store.save(&result_name, &outcome.png).await?;

    tracing::info!(
        result = %result_name,
        source = ?outcome.source,
        fallback_reason = outcome.fallback_reason.as_deref().unwrap_or(""),
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        "Try-on completed"
    );

    Ok(TryOnResponse {
        success: true,
        result_url: format!("/uploads/{result_name}"),
        result_image: result_name,
        source: outcome.source,
        fallback_reason: outcome.fallback_reason,
        processing_time_ms: outcome.elapsed.as_millis() as u64,
    })
}

async fn save_and_run(
    state: &AppState,
    person_name: &str,
    garment_name: &str,
    person: InputImage,
    garment: InputImage,
) -> AppResult<TryOnOutcome> {
    state.store.save(person_name, &person.bytes).await?;
    state.store.save(garment_name, &garment.bytes).await?;
    Ok(state.engine.run(person, garment).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_and_aliases() {
        assert_eq!(role_for_field("person_image"), Some(UploadRole::Person));
        assert_eq!(role_for_field("person"), Some(UploadRole::Person));
        assert_eq!(role_for_field("garment_image"), Some(UploadRole::Garment));
        assert_eq!(role_for_field("garment"), Some(UploadRole::Garment));
        assert_eq!(role_for_field("cloth"), None);
    }
}
