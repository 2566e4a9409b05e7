//! The try-on pipeline for one request.
//!
//! 1. Decode both uploads, already sniffed by the caller (a failure here is
//!    the client's fault).
//! 2. Downscale oversized inputs before forwarding them.
//! 3. Ask the generator, if one is configured.
//! 4. On any generator failure, build the local fallback composite.
//!
//! Image decoding and compositing run on the blocking pool.

use std::sync::Arc;
use std::time::{Duration, Instant};

use image::DynamicImage;
use serde::Serialize;
use tryon_core::composite::{self, FallbackMode};
use tryon_core::error::CoreError;
use tryon_core::generation::{ImageGenerator, InputImage, TRYON_PROMPT};
use tryon_core::image_format::ImageFormatKind;

/// Fallback reason when the server runs without a generator.
pub const REASON_NOT_CONFIGURED: &str = "generator_not_configured";

/// Fallback reason when the generator's image cannot be decoded.
pub const REASON_INVALID_IMAGE: &str = "invalid_generated_image";

/// Where a result image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Generated,
    Fallback,
}

/// A finished try-on, always PNG encoded.
#[derive(Debug)]
pub struct TryOnOutcome {
    pub png: Vec<u8>,
    pub source: ResultSource,
    pub fallback_reason: Option<String>,
    pub elapsed: Duration,
}

pub struct TryOnEngine {
    generator: Option<Arc<dyn ImageGenerator>>,
    fallback_mode: FallbackMode,
    max_input_dimension: u32,
}

/// Decoded uploads plus the payloads that will be forwarded.
struct Prepared {
    person: Arc<DynamicImage>,
    garment: Arc<DynamicImage>,
    person_input: InputImage,
    garment_input: InputImage,
}

impl TryOnEngine {
    pub fn new(
        generator: Option<Arc<dyn ImageGenerator>>,
        fallback_mode: FallbackMode,
        max_input_dimension: u32,
    ) -> Self {
        Self {
            generator,
            fallback_mode,
            max_input_dimension,
        }
    }

    /// Name of the configured generator, if any.
    pub fn generator_name(&self) -> Option<&str> {
        self.generator.as_deref().map(|g| g.name())
    }

    pub fn fallback_mode(&self) -> FallbackMode {
        self.fallback_mode
    }

    /// Produce a result image for the given uploads.
    ///
    /// Both uploads must already have passed
    /// [`tryon_core::image_format::validate_upload`]. Only undecodable uploads
    /// and local image failures surface as errors; every generator failure
    /// degrades to the fallback.
    pub async fn run(
        &self,
        person: InputImage,
        garment: InputImage,
    ) -> Result<TryOnOutcome, CoreError> {
        let started = Instant::now();

        let max_dim = self.max_input_dimension;
        let prepared = run_blocking(move || {
            let (person, person_input) = prepare_input(person, max_dim)?;
            let (garment, garment_input) = prepare_input(garment, max_dim)?;
            Ok(Prepared {
                person: Arc::new(person),
                garment: Arc::new(garment),
                person_input,
                garment_input,
            })
        })
        .await?;

        let Some(generator) = self.generator.as_ref() else {
            tracing::warn!("No image generator configured, using local fallback");
            return self
                .fallback(&prepared, REASON_NOT_CONFIGURED, started)
                .await;
        };

        let generated = generator
            .generate(TRYON_PROMPT, &prepared.person_input, &prepared.garment_input)
            .await;

        let generated = match generated {
            Ok(generated) => generated,
            Err(e) => {
                tracing::warn!(
                    generator = generator.name(),
                    reason = e.reason(),
                    error = %e,
                    "Generation failed, using local fallback"
                );
                return self.fallback(&prepared, e.reason(), started).await;
            }
        };

        let reencoded = run_blocking(move || {
            let img = composite::decode(&generated.bytes)?;
            composite::encode_png(&img.to_rgb8())
        })
        .await;

        match reencoded {
            Ok(png) => {
                tracing::info!(
                    generator = generator.name(),
                    bytes = png.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Try-on image generated"
                );
                Ok(TryOnOutcome {
                    png,
                    source: ResultSource::Generated,
                    fallback_reason: None,
                    elapsed: started.elapsed(),
                })
            }
            Err(e) => {
                tracing::warn!(
                    generator = generator.name(),
                    error = %e,
                    "Generated image could not be decoded, using local fallback"
                );
                self.fallback(&prepared, REASON_INVALID_IMAGE, started)
                    .await
            }
        }
    }

    async fn fallback(
        &self,
        prepared: &Prepared,
        reason: &str,
        started: Instant,
    ) -> Result<TryOnOutcome, CoreError> {
        let mode = self.fallback_mode;
        let person = Arc::clone(&prepared.person);
        let garment = Arc::clone(&prepared.garment);

        let png = run_blocking(move || build_fallback(mode, &person, &garment)).await?;

        tracing::info!(
            mode = mode.name(),
            reason,
            bytes = png.len(),
            "Fallback composite created"
        );

        Ok(TryOnOutcome {
            png,
            source: ResultSource::Fallback,
            fallback_reason: Some(reason.to_string()),
            elapsed: started.elapsed(),
        })
    }
}

/// Decode an upload and, if it is larger than `max_dim`, re-encode a
/// downscaled PNG for forwarding. Small inputs are forwarded untouched.
fn prepare_input(
    upload: InputImage,
    max_dim: u32,
) -> Result<(DynamicImage, InputImage), CoreError> {
    let img = composite::decode(&upload.bytes)?;
    let input = match composite::fit_within(&img, max_dim) {
        Some(smaller) => {
            tracing::debug!(
                from_width = img.width(),
                from_height = img.height(),
                to_width = smaller.width(),
                to_height = smaller.height(),
                "Downscaled input before forwarding"
            );
            InputImage::new(composite::encode_png(&smaller.to_rgb8())?, ImageFormatKind::Png)
        }
        None => upload,
    };
    Ok((img, input))
}

/// Composite per `mode`; if that cannot be encoded, return the person image.
fn build_fallback(
    mode: FallbackMode,
    person: &DynamicImage,
    garment: &DynamicImage,
) -> Result<Vec<u8>, CoreError> {
    let composed = composite::compose_images(mode, person, garment);
    match composite::encode_png(&composed) {
        Ok(png) => Ok(png),
        Err(e) => {
            tracing::error!(error = %e, "Fallback composite failed, returning person image");
            composite::encode_png(&person.to_rgb8())
        }
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, CoreError>
where
    F: FnOnce() -> Result<T, CoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CoreError::Internal(format!("Image task failed: {e}")))?
}
