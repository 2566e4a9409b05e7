//! The seam between the try-on engine and a remote image generator.
//!
//! The engine only knows about [`ImageGenerator`]; the Gemini client in
//! `tryon-gemini` is one implementation, and tests plug in stubs.

use async_trait::async_trait;

use crate::image_format::ImageFormatKind;

/// Instruction sent alongside the two input images.
pub const TRYON_PROMPT: &str = "Create a photorealistic image of the person in the first image \
wearing the garment from the second image. The garment should fit naturally on the person's body, \
maintaining their pose and body proportions. Ensure the lighting and shadows match the original \
person image. The result should look like a real photograph, not a digital composite.";

/// An input image ready to be forwarded.
#[derive(Debug, Clone)]
pub struct InputImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormatKind,
}

impl InputImage {
    pub fn new(bytes: Vec<u8>, format: ImageFormatKind) -> Self {
        Self { bytes, format }
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Raw image returned by a generator, not yet decoded.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    /// Media type reported by the generator, if any.
    pub mime_type: Option<String>,
}

/// Why a generator did not produce an image.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The request never got a response (network, DNS, TLS).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote API answered with a non-success status.
    #[error("Generator API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The response body or the embedded image could not be decoded.
    #[error("Failed to decode generator response: {0}")]
    Decode(String),

    /// The response was valid but carried no image part.
    #[error("Generator returned no image")]
    NoImage { text: Option<String> },

    /// The call did not finish within the configured timeout.
    #[error("Generator timed out after {0}s")]
    Timeout(u64),
}

impl GenerationError {
    /// Short machine-readable reason, reported to clients on fallback.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport_error",
            Self::Api { .. } => "api_error",
            Self::Decode(_) => "decode_error",
            Self::NoImage { .. } => "no_image",
            Self::Timeout(_) => "timeout",
        }
    }
}

/// A remote service that renders the person wearing the garment.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Identifier used in logs and health output.
    fn name(&self) -> &str;

    async fn generate(
        &self,
        prompt: &str,
        person: &InputImage,
        garment: &InputImage,
    ) -> Result<GeneratedImage, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_are_stable() {
        assert_eq!(GenerationError::Timeout(60).reason(), "timeout");
        assert_eq!(
            GenerationError::Api {
                status: 500,
                body: String::new()
            }
            .reason(),
            "api_error"
        );
        assert_eq!(GenerationError::NoImage { text: None }.reason(), "no_image");
    }

    #[test]
    fn input_image_reports_mime() {
        let img = InputImage::new(vec![0xFF, 0xD8], ImageFormatKind::Jpeg);
        assert_eq!(img.mime_type(), "image/jpeg");
    }

    #[test]
    fn prompt_mentions_both_images() {
        assert!(TRYON_PROMPT.contains("first image"));
        assert!(TRYON_PROMPT.contains("second image"));
    }
}
