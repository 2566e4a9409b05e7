//! Gemini `generateContent` wire types.
//!
//! Requests are serialized in the REST API's camelCase form. Responses are
//! accepted in either camelCase or snake_case, since both appear in the wild.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tryon_core::generation::InputImage;

/// Modalities requested from image-capable models.
pub const RESPONSE_MODALITIES: &[&str] = &["TEXT", "IMAGE"];

/// Body of a `POST models/{model}:generateContent` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
}

/// One conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A text or inline-data part. Unknown part kinds deserialize with both
/// fields empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        default,
        rename = "inlineData",
        alias = "inline_data",
        skip_serializing_if = "Option::is_none"
    )]
    pub inline_data: Option<InlineData>,
}

/// Base64 payload with its media type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineData {
    #[serde(
        default,
        rename = "mimeType",
        alias = "mime_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default, alias = "finish_reason")]
    pub finish_reason: Option<String>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn image(image: &InputImage) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: Some(image.mime_type().to_string()),
                data: STANDARD.encode(&image.bytes),
            }),
        }
    }
}

impl GenerateContentRequest {
    /// Prompt followed by the person image, then the garment image.
    pub fn try_on(prompt: &str, person: &InputImage, garment: &InputImage) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::text(prompt), Part::image(person), Part::image(garment)],
            }],
            generation_config: GenerationConfig {
                response_modalities: RESPONSE_MODALITIES.iter().map(|m| m.to_string()).collect(),
            },
        }
    }
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
    }

    /// First inline-data part across all candidates that looks like an image.
    ///
    /// Parts without a media type are accepted; parts with a non-image media
    /// type are skipped.
    pub fn extract_image(&self) -> Option<&InlineData> {
        self.parts()
            .filter_map(|p| p.inline_data.as_ref())
            .find(|d| {
                !d.data.is_empty()
                    && d
                        .mime_type
                        .as_deref()
                        .map_or(true, |m| m.starts_with("image/"))
            })
    }

    /// All text parts joined with newlines, if there are any.
    pub fn collect_text(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .parts()
            .filter_map(|p| p.text.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.join("\n"))
        }
    }
}
