//! Upload format detection by magic bytes.
//!
//! Uploaded files are never trusted by extension or by the multipart
//! `Content-Type`; the first bytes of the payload decide the format.

use crate::error::CoreError;

/// Message returned when an upload is not one of the accepted formats.
pub const UNSUPPORTED_FORMAT_MESSAGE: &str = "Invalid image format. Please use JPEG, PNG, or WebP";

/// Image formats accepted for person and garment uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormatKind {
    Jpeg,
    Png,
    Webp,
}

impl ImageFormatKind {
    /// IANA media type.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }

    /// File extension used when the upload is written to disk.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    /// Parse a media type such as `image/png`. Parameters after `;` are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }
}

/// Detect the format of `bytes` from its signature.
pub fn sniff(bytes: &[u8]) -> Option<ImageFormatKind> {
    match bytes {
        [0xFF, 0xD8, ..] => Some(ImageFormatKind::Jpeg),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some(ImageFormatKind::Png),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => {
            Some(ImageFormatKind::Webp)
        }
        _ => None,
    }
}

/// Check that an uploaded payload is non-empty and has a supported signature.
///
/// `label` names the upload in the error message (e.g. `"person image"`).
pub fn validate_upload(label: &str, bytes: &[u8]) -> Result<ImageFormatKind, CoreError> {
    if bytes.is_empty() {
        return Err(CoreError::Validation(format!("The {label} is empty")));
    }
    sniff(bytes).ok_or_else(|| CoreError::UnsupportedImage(UNSUPPORTED_FORMAT_MESSAGE.to_string()))
}
