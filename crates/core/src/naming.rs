//! Filename generation and validation for the upload directory.
//!
//! Every file the service writes gets a fresh UUID-based name, so client
//! supplied filenames never reach the filesystem. Names coming back in on the
//! serving endpoint are validated against a strict character set.

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::error::CoreError;
use crate::image_format::ImageFormatKind;

/// Longest filename accepted by [`validate_filename`].
pub const MAX_FILENAME_LEN: usize = 255;

/// Prefix of generated result files.
pub const RESULT_PREFIX: &str = "result";

static SAFE_FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("valid regex"));

/// Which side of a try-on request an upload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadRole {
    Person,
    Garment,
}

impl UploadRole {
    /// Filename prefix for uploads of this role.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Garment => "garment",
        }
    }

    /// Human-readable label used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Person => "person image",
            Self::Garment => "garment image",
        }
    }
}

/// `person_<uuid>.jpg`, `garment_<uuid>.webp`, ...
pub fn upload_filename(role: UploadRole, format: ImageFormatKind) -> String {
    format!("{}_{}.{}", role.prefix(), Uuid::new_v4(), format.extension())
}

/// `result_<uuid>.png`. Results are always stored as PNG.
pub fn result_filename() -> String {
    format!("{RESULT_PREFIX}_{}.png", Uuid::new_v4())
}

/// Reject anything that could escape the upload directory or is not a plain
/// file name.
pub fn validate_filename(name: &str) -> Result<(), CoreError> {
    if name.is_empty() || name.len() > MAX_FILENAME_LEN {
        return Err(CoreError::Validation(format!(
            "Filename must be between 1 and {MAX_FILENAME_LEN} characters"
        )));
    }
    if name.starts_with('.') || name.contains("..") {
        return Err(CoreError::Validation(format!("Invalid filename '{name}'")));
    }
    if !SAFE_FILENAME_RE.is_match(name) {
        return Err(CoreError::Validation(format!(
            "Filename '{name}' contains unsupported characters"
        )));
    }
    Ok(())
}

/// Content type for a stored file, based on its extension.
pub fn content_type_for_filename(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
