/// Domain errors shared by the try-on crates.
///
/// The API layer maps each variant to an HTTP status and error code.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A stored item (e.g. a result file) does not exist.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// Caller input broke a rule (empty upload, bad filename, unknown mode).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Bytes are not a JPEG, PNG or WebP image, or could not be decoded.
    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    /// Filesystem failure in the upload store.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Anything else that is not the caller's fault (encoding, task join).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Storage(err.to_string())
    }
}

impl From<image::ImageError> for CoreError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Encoding(e) => CoreError::Internal(e.to_string()),
            // Decoding from memory: I/O errors here mean truncated input.
            other => CoreError::UnsupportedImage(other.to_string()),
        }
    }
}
