use std::path::PathBuf;

use tryon_core::composite::{FallbackMode, DEFAULT_MAX_INPUT_DIMENSION};
use tryon_core::storage::DEFAULT_UPLOAD_DIR;
use tryon_gemini::GeminiConfig;

/// Seconds reserved inside the request timeout for the local fallback
/// after a generator call gives up.
pub const FALLBACK_HEADROOM_SECS: u64 = 10;

/// Default request body limit (16 MiB), covering both uploads.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `120`). Must exceed the
    /// generator timeout so the fallback still has time to run.
    pub request_timeout_secs: u64,
    /// Seconds to let in-flight requests finish after a shutdown signal
    /// (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Directory holding uploads and results (default: `uploads`).
    pub upload_dir: PathBuf,
    /// Maximum request body size in bytes (default: 16 MiB).
    pub max_upload_bytes: usize,
    /// Keep person/garment uploads after the request (default: `false`).
    pub retain_uploads: bool,
    /// Local fallback strategy (default: `side_by_side`).
    pub fallback_mode: FallbackMode,
    /// Longest edge of images forwarded to the generator (default: `1024`).
    pub max_input_dimension: u32,
    /// Generator settings; `None` when no API key is configured.
    pub gemini: Option<GeminiConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `8000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `120`                      |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    /// | `UPLOAD_DIR`           | `uploads`                  |
    /// | `MAX_UPLOAD_BYTES`     | `16777216`                 |
    /// | `RETAIN_UPLOADS`       | `false`                    |
    /// | `FALLBACK_MODE`        | `side_by_side`             |
    /// | `MAX_INPUT_DIMENSION`  | `1024`                     |
    ///
    /// Gemini settings are read by [`GeminiConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let upload_dir = PathBuf::from(
            std::env::var("UPLOAD_DIR").unwrap_or_else(|_| DEFAULT_UPLOAD_DIR.into()),
        );

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_BYTES.to_string())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        let retain_uploads = std::env::var("RETAIN_UPLOADS")
            .map(|v| parse_bool(&v))
            .unwrap_or(false);

        let fallback_mode = match std::env::var("FALLBACK_MODE") {
            Ok(name) => FallbackMode::from_name(&name)
                .unwrap_or_else(|e| panic!("FALLBACK_MODE is invalid: {e}")),
            Err(_) => FallbackMode::default(),
        };

        let max_input_dimension: u32 = std::env::var("MAX_INPUT_DIMENSION")
            .unwrap_or_else(|_| DEFAULT_MAX_INPUT_DIMENSION.to_string())
            .parse()
            .expect("MAX_INPUT_DIMENSION must be a valid u32");

        let mut config = Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            upload_dir,
            max_upload_bytes,
            retain_uploads,
            fallback_mode,
            max_input_dimension,
            gemini: GeminiConfig::from_env(),
        };
        config.clamp_generator_timeout();
        config
    }

    /// Shorten the generator timeout so a slow remote call still leaves
    /// [`FALLBACK_HEADROOM_SECS`] of the request timeout for the fallback.
    ///
    /// Returns the clamped value, or `None` if no change was needed.
    pub fn clamp_generator_timeout(&mut self) -> Option<u64> {
        let request_timeout = self.request_timeout_secs;
        let gemini = self.gemini.as_mut()?;
        if gemini.timeout_secs.saturating_add(FALLBACK_HEADROOM_SECS) <= request_timeout {
            return None;
        }

        let clamped = request_timeout.saturating_sub(FALLBACK_HEADROOM_SECS).max(1);
        tracing::warn!(
            generator_timeout_secs = gemini.timeout_secs,
            request_timeout_secs = request_timeout,
            clamped_secs = clamped,
            "GEMINI_TIMEOUT_SECS leaves no room for the fallback within REQUEST_TIMEOUT_SECS; clamping"
        );
        gemini.timeout_secs = clamped;
        Some(clamped)
    }
}

/// `1`, `true`, `yes`, `on` (any case) are true; everything else is false.
fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
