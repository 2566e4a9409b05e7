use std::fmt;

/// Default image-capable model.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp-image-generation";

/// Default REST base URL (API version included).
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default per-call timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connection settings for the Gemini API.
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl GeminiConfig {
    /// Config with the given key and default model, URL and timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | Env Var               | Default                                            |
    /// |-----------------------|----------------------------------------------------|
    /// | `GEMINI_API_KEY`      | falls back to `GOOGLE_API_KEY`                     |
    /// | `GEMINI_MODEL`        | `gemini-2.0-flash-exp-image-generation`            |
    /// | `GEMINI_BASE_URL`     | `https://generativelanguage.googleapis.com/v1beta` |
    /// | `GEMINI_TIMEOUT_SECS` | `60`                                               |
    ///
    /// Returns `None` when no API key is set (or it is blank); the server then
    /// runs with the local fallback only.
    ///
    /// # Panics
    ///
    /// Panics if `GEMINI_TIMEOUT_SECS` is set but not a valid u64.
    pub fn from_env() -> Option<Self> {
        let api_key = resolve_api_key(
            std::env::var("GEMINI_API_KEY").ok(),
            std::env::var("GOOGLE_API_KEY").ok(),
        )?;

        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        let base_url = std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());

        let timeout_secs: u64 = std::env::var("GEMINI_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .expect("GEMINI_TIMEOUT_SECS must be a valid u64");

        Some(Self {
            api_key,
            model,
            base_url,
            timeout_secs,
        })
    }

    /// Full URL of the `generateContent` method for the configured model.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

/// First non-blank key, preferring the Gemini-specific one.
fn resolve_api_key(gemini: Option<String>, google: Option<String>) -> Option<String> {
    [gemini, google]
        .into_iter()
        .flatten()
        .map(|k| k.trim().to_string())
        .find(|k| !k.is_empty())
}

// The API key must never end up in logs.
impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_and_model() {
        let mut config = GeminiConfig::new("k");
        config.base_url = "http://localhost:9000/v1beta/".into();
        config.model = "m".into();
        assert_eq!(
            config.endpoint(),
            "http://localhost:9000/v1beta/models/m:generateContent"
        );
    }

    #[test]
    fn blank_gemini_key_falls_back_to_google_key() {
        assert_eq!(
            resolve_api_key(Some("  ".into()), Some("g-key".into())).as_deref(),
            Some("g-key")
        );
        assert_eq!(
            resolve_api_key(Some(" a-key ".into()), Some("g-key".into())).as_deref(),
            Some("a-key")
        );
        assert_eq!(resolve_api_key(None, Some("g-key".into())).as_deref(), Some("g-key"));
        assert_eq!(resolve_api_key(Some(String::new()), None), None);
        assert_eq!(resolve_api_key(None, None), None);
    }

    #[test]
    fn debug_redacts_key() {
        let config = GeminiConfig::new("super-secret");
        let out = format!("{config:?}");
        assert!(!out.contains("super-secret"));
        assert!(out.contains(DEFAULT_MODEL));
    }
}
