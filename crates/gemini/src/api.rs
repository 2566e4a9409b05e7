//! HTTP client for the Gemini REST API.
//!
//! Wraps `models/{model}:generateContent` using [`reqwest`] and implements
//! [`ImageGenerator`] on top of it.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tryon_core::generation::{GeneratedImage, GenerationError, ImageGenerator, InputImage};

use crate::config::GeminiConfig;
use crate::messages::{GenerateContentRequest, GenerateContentResponse};

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Longest slice of an error body kept for logs and errors.
const MAX_ERROR_BODY_CHARS: usize = 2048;

/// HTTP client for one Gemini model.
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

/// Errors from the Gemini REST layer.
#[derive(Debug, thiserror::Error)]
pub enum GeminiApiError {
    /// The HTTP request itself failed (network, DNS, TLS, body decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Gemini returned a non-2xx status code.
    #[error("Gemini API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The call exceeded the configured timeout.
    #[error("Gemini request timed out after {0}s")]
    Timeout(u64),
}

impl From<GeminiApiError> for GenerationError {
    fn from(err: GeminiApiError) -> Self {
        match err {
            GeminiApiError::Request(e) if e.is_decode() => GenerationError::Decode(e.to_string()),
            GeminiApiError::Request(e) => GenerationError::Transport(e.to_string()),
            GeminiApiError::ApiError { status, body } => GenerationError::Api { status, body },
            GeminiApiError::Timeout(secs) => GenerationError::Timeout(secs),
        }
    }
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Send a `generateContent` request and parse the JSON response.
    ///
    /// The whole exchange, body included, is bounded by the configured
    /// timeout.
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiApiError> {
        let timeout_secs = self.config.timeout_secs;
        let call = async {
            let response = self
                .client
                .post(self.config.endpoint())
                .header(API_KEY_HEADER, &self.config.api_key)
                .json(request)
                .send()
                .await?;
            Self::parse_response(response).await
        };

        tokio::time::timeout(Duration::from_secs(timeout_secs), call)
            .await
            .map_err(|_| GeminiApiError::Timeout(timeout_secs))?
    }

    // ---- private helpers ----

    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GeminiApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GeminiApiError::ApiError {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GeminiApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate(
        &self,
        prompt: &str,
        person: &InputImage,
        garment: &InputImage,
    ) -> Result<GeneratedImage, GenerationError> {
        let request = GenerateContentRequest::try_on(prompt, person, garment);

        tracing::info!(
            model = %self.config.model,
            person_bytes = person.bytes.len(),
            garment_bytes = garment.bytes.len(),
            "Calling Gemini generateContent"
        );

        let response = self.generate_content(&request).await.map_err(|e| {
            tracing::warn!(model = %self.config.model, error = %e, "Gemini call failed");
            GenerationError::from(e)
        })?;

        let Some(inline) = response.extract_image() else {
            let text = response.collect_text();
            tracing::warn!(
                model = %self.config.model,
                candidates = response.candidates.len(),
                text = text.as_deref().unwrap_or(""),
                "Gemini returned no image"
            );
            return Err(GenerationError::NoImage { text });
        };

        let bytes = STANDARD
            .decode(inline.data.trim())
            .map_err(|e| GenerationError::Decode(format!("invalid base64 image data: {e}")))?;

        tracing::info!(
            model = %self.config.model,
            bytes = bytes.len(),
            mime_type = inline.mime_type.as_deref().unwrap_or("unknown"),
            "Gemini returned an image"
        );

        Ok(GeneratedImage {
            bytes,
            mime_type: inline.mime_type.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use assert_matches::assert_matches;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use tryon_core::generation::TRYON_PROMPT;
    use tryon_core::image_format::ImageFormatKind;

    use super::*;

    type Captured = Arc<Mutex<Option<(Option<String>, Value)>>>;

    /// Start an in-process stand-in for the Gemini endpoint that answers every
    /// call with `status` and `body`, optionally after `delay`.
    async fn spawn_mock(status: StatusCode, body: Value, delay: Duration) -> (String, Captured) {
        let captured: Captured = Arc::new(Mutex::new(None));
        let cap = Arc::clone(&captured);

        let app = Router::new().route(
            "/v1beta/models/{*rest}",
            post(move |headers: HeaderMap, Json(req): Json<Value>| {
                let cap = Arc::clone(&cap);
                let body = body.clone();
                async move {
                    let key = headers
                        .get(API_KEY_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    *cap.lock().unwrap() = Some((key, req));
                    tokio::time::sleep(delay).await;
                    (status, Json(body))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/v1beta"), captured)
    }

    fn client_for(base_url: String, timeout_secs: u64) -> GeminiClient {
        let mut config = GeminiConfig::new("test-key");
        config.base_url = base_url;
        config.model = "test-model".into();
        config.timeout_secs = timeout_secs;
        GeminiClient::new(config)
    }

    fn inputs() -> (InputImage, InputImage) {
        (
            InputImage::new(vec![0xFF, 0xD8, 0x01], ImageFormatKind::Jpeg),
            InputImage::new(vec![0x89, b'P', b'N', b'G'], ImageFormatKind::Png),
        )
    }

    #[tokio::test]
    async fn generate_returns_decoded_image_and_sends_key() {
        let body = json!({
            "candidates": [{ "content": { "parts": [
                { "text": "done" },
                { "inlineData": { "mimeType": "image/png", "data": STANDARD.encode(b"png-bytes") } }
            ]}}]
        });
        let (base, captured) = spawn_mock(StatusCode::OK, body, Duration::ZERO).await;
        let client = client_for(base, 5);
        let (person, garment) = inputs();

        let image = client.generate(TRYON_PROMPT, &person, &garment).await.unwrap();

        assert_eq!(image.bytes, b"png-bytes");
        assert_eq!(image.mime_type.as_deref(), Some("image/png"));

        let (key, request) = captured.lock().unwrap().clone().unwrap();
        assert_eq!(key.as_deref(), Some("test-key"));
        let parts = request["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0]["text"], TRYON_PROMPT);
        assert_eq!(parts[1]["inlineData"]["data"], STANDARD.encode(&person.bytes));
        assert_eq!(parts[2]["inlineData"]["mimeType"], "image/png");
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let body = json!({ "error": { "code": 400, "message": "API key not valid" } });
        let (base, _) = spawn_mock(StatusCode::BAD_REQUEST, body, Duration::ZERO).await;
        let client = client_for(base, 5);
        let (person, garment) = inputs();

        let err = client.generate("p", &person, &garment).await.unwrap_err();

        assert_matches!(err, GenerationError::Api { status: 400, ref body } if body.contains("API key not valid"));
    }

    #[tokio::test]
    async fn text_only_answer_is_no_image() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "I can only describe images." }] } }]
        });
        let (base, _) = spawn_mock(StatusCode::OK, body, Duration::ZERO).await;
        let client = client_for(base, 5);
        let (person, garment) = inputs();

        let err = client.generate("p", &person, &garment).await.unwrap_err();

        assert_matches!(err, GenerationError::NoImage { text: Some(t) } if t.contains("describe"));
    }

    #[tokio::test]
    async fn invalid_base64_is_decode_error() {
        let body = json!({
            "candidates": [{ "content": { "parts": [
                { "inlineData": { "mimeType": "image/png", "data": "!!not base64!!" } }
            ]}}]
        });
        let (base, _) = spawn_mock(StatusCode::OK, body, Duration::ZERO).await;
        let client = client_for(base, 5);
        let (person, garment) = inputs();

        let err = client.generate("p", &person, &garment).await.unwrap_err();

        assert_matches!(err, GenerationError::Decode(_));
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let (base, _) = spawn_mock(StatusCode::OK, json!({}), Duration::from_secs(5)).await;
        let client = client_for(base, 1);
        let (person, garment) = inputs();

        let err = client.generate("p", &person, &garment).await.unwrap_err();

        assert_matches!(err, GenerationError::Timeout(1));
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        // Bind then drop to get a port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(format!("http://{addr}/v1beta"), 5);
        let (person, garment) = inputs();

        let err = client.generate("p", &person, &garment).await.unwrap_err();

        assert_matches!(err, GenerationError::Transport(_));
    }

    #[test]
    fn name_is_model() {
        let client = client_for("http://localhost".into(), 1);
        assert_eq!(client.name(), "test-model");
    }
}
