#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use image::{ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;
use tower::ServiceExt;
use tryon_core::composite::FallbackMode;
use tryon_core::generation::{GeneratedImage, GenerationError, ImageGenerator, InputImage};
use tryon_core::storage::UploadStore;

use tryon_api::config::{ServerConfig, DEFAULT_MAX_UPLOAD_BYTES};
use tryon_api::engine::TryOnEngine;
use tryon_api::router::build_app_router;
use tryon_api::state::AppState;

pub const BOUNDARY: &str = "tryon-test-boundary";

/// Build a test `ServerConfig` with safe defaults rooted at `upload_dir`.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout. No generator is configured.
pub fn test_config(upload_dir: &std::path::Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        upload_dir: upload_dir.to_path_buf(),
        max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        retain_uploads: false,
        fallback_mode: FallbackMode::SideBySide,
        max_input_dimension: 1024,
        gemini: None,
    }
}

/// A running test application plus the directory backing its store.
///
/// The directory is removed when this value is dropped.
pub struct TestApp {
    pub router: Router,
    pub dir: TempDir,
}

impl TestApp {
    /// Names of all files currently in the upload directory, sorted.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Build the full application router (same middleware stack as `main.rs`)
/// over a fresh temporary upload directory.
pub async fn build_test_app(
    generator: Option<Arc<dyn ImageGenerator>>,
    customize: impl FnOnce(&mut ServerConfig),
) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    customize(&mut config);

    let store = UploadStore::open(&config.upload_dir).await.unwrap();
    let engine = TryOnEngine::new(generator, config.fallback_mode, config.max_input_dimension);

    let state = AppState {
        config: Arc::new(config.clone()),
        store: Arc::new(store),
        engine: Arc::new(engine),
    };

    TestApp {
        router: build_app_router(state, &config),
        dir,
    }
}

/// App with no generator and default config.
pub async fn build_default_app() -> TestApp {
    build_test_app(None, |_| {}).await
}

/// Generator that returns a fixed answer and counts its calls.
pub struct StubGenerator {
    pub answer: fn() -> Result<GeneratedImage, GenerationError>,
    pub calls: std::sync::atomic::AtomicUsize,
}

impl StubGenerator {
    pub fn new(answer: fn() -> Result<GeneratedImage, GenerationError>) -> Arc<Self> {
        Arc::new(Self {
            answer,
            calls: std::sync::atomic::AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for StubGenerator {
    fn name(&self) -> &str {
        "stub-model"
    }

    async fn generate(
        &self,
        _prompt: &str,
        _person: &InputImage,
        _garment: &InputImage,
    ) -> Result<GeneratedImage, GenerationError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        (self.answer)()
    }
}

/// Generator that takes `delay` before answering without an image.
pub struct SlowGenerator {
    pub delay: Duration,
}

#[async_trait]
impl ImageGenerator for SlowGenerator {
    fn name(&self) -> &str {
        "slow-model"
    }

    async fn generate(
        &self,
        _prompt: &str,
        _person: &InputImage,
        _garment: &InputImage,
    ) -> Result<GeneratedImage, GenerationError> {
        tokio::time::sleep(self.delay).await;
        Err(GenerationError::NoImage { text: None })
    }
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

fn encode(width: u32, height: u32, color: [u8; 3], format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(color));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    encode(width, height, color, ImageFormat::Png)
}

pub fn jpeg(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    encode(width, height, color, ImageFormat::Jpeg)
}

/// Dimensions of an encoded image.
pub fn dims(bytes: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(bytes).unwrap();
    (img.width(), img.height())
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// One file part of a multipart body: (field name, file name, content type, data).
pub type FilePart<'a> = (&'a str, &'a str, &'a str, &'a [u8]);

/// Encode `parts` as a `multipart/form-data` body using [`BOUNDARY`].
pub fn multipart_body(parts: &[FilePart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (field, filename, content_type, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// POST a multipart body to `uri`.
pub async fn post_multipart(app: Router, uri: &str, parts: &[FilePart<'_>]) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST the standard person/garment pair to `/api/try-on`.
pub async fn post_try_on(app: Router, person: &[u8], garment: &[u8]) -> Response<Body> {
    post_multipart(
        app,
        "/api/try-on",
        &[
            ("person_image", "person.png", "image/png", person),
            ("garment_image", "garment.png", "image/png", garment),
        ],
    )
    .await
}

/// Send a GET request to `uri`.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body into bytes.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}
