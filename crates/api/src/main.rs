use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tryon_core::generation::ImageGenerator;
use tryon_core::storage::UploadStore;
use tryon_gemini::GeminiClient;

use tryon_api::config::ServerConfig;
use tryon_api::engine::TryOnEngine;
use tryon_api::router::build_app_router;
use tryon_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tryon_api=debug,tryon_gemini=debug,tryon_core=info,tower_http=debug".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        upload_dir = %config.upload_dir.display(),
        fallback_mode = config.fallback_mode.name(),
        "Loaded server configuration"
    );

    // --- Upload store ---
    let store = UploadStore::open(&config.upload_dir)
        .await
        .expect("Failed to create upload directory");
    tracing::info!(root = %store.root().display(), "Upload store ready");

    // --- Generator ---
    let generator: Option<Arc<dyn ImageGenerator>> = match config.gemini.clone() {
        Some(gemini) => {
            tracing::info!(model = %gemini.model, "Gemini generator configured");
            Some(Arc::new(GeminiClient::new(gemini)))
        }
        None => {
            tracing::warn!(
                "GEMINI_API_KEY not set; try-on requests will use the local fallback only"
            );
            None
        }
    };

    // --- App state ---
    let engine = TryOnEngine::new(generator, config.fallback_mode, config.max_input_dimension);
    let state = AppState {
        config: Arc::new(config.clone()),
        store: Arc::new(store),
        engine: Arc::new(engine),
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(listener, app)
        .with_graceful_shutdown({
            let shutdown = Arc::clone(&shutdown);
            async move {
                shutdown_signal().await;
                shutdown.notify_one();
            }
        })
        .into_future();

    // In-flight requests get `shutdown_timeout_secs` to drain.
    let drain_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let drain_deadline = async {
        shutdown.notified().await;
        tokio::time::sleep(drain_timeout).await;
    };

    tokio::select! {
        result = server => result.expect("Server error"),
        () = drain_deadline => {
            tracing::warn!(
                timeout_secs = config.shutdown_timeout_secs,
                "Shutdown timeout elapsed, dropping in-flight requests"
            );
        }
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
