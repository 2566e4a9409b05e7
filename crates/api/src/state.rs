use std::sync::Arc;

use tryon_core::storage::UploadStore;

use crate::config::ServerConfig;
use crate::engine::TryOnEngine;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Upload/result directory.
    pub store: Arc<UploadStore>,
    /// Remote generation with local fallback.
    pub engine: Arc<TryOnEngine>,
}
