//! Flat on-disk store for uploads and results.
//!
//! All files live directly under one root directory. Names are validated
//! with [`crate::naming::validate_filename`] before any filesystem access.

use std::path::{Path, PathBuf};

use crate::error::CoreError;
use crate::naming::validate_filename;

/// Default upload directory, relative to the working directory.
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    /// Create the root directory if needed and return a store over it.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute-or-relative path of `name` inside the store.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, CoreError> {
        validate_filename(name)?;
        Ok(self.root.join(name))
    }

    pub async fn save(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, CoreError> {
        let path = self.path_for(name)?;
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(file = %name, bytes = bytes.len(), "Stored file");
        Ok(path)
    }

    pub async fn read(&self, name: &str) -> Result<Vec<u8>, CoreError> {
        let path = self.path_for(name)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CoreError::NotFound {
                entity: "File",
                id: name.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn exists(&self, name: &str) -> Result<bool, CoreError> {
        let path = self.path_for(name)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    /// Remove `name`. A file that is already gone is not an error.
    pub async fn delete(&self, name: &str) -> Result<(), CoreError> {
        let path = self.path_for(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
