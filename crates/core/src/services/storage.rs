//! Photo blob storage.

use async_trait::async_trait;
use ecowatch_common::{AppError, AppResult};
use std::path::PathBuf;

/// Storage backend trait for verification photos.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write `data` under `key`, replacing anything already there.
    async fn save(&self, key: &str, data: &[u8]) -> AppResult<()>;

    /// Remove `key`. Missing keys are not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Public URL for `key`.
    fn url(&self, key: &str) -> String;
}

/// File extension for a photo content type.
#[must_use]
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
        .as_str()
    {
        "image/jpeg" | "image/jpg" => "jpeg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/heic" | "image/heif" => "heic",
        _ => "bin",
    }
}

/// Storage key of a verification photo.
#[must_use]
pub fn verification_photo_key(report_id: &str, verification_id: &str, content_type: &str) -> String {
    format!(
        "verifications/{report_id}/{verification_id}.{}",
        extension_for(content_type)
    )
}

/// Local filesystem storage backend.
#[derive(Clone)]
pub struct LocalStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Store files under `root`, served from `{base_url}/files/`.
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn path_of(&self, key: &str) -> AppResult<PathBuf> {
        if key.split('/').any(|part| part.is_empty() || part == "..") {
            return Err(AppError::BadRequest(format!("invalid storage key: {key}")));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn save(&self, key: &str, data: &[u8]) -> AppResult<()> {
        let path = self.path_of(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::ExternalService(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::ExternalService(format!("failed to write {key}: {e}")))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.path_of(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::ExternalService(format!(
                "failed to delete {key}: {e}"
            ))),
        }
    }

    fn url(&self, key: &str) -> String {
        format!("{}/files/{key}", self.base_url)
    }
}

/// Storage that discards everything. URLs are still well formed.
#[derive(Clone, Default)]
pub struct NoOpStorage {
    base_url: String,
}

impl NoOpStorage {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl StorageBackend for NoOpStorage {
    async fn save(&self, _key: &str, _data: &[u8]) -> AppResult<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> AppResult<()> {
        Ok(())
    }

    fn url(&self, key: &str) -> String {
        format!("{}/files/{key}", self.base_url)
    }
}

/// Type alias for the storage service.
pub type StorageService = std::sync::Arc<dyn StorageBackend>;
