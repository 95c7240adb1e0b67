//! Blob storage for raw uploads and validation reports.
//!
//! Submission content is addressed deterministically from the filing
//! period, the LEI, and the submission id, so there is no location table;
//! callers rebuild the key and fetch. The local filesystem backend covers
//! deployments with a mounted volume; object stores implement the same
//! trait.

use async_trait::async_trait;
use std::path::PathBuf;

/// Appended to a submission id to form its report key.
pub const REPORT_QUALIFIER: &str = "_report";

/// Key for a submission's raw upload: `{period}/{lei}/{id}.{ext}`.
pub fn upload_key(period: &str, lei: &str, submission_id: i64, ext: &str) -> String {
    format!("{}/{}/{}.{}", period, lei, submission_id, ext)
}

/// Key for a submission's validation report: `{period}/{lei}/{id}_report.{ext}`.
pub fn report_key(period: &str, lei: &str, submission_id: i64, ext: &str) -> String {
    format!(
        "{}/{}/{}{}.{}",
        period, lei, submission_id, REPORT_QUALIFIER, ext
    )
}

#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Abstract blob storage for submission files and reports
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store binary content under a key, return a backend reference URI
    async fn store(
        &self,
        key: &str,
        content: &[u8],
        content_type: &str,
    ) -> Result<String, BlobStoreError>;

    /// Fetch binary content by key
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, BlobStoreError>;

    /// Delete binary content by key
    async fn delete(&self, key: &str) -> Result<(), BlobStoreError>;

    /// Check whether a key exists
    async fn exists(&self, key: &str) -> Result<bool, BlobStoreError>;
}

/// Local filesystem implementation
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for_key(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(
        &self,
        key: &str,
        content: &[u8],
        _content_type: &str,
    ) -> Result<String, BlobStoreError> {
        let path = self.path_for_key(key);

        // The period/lei prefix directories may not exist yet
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&path, content).await?;
        Ok(format!("file://{}", path.display()))
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>, BlobStoreError> {
        let path = self.path_for_key(key);

        if !path.exists() {
            return Err(BlobStoreError::NotFound(key.to_string()));
        }

        Ok(tokio::fs::read(path).await?)
    }

    async fn delete(&self, key: &str) -> Result<(), BlobStoreError> {
        let path = self.path_for_key(key);

        if path.exists() {
            tokio::fs::remove_file(path).await?;
        }

        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, BlobStoreError> {
        Ok(self.path_for_key(key).exists())
    }
}

/// In-memory blob store (for testing)
#[cfg(test)]
pub struct InMemoryBlobStore {
    blobs: std::sync::Arc<tokio::sync::RwLock<std::collections::HashMap<String, Vec<u8>>>>,
}

#[cfg(test)]
impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: std::sync::Arc::new(tokio::sync::RwLock::new(std::collections::HashMap::new())),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn store(
        &self,
        key: &str,
        content: &[u8],
        _content_type: &str,
    ) -> Result<String, BlobStoreError> {
        let mut blobs = self.blobs.write().await;
        blobs.insert(key.to_string(), content.to_vec());
        Ok(format!("memory://{}", key))
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>, BlobStoreError> {
        let blobs = self.blobs.read().await;
        blobs
            .get(key)
            .cloned()
            .ok_or_else(|| BlobStoreError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), BlobStoreError> {
        let mut blobs = self.blobs.write().await;
        blobs.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, BlobStoreError> {
        let blobs = self.blobs.read().await;
        Ok(blobs.contains_key(key))
    }
}
