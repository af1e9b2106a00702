//! Pluggable media file storage.
//!
//! Uploaded images and their resized derivatives are written through the
//! [`StorageProvider`] trait. Two providers ship in-tree:
//! [`LocalDiskStorage`] for single-host deployments and [`S3Storage`] for
//! blob storage. Paths are forward-slash relative keys such as
//! `blog/2026/08/md/cat.jpg`.

pub mod local;
pub mod s3;

pub use local::LocalDiskStorage;
pub use s3::S3Storage;

/// Errors from a storage provider.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("File not found: {0}")]
    NotFound(String),
}

/// A file store for media uploads and their derivatives.
#[async_trait::async_trait]
pub trait StorageProvider: Send + Sync {
    /// Write `bytes` at `path`, creating parent folders as needed and
    /// replacing any existing file.
    async fn save(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Read the file at `path`.
    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Whether a file exists at `path`.
    async fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Delete the file at `path`. Deleting a missing file is a no-op.
    async fn delete(&self, path: &str) -> Result<(), StorageError>;

    /// Public URL serving the file at `path`.
    fn public_url(&self, path: &str) -> String;
}

/// Reject path traversal and absolute keys before they reach a backend.
pub(crate) fn validate_key(path: &str) -> Result<(), StorageError> {
    if path.is_empty() || path.starts_with('/') || path.split('/').any(|seg| seg == "..") {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    Ok(())
}
