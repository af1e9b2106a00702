//! Local-disk [`StorageProvider`].

use std::path::PathBuf;

use crate::{validate_key, StorageError, StorageProvider};

/// Stores media files under a root directory on the local filesystem.
pub struct LocalDiskStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalDiskStorage {
    /// `root` is the directory files are written under; `base_url` is the
    /// public prefix the files are served from (no trailing slash needed).
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        validate_key(path)?;
        Ok(self.root.join(path))
    }
}

#[async_trait::async_trait]
impl StorageProvider for LocalDiskStorage {
    async fn save(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, bytes).await?;
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let full = self.resolve(path)?;
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let full = self.resolve(path)?;
        Ok(tokio::fs::try_exists(&full).await?)
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let full = self.resolve(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(dir: &tempfile::TempDir) -> LocalDiskStorage {
        LocalDiskStorage::new(dir.path(), "http://localhost:3000/media/")
    }

    #[tokio::test]
    async fn save_read_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        storage
            .save("blog/2026/08/cat.jpg", b"jpeg-bytes")
            .await
            .unwrap();
        assert!(storage.exists("blog/2026/08/cat.jpg").await.unwrap());
        assert_eq!(
            storage.read("blog/2026/08/cat.jpg").await.unwrap(),
            b"jpeg-bytes"
        );

        storage.delete("blog/2026/08/cat.jpg").await.unwrap();
        assert!(!storage.exists("blog/2026/08/cat.jpg").await.unwrap());

        // Deleting again is a no-op.
        storage.delete("blog/2026/08/cat.jpg").await.unwrap();
    }

    #[tokio::test]
    async fn read_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = storage(&dir).read("blog/nope.jpg").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn rejects_traversal_paths() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        for bad in ["../etc/passwd", "/abs/path", "a/../../b", ""] {
            let err = storage.save(bad, b"x").await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidPath(_)), "path: {bad}");
        }
    }

    #[tokio::test]
    async fn public_url_joins_base() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            storage(&dir).public_url("blog/2026/08/cat.jpg"),
            "http://localhost:3000/media/blog/2026/08/cat.jpg"
        );
    }
}
