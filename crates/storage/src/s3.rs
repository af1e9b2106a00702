//! S3 [`StorageProvider`] for cloud deployments.

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::{validate_key, StorageError, StorageProvider};

/// Stores media files in an S3 bucket. The storage key is used verbatim
/// as the object key; `base_url` points at the bucket's public endpoint
/// or CDN distribution.
pub struct S3Storage {
    client: Client,
    bucket: String,
    base_url: String,
}

impl S3Storage {
    pub fn new(client: Client, bucket: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build an `S3Storage` from the ambient AWS environment
    /// (credentials chain, `AWS_REGION`).
    pub async fn from_env(bucket: impl Into<String>, base_url: impl Into<String>) -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(Client::new(&config), bucket, base_url)
    }
}

#[async_trait::async_trait]
impl StorageProvider for S3Storage {
    async fn save(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        validate_key(path)?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(ByteStream::from(bytes.to_vec()))
            .send()
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        validate_key(path)?;
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map(|s| s.is_no_such_key()) == Some(true) {
                    StorageError::NotFound(path.to_string())
                } else {
                    StorageError::S3(e.to_string())
                }
            })?;
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;
        Ok(bytes.into_bytes().to_vec())
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        validate_key(path)?;
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().map(|s| s.is_not_found()) == Some(true) => Ok(false),
            Err(e) => Err(StorageError::S3(e.to_string())),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        validate_key(path)?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}
