use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Object storage operations the relay needs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download `bucket/key` to `destination`, returning the number of bytes written.
    async fn download(
        &self,
        bucket: &str,
        key: &str,
        destination: &Path,
    ) -> Result<u64, StorageError>;

    /// Server-side copy of `source_key` to `destination_key` within `bucket`.
    async fn copy(
        &self,
        bucket: &str,
        source_key: &str,
        destination_key: &str,
    ) -> Result<(), StorageError>;

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError>;
}

/// Errors surfaced by an [`ObjectStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object s3://{bucket}/{key} not found")]
    NotFound { bucket: String, key: String },

    #[error("storage request failed: {message}")]
    Request { message: String },

    #[error("I/O error at {path}: {message}")]
    Io { path: String, message: String },
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::with_source(ErrorCategory::StorageError, e.to_string(), e)
    }
}
