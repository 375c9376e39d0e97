//! S3 object store.

use std::path::Path;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client as S3Client;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::core::storage::{ObjectStore, StorageError};

/// Bytes left unescaped in a `CopySource` key.
const COPY_SOURCE_KEY: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// [`ObjectStore`] backed by the AWS SDK S3 client.
pub struct S3ObjectStore {
    client: S3Client,
}

impl S3ObjectStore {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: S3Client::new(sdk_config),
        }
    }
}

/// `CopySource` value for an object: bucket plus URL-encoded key.
pub fn copy_source(bucket: &str, key: &str) -> String {
    format!("{}/{}", bucket, utf8_percent_encode(key, COPY_SOURCE_KEY))
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn download(
        &self,
        bucket: &str,
        key: &str,
        destination: &Path,
    ) -> Result<u64, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                let message = DisplayErrorContext(&err).to_string();
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    StorageError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    StorageError::Request { message }
                }
            })?;

        let io_error = |e: std::io::Error| StorageError::Io {
            path: destination.display().to_string(),
            message: e.to_string(),
        };

        let mut file = File::create(destination).await.map_err(io_error)?;
        let mut body = response.body;
        let mut written: u64 = 0;
        while let Some(chunk) = body.try_next().await.map_err(|e| StorageError::Request {
            message: e.to_string(),
        })? {
            file.write_all(&chunk).await.map_err(io_error)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(io_error)?;

        Ok(written)
    }

    async fn copy(
        &self,
        bucket: &str,
        source_key: &str,
        destination_key: &str,
    ) -> Result<(), StorageError> {
        self.client
            .copy_object()
            .bucket(bucket)
            .copy_source(copy_source(bucket, source_key))
            .key(destination_key)
            .send()
            .await
            .map_err(|err| StorageError::Request {
                message: format!(
                    "copy {} -> {}: {}",
                    source_key,
                    destination_key,
                    DisplayErrorContext(&err)
                ),
            })?;
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| StorageError::Request {
                message: format!("delete {}: {}", key, DisplayErrorContext(&err)),
            })?;
        Ok(())
    }
}
