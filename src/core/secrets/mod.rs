use crate::core::entities::TransferCredentials;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use async_trait::async_trait;
use thiserror::Error;

/// Source of the SFTP connection secret.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Raw secret string stored under `name`.
    async fn secret_string(&self, name: &str) -> Result<String, SecretError>;
}

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret {name} not found")]
    NotFound { name: String },

    #[error("secret {name} has no string value")]
    NotAString { name: String },

    #[error("secret {name} is malformed: {message}")]
    Malformed { name: String, message: String },

    #[error("secret request failed: {message}")]
    Request { message: String },
}

impl From<SecretError> for AppError {
    fn from(e: SecretError) -> Self {
        AppError::with_source(ErrorCategory::SecretError, e.to_string(), e)
    }
}

/// Fetch and parse the transfer credentials stored under `name`.
pub async fn load_credentials(
    store: &dyn SecretStore,
    name: &str,
) -> Result<TransferCredentials, SecretError> {
    let raw = store.secret_string(name).await?;
    parse_credentials(name, &raw)
}

/// Parse the JSON secret payload.
pub fn parse_credentials(name: &str, raw: &str) -> Result<TransferCredentials, SecretError> {
    serde_json::from_str(raw).map_err(|err| SecretError::Malformed {
        name: name.to_string(),
        message: err.to_string(),
    })
}
