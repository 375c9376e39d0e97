use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use aws_sdk_secretsmanager::Client as SecretsClient;

use crate::core::secrets::{SecretError, SecretStore};

/// [`SecretStore`] backed by AWS Secrets Manager.
pub struct SecretsManagerStore {
    client: SecretsClient,
}

impl SecretsManagerStore {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: SecretsClient::new(sdk_config),
        }
    }
}

#[async_trait]
impl SecretStore for SecretsManagerStore {
    async fn secret_string(&self, name: &str) -> Result<String, SecretError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|err| {
                let message = DisplayErrorContext(&err).to_string();
                let service_err = err.into_service_error();
                if service_err.is_resource_not_found_exception() {
                    SecretError::NotFound {
                        name: name.to_string(),
                    }
                } else {
                    SecretError::Request { message }
                }
            })?;

        output
            .secret_string()
            .map(str::to_string)
            .ok_or_else(|| SecretError::NotAString {
                name: name.to_string(),
            })
    }
}
