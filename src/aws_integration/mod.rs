//! AWS-backed implementations of the workflow collaborators.

pub mod event;
pub mod s3;
pub mod secrets;
pub mod sns;

pub use event::batch_from_s3_event;
pub use s3::S3ObjectStore;
pub use secrets::SecretsManagerStore;
pub use sns::SnsNotifier;

use aws_config::{BehaviorVersion, SdkConfig};

/// Load the shared SDK configuration from the default credential and region chain.
pub async fn load_sdk_config() -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest()).load().await
}
