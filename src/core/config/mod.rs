pub mod loader;

pub use loader::ConfigLoader;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Relay configuration, read once per cold start.
///
/// Values come from an optional TOML file and are then overridden by the environment, which is
/// how the function is normally configured when deployed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Bucket holding incoming and archived objects (`S3_BUCKET`)
    #[serde(default)]
    pub bucket: String,

    /// Prefix the bucket notification is scoped to (`S3_PREFIX`); informational only
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Secrets Manager entry holding the SFTP credentials (`SECRET_NAME`)
    #[serde(default)]
    pub secret_name: String,

    /// SNS topic ARN for operational notifications (`SNS_TOPIC`)
    #[serde(default)]
    pub sns_topic: String,

    /// Suppress transfers on Saturday and Sunday and alert instead (`WEEKEND_ALERT`)
    #[serde(default = "default_weekend_alert")]
    pub weekend_alert: bool,

    /// Fixed offset from UTC used for the weekend gate, archive dates and log stream names
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,

    /// Only keys with this suffix are relayed
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// Local directory downloaded objects are staged in
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,

    /// Top-level prefix for archived objects
    #[serde(default = "default_archive_prefix")]
    pub archive_prefix: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            prefix: default_prefix(),
            secret_name: String::new(),
            sns_topic: String::new(),
            weekend_alert: default_weekend_alert(),
            utc_offset_hours: default_utc_offset_hours(),
            file_extension: default_file_extension(),
            staging_dir: default_staging_dir(),
            archive_prefix: default_archive_prefix(),
        }
    }
}

impl RelayConfig {
    /// The configured offset as a chrono timezone. `None` when out of range.
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        self.utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
    }
}

fn default_prefix() -> String {
    "incoming/".to_string()
}

fn default_weekend_alert() -> bool {
    true
}

fn default_utc_offset_hours() -> i32 {
    9
}

fn default_file_extension() -> String {
    ".dat".to_string()
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("/tmp")
}

fn default_archive_prefix() -> String {
    "archived".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_deployment_contract() {
        let config = RelayConfig::default();
        assert_eq!(config.prefix, "incoming/");
        assert!(config.weekend_alert);
        assert_eq!(config.utc_offset_hours, 9);
        assert_eq!(config.file_extension, ".dat");
        assert_eq!(config.archive_prefix, "archived");
    }

    #[test]
    fn test_utc_offset_conversion() {
        let mut config = RelayConfig::default();
        assert_eq!(config.utc_offset(), FixedOffset::east_opt(9 * 3600));
        config.utc_offset_hours = -5;
        assert_eq!(config.utc_offset(), FixedOffset::west_opt(5 * 3600));
        config.utc_offset_hours = 24;
        assert_eq!(config.utc_offset(), None);
    }
}
