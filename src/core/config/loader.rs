#![allow(clippy::result_large_err)]

use super::RelayConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable naming an optional TOML file read before the env overrides.
pub const CONFIG_FILE_ENV: &str = "RELAY_CONFIG_FILE";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config for the current process.
    /// Reads the file named by `RELAY_CONFIG_FILE` when set, then applies environment
    /// overrides and validates the result.
    pub fn load() -> Result<RelayConfig, AppError> {
        let file_config = match env::var(CONFIG_FILE_ENV) {
            Ok(path) if !path.trim().is_empty() => {
                let path = PathBuf::from(path);
                let loaded = Self::load_from_file(&path)?;
                if loaded.is_none() {
                    return Err(AppError::new(
                        ErrorCategory::ConfigError,
                        format!("Config file {} does not exist", path.display()),
                    ));
                }
                loaded
            }
            _ => None,
        };

        let mut config = file_config.unwrap_or_default();
        Self::apply_env_overrides(&mut config);
        Self::validate_config(&config)?;
        Ok(config)
    }

    /// Load config from specific file path
    /// Returns Ok(None) if file doesn't exist
    pub fn load_from_file(path: &Path) -> Result<Option<RelayConfig>, AppError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("Failed to read config file {}: {}", path.display(), e),
            )
        })?;

        let config: RelayConfig = toml::from_str(&content).map_err(|e| {
            AppError::new(
                ErrorCategory::ConfigError,
                format!("Failed to parse config file {}: {}", path.display(), e),
            )
        })?;

        Ok(Some(config))
    }

    /// Apply environment variable overrides to the configuration
    /// Environment variables take precedence over config file values
    pub fn apply_env_overrides(config: &mut RelayConfig) {
        if let Ok(bucket) = env::var("S3_BUCKET") {
            config.bucket = bucket;
        }

        if let Ok(prefix) = env::var("S3_PREFIX") {
            config.prefix = prefix;
        }

        if let Ok(secret_name) = env::var("SECRET_NAME") {
            config.secret_name = secret_name;
        }

        if let Ok(topic) = env::var("SNS_TOPIC") {
            config.sns_topic = topic;
        }

        // Only the literal "true" enables the gate, matching the deployed templates.
        if let Ok(weekend_alert) = env::var("WEEKEND_ALERT") {
            config.weekend_alert = weekend_alert.trim().to_lowercase() == "true";
        }

        if let Ok(offset_str) = env::var("RELAY_UTC_OFFSET_HOURS") {
            match offset_str.trim().parse::<i32>() {
                Ok(hours) => config.utc_offset_hours = hours,
                Err(_) => tracing::warn!(
                    value = %offset_str,
                    "Ignoring RELAY_UTC_OFFSET_HOURS; expected a whole number of hours"
                ),
            }
        }

        if let Ok(extension) = env::var("RELAY_FILE_EXTENSION") {
            config.file_extension = extension;
        }

        if let Ok(staging_dir) = env::var("RELAY_STAGING_DIR") {
            config.staging_dir = PathBuf::from(staging_dir);
        }

        if let Ok(archive_prefix) = env::var("RELAY_ARCHIVE_PREFIX") {
            config.archive_prefix = archive_prefix;
        }
    }

    /// Get documentation for supported environment variables
    pub fn env_var_documentation() -> &'static [&'static str] {
        &[
            "S3_BUCKET - Bucket holding incoming and archived objects (required)",
            "S3_PREFIX - Prefix the bucket notification is scoped to (default: incoming/, informational)",
            "SECRET_NAME - Secrets Manager entry with host, port, username, password, remote_path, archive_path (required)",
            "SNS_TOPIC - SNS topic ARN for weekend, success and failure notifications (required)",
            "WEEKEND_ALERT - Suppress weekend transfers and alert instead (true/false, default: true)",
            "RELAY_UTC_OFFSET_HOURS - Fixed UTC offset for dates and the weekend gate (default: 9)",
            "RELAY_FILE_EXTENSION - Only keys ending in this suffix are relayed (default: .dat)",
            "RELAY_STAGING_DIR - Local directory downloads are staged in (default: /tmp)",
            "RELAY_ARCHIVE_PREFIX - Prefix for archived objects (default: archived)",
            "RELAY_CONFIG_FILE - Optional TOML file read before environment overrides",
            "RELAY_LOG_LEVEL - Default tracing directive when RUST_LOG is unset (default: info)",
            "RELAY_LOG_FORMAT - Console log format, json or text (default: json under Lambda, text locally)",
            "RELAY_LOG_FILE - Also append logs to this file",
            "RELAY_LOG_GROUP - Ship each run's logs to this CloudWatch Logs group",
        ]
    }

    /// Validate configuration values
    pub fn validate_config(config: &RelayConfig) -> Result<(), AppError> {
        let required = [
            ("S3_BUCKET", &config.bucket),
            ("SECRET_NAME", &config.secret_name),
            ("SNS_TOPIC", &config.sns_topic),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::new(
                    ErrorCategory::ConfigError,
                    format!("{} must be set", name),
                ));
            }
        }

        if config.utc_offset().is_none() {
            return Err(AppError::new(
                ErrorCategory::ConfigError,
                format!(
                    "UTC offset must be between -23 and 23 hours, got {}",
                    config.utc_offset_hours
                ),
            ));
        }

        if config.file_extension.trim().is_empty() {
            return Err(AppError::new(
                ErrorCategory::ConfigError,
                "File extension cannot be empty".to_string(),
            ));
        }

        if config.archive_prefix.trim_matches('/').is_empty() {
            return Err(AppError::new(
                ErrorCategory::ConfigError,
                "Archive prefix cannot be empty".to_string(),
            ));
        }

        if config.staging_dir.as_os_str().is_empty() {
            return Err(AppError::new(
                ErrorCategory::ConfigError,
                "Staging directory cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
