use crate::logging::layers::console::LogFormat;
use crate::Result;
use anyhow::anyhow;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::filter::{Directive, LevelFilter};

const DEFAULT_LEVEL: &str = "info";

/// Resolved logging configuration after applying env overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub default_level: String,
    pub format: Option<LogFormat>,
    pub log_file: Option<PathBuf>,
    pub log_group: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_level: DEFAULT_LEVEL.to_string(),
            format: None,
            log_file: None,
            log_group: None,
        }
    }
}

impl LoggingConfig {
    /// Load configuration with deterministic precedence: defaults, then env overrides.
    pub fn load() -> Result<Self> {
        let mut config = LoggingConfig::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(level) = non_empty_var("RELAY_LOG_LEVEL") {
            self.default_level = level;
        }
        if let Some(format) = non_empty_var("RELAY_LOG_FORMAT") {
            self.format = Some(LogFormat::from_str(&format).map_err(|err| anyhow!(err))?);
        }
        if let Some(path) = non_empty_var("RELAY_LOG_FILE") {
            self.log_file = Some(PathBuf::from(path));
        }
        if let Some(group) = non_empty_var("RELAY_LOG_GROUP") {
            self.log_group = Some(group);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        validate_level(&self.default_level)?;

        if let Some(group) = &self.log_group {
            if group.len() > 512 {
                return Err(anyhow!("RELAY_LOG_GROUP must be at most 512 characters"));
            }
        }

        Ok(())
    }
}

/// Accepts `level` or comma-separated `target=level` directives. A bare word must be a level,
/// otherwise it would silently turn into a target directive.
fn validate_level(value: &str) -> Result<()> {
    let invalid = || anyhow!("RELAY_LOG_LEVEL '{}' is not a valid level or directive", value);
    for part in value.split(',').map(str::trim) {
        if part.contains('=') {
            Directive::from_str(part).map_err(|_| invalid())?;
        } else {
            LevelFilter::from_str(part).map_err(|_| invalid())?;
        }
    }
    Ok(())
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LoggingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_level, "info");
        assert!(config.log_group.is_none());
    }

    #[test]
    fn test_invalid_level_rejected() {
        for level in ["not a directive!!", "verbose", "info,chatty", "relay=loud"] {
            let config = LoggingConfig {
                default_level: level.to_string(),
                ..LoggingConfig::default()
            };
            assert!(config.validate().is_err(), "{} should be rejected", level);
        }
    }

    #[test]
    fn test_levels_and_target_directives_accepted() {
        for level in ["debug", "WARN", "off", "info,aws_smithy_runtime=warn"] {
            let config = LoggingConfig {
                default_level: level.to_string(),
                ..LoggingConfig::default()
            };
            assert!(config.validate().is_ok(), "{} should be accepted", level);
        }
    }
}
