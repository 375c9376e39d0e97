pub mod aws_integration;
pub mod cli;
pub mod core;
pub mod handler;
pub mod logging;
pub mod sftp;

/// Current crate version string exposed for CLI and tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub type Result<T> = std::result::Result<T, anyhow::Error>;
