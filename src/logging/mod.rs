pub mod config;
pub mod context;
pub mod layers;

pub use context::{detect_context, ExecutionContext};
pub use layers::cloudwatch::UNSHIPPED_TARGET;
pub use layers::console::LogFormat;

use crate::logging::config::LoggingConfig;
use crate::logging::layers::cloudwatch::{self, CloudWatchSink, LineBuffer};
use crate::logging::layers::{console, file, BoxLayer};
use crate::Result;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::Client as CloudWatchLogsClient;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;

static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Destination that receives a run's logs once the run is over.
#[async_trait]
pub trait RunLogSink: Send + Sync {
    async fn flush(&self, stream_name: &str) -> Result<()>;
}

/// Keeps logging sinks alive for the process and flushes them at the end of each run.
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
    cloudwatch: Option<CloudWatchSink>,
}

#[async_trait]
impl RunLogSink for LoggingGuard {
    /// Flush console output and ship buffered lines to the run's CloudWatch stream.
    async fn flush(&self, stream_name: &str) -> Result<()> {
        std::io::stdout()
            .flush()
            .context("failed to flush stdout")?;
        if let Some(sink) = &self.cloudwatch {
            let shipped = sink.ship(stream_name).await?;
            tracing::debug!(
                target: UNSHIPPED_TARGET,
                log_group = %sink.log_group(),
                stream = %stream_name,
                events = shipped,
                "Shipped run logs"
            );
        }
        Ok(())
    }
}

/// Initialize the logging framework once per process.
///
/// `RUST_LOG` wins over the configured default level. A CloudWatch client is only used when a
/// log group is configured.
pub fn init(
    config: &LoggingConfig,
    context: ExecutionContext,
    cloudwatch_client: Option<CloudWatchLogsClient>,
) -> Result<LoggingGuard> {
    if LOGGER_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(anyhow!("logging already initialized"));
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_level))
        .context("failed to configure tracing level")?;

    let format = console::select_format(context, config.format);
    let mut layers: Vec<BoxLayer<Registry>> = vec![console::console_layer(format)];

    let file_guard = match &config.log_file {
        Some(path) => {
            let (layer, guard) = file::file_layer(path)?;
            layers.push(layer);
            Some(guard)
        }
        None => None,
    };

    let cloudwatch = match (&config.log_group, cloudwatch_client) {
        (Some(group), Some(client)) => {
            let buffer = LineBuffer::new();
            layers.push(cloudwatch::buffer_layer(buffer.clone()));
            Some(CloudWatchSink::new(client, group.clone(), buffer))
        }
        _ => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .context("failed to install tracing subscriber")?;

    if config.log_group.is_some() && cloudwatch.is_none() {
        tracing::warn!("RELAY_LOG_GROUP is set but no CloudWatch client is available");
    }

    Ok(LoggingGuard {
        _file_guard: file_guard,
        cloudwatch,
    })
}

