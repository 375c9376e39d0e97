use crate::logging::context::ExecutionContext;
use crate::logging::layers::BoxLayer;
use serde::Deserialize;
use std::fmt;
use std::io;
use std::str::FromStr;
use tracing::Subscriber;
use tracing_subscriber::fmt::{self as tracing_fmt, writer::BoxMakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Line format for console output.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line, with the current span's fields attached.
    Json,
    /// Human readable lines.
    Text,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Json => write!(f, "json"),
            LogFormat::Text => write!(f, "text"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" => Ok(LogFormat::Text),
            _ => Err(format!(
                "invalid RELAY_LOG_FORMAT '{}'; supported values are json, text",
                value
            )),
        }
    }
}

/// Lambda ships stdout to CloudWatch, where JSON lines are queryable.
pub fn select_format(context: ExecutionContext, configured: Option<LogFormat>) -> LogFormat {
    match context {
        ExecutionContext::Lambda => configured.unwrap_or(LogFormat::Json),
        ExecutionContext::Local => configured.unwrap_or(LogFormat::Text),
    }
}

/// Build the stdout layer for the provided subscriber type.
pub fn console_layer<S>(format: LogFormat) -> BoxLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    formatted_layer(format, BoxMakeWriter::new(io::stdout))
}

/// Format layer shared by the console and CloudWatch sinks.
pub(crate) fn formatted_layer<S>(format: LogFormat, writer: BoxMakeWriter) -> BoxLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    match format {
        LogFormat::Json => tracing_fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(writer)
            .with_target(false)
            .boxed(),
        LogFormat::Text => tracing_fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
    }
}
