//! Buffered CloudWatch Logs sink.
//!
//! Formatted lines are held in memory while a run executes and shipped to a per-run log stream
//! when the logging guard is flushed.

use crate::logging::layers::console::{formatted_layer, LogFormat};
use crate::logging::layers::BoxLayer;
use crate::Result;
use anyhow::{anyhow, Context};
use aws_sdk_cloudwatchlogs::error::DisplayErrorContext;
use aws_sdk_cloudwatchlogs::types::InputLogEvent;
use aws_sdk_cloudwatchlogs::Client as CloudWatchLogsClient;
use chrono::Utc;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::Subscriber;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Events with this target reach the console and file sinks but are never buffered for
/// CloudWatch. Used for lines about shipping itself, which would otherwise land in the next
/// run's stream.
pub const UNSHIPPED_TARGET: &str = "relay::unshipped";

/// PutLogEvents limits.
const MAX_BATCH_EVENTS: usize = 10_000;
const MAX_BATCH_BYTES: usize = 1_048_576;
const EVENT_OVERHEAD_BYTES: usize = 26;
const MAX_EVENT_BYTES: usize = 256 * 1024 - EVENT_OVERHEAD_BYTES;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferedLine {
    pub timestamp_ms: i64,
    pub message: String,
}

impl BufferedLine {
    fn size(&self) -> usize {
        self.message.len() + EVENT_OVERHEAD_BYTES
    }
}

/// Shared in-memory line buffer; each formatted event becomes one line.
#[derive(Debug, Clone, Default)]
pub struct LineBuffer {
    lines: Arc<Mutex<Vec<BufferedLine>>>,
    paused: Arc<AtomicBool>,
}

/// Drops incoming lines until released.
pub struct PauseGuard {
    paused: Arc<AtomicBool>,
}

impl Drop for PauseGuard {
    fn drop(&mut self) {
        self.paused.store(false, Ordering::SeqCst);
    }
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, raw: &[u8]) {
        if self.paused.load(Ordering::SeqCst) {
            return;
        }
        let text = String::from_utf8_lossy(raw);
        let text = text.trim_end_matches(['\r', '\n']);
        if text.is_empty() {
            return;
        }
        let line = BufferedLine {
            timestamp_ms: Utc::now().timestamp_millis(),
            message: truncate_utf8(text, MAX_EVENT_BYTES).to_string(),
        };
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }

    /// Stop buffering until the returned guard is dropped.
    pub fn pause(&self) -> PauseGuard {
        self.paused.store(true, Ordering::SeqCst);
        PauseGuard {
            paused: Arc::clone(&self.paused),
        }
    }

    /// Take every buffered line, leaving the buffer empty.
    pub fn drain(&self) -> Vec<BufferedLine> {
        match self.lines.lock() {
            Ok(mut lines) => std::mem::take(&mut *lines),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.lock().map(|lines| lines.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Writer handed out per event; commits its bytes as one line when dropped.
pub struct LineWriter {
    buffer: LineBuffer,
    pending: Vec<u8>,
}

impl io::Write for LineWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LineWriter {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            self.buffer.push(&self.pending);
        }
    }
}

impl<'a> MakeWriter<'a> for LineBuffer {
    type Writer = LineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LineWriter {
            buffer: self.clone(),
            pending: Vec::new(),
        }
    }
}

/// Build the JSON layer that feeds `buffer`, skipping [`UNSHIPPED_TARGET`] events.
pub fn buffer_layer<S>(buffer: LineBuffer) -> BoxLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    formatted_layer(LogFormat::Json, BoxMakeWriter::new(buffer))
        .with_filter(filter_fn(|metadata| metadata.target() != UNSHIPPED_TARGET))
        .boxed()
}

/// Ships buffered lines to a CloudWatch Logs group.
#[derive(Debug, Clone)]
pub struct CloudWatchSink {
    client: CloudWatchLogsClient,
    log_group: String,
    buffer: LineBuffer,
}

impl CloudWatchSink {
    pub fn new(client: CloudWatchLogsClient, log_group: String, buffer: LineBuffer) -> Self {
        Self {
            client,
            log_group,
            buffer,
        }
    }

    pub fn log_group(&self) -> &str {
        &self.log_group
    }

    /// Send everything buffered so far to `stream_name`, creating the stream when needed.
    /// Returns the number of events shipped.
    ///
    /// Buffering is paused while shipping so SDK logs from these calls are not carried into the
    /// next run.
    pub async fn ship(&self, stream_name: &str) -> Result<usize> {
        let _paused = self.buffer.pause();
        let mut lines = self.buffer.drain();
        if lines.is_empty() {
            return Ok(0);
        }
        lines.sort_by_key(|line| line.timestamp_ms);
        let total = lines.len();

        if let Err(err) = self
            .client
            .create_log_stream()
            .log_group_name(&self.log_group)
            .log_stream_name(stream_name)
            .send()
            .await
        {
            let message = DisplayErrorContext(&err).to_string();
            if !err.into_service_error().is_resource_already_exists_exception() {
                return Err(anyhow!(
                    "failed to create log stream {}/{}: {}",
                    self.log_group,
                    stream_name,
                    message
                ));
            }
        }

        for batch in batches(lines) {
            let events = batch
                .into_iter()
                .map(|line| {
                    InputLogEvent::builder()
                        .timestamp(line.timestamp_ms)
                        .message(line.message)
                        .build()
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .context("failed to build log event")?;

            self.client
                .put_log_events()
                .log_group_name(&self.log_group)
                .log_stream_name(stream_name)
                .set_log_events(Some(events))
                .send()
                .await
                .map_err(|err| {
                    anyhow!(
                        "failed to put log events to {}/{}: {}",
                        self.log_group,
                        stream_name,
                        DisplayErrorContext(&err)
                    )
                })?;
        }

        Ok(total)
    }
}

/// Split lines into PutLogEvents-sized batches, preserving order.
pub fn batches(lines: Vec<BufferedLine>) -> Vec<Vec<BufferedLine>> {
    let mut batches = Vec::new();
    let mut current: Vec<BufferedLine> = Vec::new();
    let mut current_bytes = 0;

    for line in lines {
        let size = line.size();
        if !current.is_empty()
            && (current.len() == MAX_BATCH_EVENTS || current_bytes + size > MAX_BATCH_BYTES)
        {
            batches.push(std::mem::take(&mut current));
            current_bytes = 0;
        }
        current_bytes += size;
        current.push(line);
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

fn truncate_utf8(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn line(message: &str) -> BufferedLine {
        BufferedLine {
            timestamp_ms: 1_717_462_800_000,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_writer_commits_one_line_per_event() {
        let buffer = LineBuffer::new();
        {
            let mut writer = buffer.make_writer();
            writer.write_all(b"{\"level\":\"INFO\"").unwrap();
            writer.write_all(b"}\n").unwrap();
        }
        {
            let _unused = buffer.make_writer();
        }
        let lines = buffer.drain();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].message, "{\"level\":\"INFO\"}");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_paused_buffer_drops_lines_until_released() {
        let buffer = LineBuffer::new();
        {
            let _paused = buffer.pause();
            buffer.make_writer().write_all(b"during ship\n").unwrap();
        }
        buffer.make_writer().write_all(b"next run\n").unwrap();
        let lines = buffer.drain();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].message, "next run");
    }

    #[test]
    fn test_unshipped_target_stays_out_of_buffer() {
        use tracing_subscriber::prelude::*;

        let buffer = LineBuffer::new();
        let subscriber = tracing_subscriber::registry().with(buffer_layer(buffer.clone()));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("Object archived");
            tracing::warn!(target: UNSHIPPED_TARGET, "Log flush failed");
        });

        let lines = buffer.drain();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].message.contains("Object archived"));
    }

    #[test]
    fn test_batches_split_on_event_count() {
        let lines: Vec<_> = (0..MAX_BATCH_EVENTS + 5).map(|_| line("x")).collect();
        let split = batches(lines);
        assert_eq!(split.len(), 2);
        assert_eq!(split[0].len(), MAX_BATCH_EVENTS);
        assert_eq!(split[1].len(), 5);
    }

    #[test]
    fn test_batches_split_on_payload_size() {
        let big = "a".repeat(400 * 1024 / 2);
        let lines = vec![line(&big), line(&big), line(&big), line(&big), line(&big), line(&big)];
        let split = batches(lines);
        assert!(split.len() >= 2);
        for batch in &split {
            let bytes: usize = batch.iter().map(BufferedLine::size).sum();
            assert!(bytes <= MAX_BATCH_BYTES);
        }
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "ああああ";
        assert_eq!(truncate_utf8(text, 4), "あ");
        assert_eq!(truncate_utf8(text, 100), text);
    }
}
