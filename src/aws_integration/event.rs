//! Builds the workflow's event batch from an S3 event notification.

use aws_lambda_events::event::s3::S3Event;

use crate::core::entities::{EventBatch, EventRecord};
use crate::core::paths::decode_event_key;

/// Convert the records of an S3 event, in order, into an [`EventBatch`].
///
/// Keys are decoded from their form encoding. Records without an object key cannot name a
/// file and are dropped with a warning.
pub fn batch_from_s3_event(event: &S3Event) -> EventBatch {
    event
        .records
        .iter()
        .filter_map(|record| {
            let Some(raw_key) = record.s3.object.key.as_deref() else {
                tracing::warn!(
                    event_name = ?record.event_name,
                    "Dropping S3 event record without an object key"
                );
                return None;
            };
            Some(EventRecord {
                bucket: record.s3.bucket.name.clone(),
                object_key: decode_event_key(raw_key),
            })
        })
        .collect()
}
