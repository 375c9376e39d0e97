use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub use crate::core::types::{BatchOutcome, ErrorCategory, GateDecision};

/// One newly created storage object named by the trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Container named by the event. The workflow operates on the configured bucket.
    pub bucket: Option<String>,
    /// Decoded object key.
    pub object_key: String,
}

impl EventRecord {
    pub fn new<K: Into<String>>(object_key: K) -> Self {
        Self {
            bucket: None,
            object_key: object_key.into(),
        }
    }

    pub fn in_bucket<B: Into<String>, K: Into<String>>(bucket: B, object_key: K) -> Self {
        Self {
            bucket: Some(bucket.into()),
            object_key: object_key.into(),
        }
    }
}

/// Ordered records delivered by a single invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBatch {
    pub records: Vec<EventRecord>,
}

impl EventBatch {
    pub fn new(records: Vec<EventRecord>) -> Self {
        Self { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

impl FromIterator<EventRecord> for EventBatch {
    fn from_iter<I: IntoIterator<Item = EventRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// SFTP connection details stored in the secret.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct TransferCredentials {
    pub host: String,
    #[serde(deserialize_with = "deserialize_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub remote_path: String,
    pub archive_path: String,
}

// Password stays out of every log line.
impl fmt::Debug for TransferCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferCredentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("remote_path", &self.remote_path)
            .field("archive_path", &self.archive_path)
            .finish()
    }
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPort {
        Number(u64),
        Text(String),
    }

    let raw = RawPort::deserialize(deserializer)?;
    let value = match raw {
        RawPort::Number(number) => number,
        RawPort::Text(text) => text
            .trim()
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom(format!("port '{}' is not a number", text)))?,
    };
    u16::try_from(value)
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| serde::de::Error::custom(format!("port {} is out of range", value)))
}

/// Operational message published to the notification topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub subject: String,
    pub message: String,
}

impl Notification {
    pub const WEEKEND_SUBJECT: &'static str = "SFTP File Alert - Weekend Upload";
    pub const SUCCESS_SUBJECT: &'static str = "SFTP Transfer Success";
    pub const FAILURE_SUBJECT: &'static str = "SFTP Transfer Failed";

    pub fn weekend_upload() -> Self {
        Self {
            subject: Self::WEEKEND_SUBJECT.to_string(),
            message: "A file was uploaded on Saturday or Sunday.".to_string(),
        }
    }

    pub fn transfer_succeeded(filename: &str) -> Self {
        Self {
            subject: Self::SUCCESS_SUBJECT.to_string(),
            message: format!(
                "File `{}` successfully transferred and archived.",
                filename
            ),
        }
    }

    pub fn transfer_failed<E: fmt::Display>(error: &E) -> Self {
        Self {
            subject: Self::FAILURE_SUBJECT.to_string(),
            message: error.to_string(),
        }
    }
}
