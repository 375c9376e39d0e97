#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use s3_sftp_relay::core::{
    clock::FixedClock, Collaborators, Notifier, NotifyError, ObjectStore, RelayConfig,
    SecretError, SecretStore, SecureTransport, StorageError, TransferCredentials,
    TransferError, TransferSession, TransferWorkflow,
};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const BUCKET: &str = "relay-bucket";
pub const SECRET: &str = "sftp/credentials";
pub const TOPIC: &str = "arn:aws:sns:ap-northeast-1:123456789012:relay";

pub const SECRET_JSON: &str = r#"{
    "host": "sftp.example.com",
    "port": "22",
    "username": "relay",
    "password": "hunter2",
    "remote_path": "/in",
    "archive_path": "/arc"
}"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    Download(String),
    Copy(String, String),
    Delete(String),
}

/// Bucket held in memory; records every call.
#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<BTreeMap<String, Vec<u8>>>,
    pub ops: Mutex<Vec<StorageOp>>,
    pub fail_copy: bool,
}

impl MemoryStore {
    pub fn with_objects(objects: &[(&str, &[u8])]) -> Self {
        let store = Self::default();
        {
            let mut map = store.objects.lock().unwrap();
            for (key, body) in objects {
                map.insert(key.to_string(), body.to_vec());
            }
        }
        store
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn ops(&self) -> Vec<StorageOp> {
        self.ops.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn download(
        &self,
        bucket: &str,
        key: &str,
        destination: &Path,
    ) -> Result<u64, StorageError> {
        self.ops
            .lock()
            .unwrap()
            .push(StorageOp::Download(key.to_string()));
        let body = self
            .objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;
        std::fs::write(destination, &body).map_err(|err| StorageError::Io {
            path: destination.display().to_string(),
            message: err.to_string(),
        })?;
        Ok(body.len() as u64)
    }

    async fn copy(
        &self,
        _bucket: &str,
        source_key: &str,
        destination_key: &str,
    ) -> Result<(), StorageError> {
        self.ops.lock().unwrap().push(StorageOp::Copy(
            source_key.to_string(),
            destination_key.to_string(),
        ));
        if self.fail_copy {
            return Err(StorageError::Request {
                message: "copy denied".to_string(),
            });
        }
        let mut objects = self.objects.lock().unwrap();
        let body = objects.get(source_key).cloned().unwrap_or_default();
        objects.insert(destination_key.to_string(), body);
        Ok(())
    }

    async fn delete(&self, _bucket: &str, key: &str) -> Result<(), StorageError> {
        self.ops
            .lock()
            .unwrap()
            .push(StorageOp::Delete(key.to_string()));
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Secret store that counts lookups.
pub struct StaticSecrets {
    pub value: Option<String>,
    pub lookups: AtomicUsize,
}

impl StaticSecrets {
    pub fn new(value: &str) -> Self {
        Self {
            value: Some(value.to_string()),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn missing() -> Self {
        Self {
            value: None,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for StaticSecrets {
    async fn secret_string(&self, name: &str) -> Result<String, SecretError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.value.clone().ok_or_else(|| SecretError::NotFound {
            name: name.to_string(),
        })
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent().into_iter().map(|(subject, _)| subject).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), message.to_string()));
        if self.fail {
            return Err(NotifyError::Publish("topic unavailable".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct TransportJournal {
    pub opened: usize,
    pub closed: usize,
    pub puts: Vec<(String, Vec<u8>)>,
}

/// SFTP stand-in that keeps uploaded bytes and can refuse chosen remote paths.
#[derive(Default)]
pub struct MemoryTransport {
    pub journal: Arc<Mutex<TransportJournal>>,
    pub refuse: HashSet<String>,
    pub refuse_connect: bool,
}

impl MemoryTransport {
    pub fn refusing(remote_path: &str) -> Self {
        let mut transport = Self::default();
        transport.refuse.insert(remote_path.to_string());
        transport
    }

    pub fn journal(&self) -> std::sync::MutexGuard<'_, TransportJournal> {
        self.journal.lock().unwrap()
    }
}

impl SecureTransport for MemoryTransport {
    fn open(
        &self,
        credentials: &TransferCredentials,
    ) -> Result<Box<dyn TransferSession>, TransferError> {
        if self.refuse_connect {
            return Err(TransferError::Connect {
                host: credentials.host.clone(),
                port: credentials.port,
                message: "connection refused".to_string(),
            });
        }
        self.journal.lock().unwrap().opened += 1;
        Ok(Box::new(MemorySession {
            journal: Arc::clone(&self.journal),
            refuse: self.refuse.clone(),
        }))
    }
}

struct MemorySession {
    journal: Arc<Mutex<TransportJournal>>,
    refuse: HashSet<String>,
}

impl TransferSession for MemorySession {
    fn put(&mut self, local: &Path, remote_path: &str) -> Result<u64, TransferError> {
        if self.refuse.contains(remote_path) {
            return Err(TransferError::Upload {
                remote_path: remote_path.to_string(),
                message: "permission denied".to_string(),
            });
        }
        let body = std::fs::read(local).map_err(|err| TransferError::Upload {
            remote_path: remote_path.to_string(),
            message: err.to_string(),
        })?;
        let len = body.len() as u64;
        self.journal
            .lock()
            .unwrap()
            .puts
            .push((remote_path.to_string(), body));
        Ok(len)
    }

    fn close(self: Box<Self>) -> Result<(), TransferError> {
        self.journal.lock().unwrap().closed += 1;
        Ok(())
    }
}

pub fn config(staging_dir: &Path) -> RelayConfig {
    RelayConfig {
        bucket: BUCKET.to_string(),
        secret_name: SECRET.to_string(),
        sns_topic: TOPIC.to_string(),
        staging_dir: staging_dir.to_path_buf(),
        ..RelayConfig::default()
    }
}

pub fn instant(rfc3339: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(rfc3339).unwrap()
}

/// Fakes shared with the workflow so tests can inspect them afterwards.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub secrets: Arc<StaticSecrets>,
    pub notifier: Arc<RecordingNotifier>,
    pub transport: Arc<MemoryTransport>,
    pub workflow: TransferWorkflow,
}

impl Harness {
    pub fn new(
        config: RelayConfig,
        now: &str,
        store: MemoryStore,
        secrets: StaticSecrets,
        notifier: RecordingNotifier,
        transport: MemoryTransport,
    ) -> Self {
        let store = Arc::new(store);
        let secrets = Arc::new(secrets);
        let notifier = Arc::new(notifier);
        let transport = Arc::new(transport);
        let collaborators = Collaborators {
            storage: store.clone(),
            secrets: secrets.clone(),
            notifier: notifier.clone(),
            transport: transport.clone(),
            clock: Arc::new(FixedClock::new(instant(now))),
        };
        let workflow = TransferWorkflow::new(config, collaborators).unwrap();
        Self {
            store,
            secrets,
            notifier,
            transport,
            workflow,
        }
    }
}
