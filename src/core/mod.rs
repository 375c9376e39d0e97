pub mod clock;
pub mod config;
pub mod entities;
pub mod error;
pub mod gate;
pub mod notifier;
pub mod paths;
pub mod secrets;
pub mod staging;
pub mod storage;
pub mod transfer;
pub mod types;
pub mod workflow;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigLoader, RelayConfig};
pub use entities::{EventBatch, EventRecord, Notification, TransferCredentials};
pub use error::AppError;
pub use notifier::{Notifier, NotifyError};
pub use secrets::{SecretError, SecretStore};
pub use storage::{ObjectStore, StorageError};
pub use transfer::{DeliveryPlan, SecureTransport, TransferError, TransferSession};
pub use types::*;
pub use workflow::{Collaborators, TransferWorkflow};
