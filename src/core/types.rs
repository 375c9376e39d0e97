use serde::{Deserialize, Serialize};

/// Error category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    ConfigError,
    StorageError,
    SecretError,
    TransferError,
    NotificationError,
    SerializationError,
    IoError,
    InternalError,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Outcome of the weekend gate for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateDecision {
    Proceed,
    Suppress,
}

/// How a batch finished when no error was raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// The weekend gate tripped; nothing was touched.
    Suppressed,
    /// Every record was transferred and archived.
    Completed { transferred: Vec<String> },
    /// An ineligible key ended the batch; earlier records were still transferred.
    EndedEarly {
        ineligible_key: String,
        transferred: Vec<String>,
    },
}

impl BatchOutcome {
    /// File names that made it all the way through settle.
    pub fn transferred(&self) -> &[String] {
        match self {
            BatchOutcome::Suppressed => &[],
            BatchOutcome::Completed { transferred } => transferred,
            BatchOutcome::EndedEarly { transferred, .. } => transferred,
        }
    }
}
