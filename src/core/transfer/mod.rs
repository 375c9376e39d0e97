use crate::core::entities::TransferCredentials;
use crate::core::error::AppError;
use crate::core::paths::join_remote;
use crate::core::types::ErrorCategory;
use std::path::Path;
use thiserror::Error;

/// Opens authenticated file-transfer sessions.
///
/// Implementations are blocking; the workflow drives them from a blocking worker thread.
pub trait SecureTransport: Send + Sync {
    fn open(
        &self,
        credentials: &TransferCredentials,
    ) -> Result<Box<dyn TransferSession>, TransferError>;
}

/// One open file-transfer session on top of a secure connection.
pub trait TransferSession {
    /// Upload the local file to `remote_path`, creating or truncating it.
    fn put(&mut self, local: &Path, remote_path: &str) -> Result<u64, TransferError>;

    /// Close the file-transfer channel and the underlying connection.
    fn close(self: Box<Self>) -> Result<(), TransferError>;
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("failed to connect to {host}:{port}: {message}")]
    Connect {
        host: String,
        port: u16,
        message: String,
    },

    #[error("authentication failed for {username}@{host}: {message}")]
    Authentication {
        username: String,
        host: String,
        message: String,
    },

    #[error("SFTP session error: {0}")]
    Session(String),

    #[error("upload to {remote_path} failed: {message}")]
    Upload {
        remote_path: String,
        message: String,
    },
}

impl From<TransferError> for AppError {
    fn from(e: TransferError) -> Self {
        AppError::with_source(ErrorCategory::TransferError, e.to_string(), e)
    }
}

/// Remote destinations for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryPlan {
    pub incoming: String,
    pub archive: String,
}

impl DeliveryPlan {
    pub fn new(credentials: &TransferCredentials, filename: &str) -> Self {
        Self {
            incoming: join_remote(&credentials.remote_path, filename),
            archive: join_remote(&credentials.archive_path, filename),
        }
    }
}

/// Upload `local` to the incoming drop and then to the archive copy over one session.
///
/// The session is closed whether or not the uploads succeed. An upload error takes precedence
/// over a close error; a close error after two good uploads is only logged.
pub fn deliver(
    transport: &dyn SecureTransport,
    credentials: &TransferCredentials,
    local: &Path,
    plan: &DeliveryPlan,
) -> Result<(), TransferError> {
    tracing::info!(
        host = %credentials.host,
        port = credentials.port,
        "Connecting to SFTP server"
    );
    let mut session = transport.open(credentials)?;

    let uploaded = upload_both(session.as_mut(), local, plan);
    let closed = session.close();

    uploaded?;
    if let Err(err) = closed {
        tracing::warn!(error = %err, "SFTP session did not close cleanly");
    }

    tracing::info!(
        incoming = %plan.incoming,
        archive = %plan.archive,
        "Uploaded to SFTP"
    );
    Ok(())
}

fn upload_both(
    session: &mut dyn TransferSession,
    local: &Path,
    plan: &DeliveryPlan,
) -> Result<(), TransferError> {
    let bytes = session.put(local, &plan.incoming)?;
    tracing::debug!(remote = %plan.incoming, bytes, "Incoming upload complete");
    let bytes = session.put(local, &plan.archive)?;
    tracing::debug!(remote = %plan.archive, bytes, "Archive upload complete");
    Ok(())
}
