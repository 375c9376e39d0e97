//! SFTP transport over libssh2 with password authentication.

use std::fs::File;
use std::io::{self, Write};
use std::net::TcpStream;
use std::path::Path;
use std::time::Duration;

use ssh2::{Session, Sftp};

use crate::core::entities::TransferCredentials;
use crate::core::transfer::{SecureTransport, TransferError, TransferSession};

/// Blocking timeout applied to libssh2 calls once connected.
const SESSION_TIMEOUT: Duration = Duration::from_secs(60);

/// [`SecureTransport`] that opens an SSH connection and an SFTP channel per session.
#[derive(Debug, Clone, Default)]
pub struct SftpTransport;

impl SftpTransport {
    pub fn new() -> Self {
        Self
    }
}

impl SecureTransport for SftpTransport {
    fn open(
        &self,
        credentials: &TransferCredentials,
    ) -> Result<Box<dyn TransferSession>, TransferError> {
        let connect_error = |message: String| TransferError::Connect {
            host: credentials.host.clone(),
            port: credentials.port,
            message,
        };

        let tcp = TcpStream::connect((credentials.host.as_str(), credentials.port))
            .map_err(|e| connect_error(e.to_string()))?;

        let mut session = Session::new().map_err(|e| connect_error(e.to_string()))?;
        session.set_tcp_stream(tcp);
        session.set_timeout(SESSION_TIMEOUT.as_millis() as u32);
        session
            .handshake()
            .map_err(|e| connect_error(format!("SSH handshake failed: {}", e)))?;

        let auth_error = |message: String| TransferError::Authentication {
            username: credentials.username.clone(),
            host: credentials.host.clone(),
            message,
        };
        session
            .userauth_password(&credentials.username, &credentials.password)
            .map_err(|e| auth_error(e.to_string()))?;
        if !session.authenticated() {
            return Err(auth_error("server rejected password".to_string()));
        }

        let mut connection = SftpSession {
            session,
            sftp: None,
            closed: false,
        };
        let sftp = connection
            .session
            .sftp()
            .map_err(|e| TransferError::Session(e.to_string()))?;
        connection.sftp = Some(sftp);
        Ok(Box::new(connection))
    }
}

/// Open SSH connection with its SFTP channel.
///
/// Dropping an unclosed session disconnects it, so error paths never leak a connection.
pub struct SftpSession {
    session: Session,
    sftp: Option<Sftp>,
    closed: bool,
}

impl SftpSession {
    fn disconnect(&mut self) -> Result<(), TransferError> {
        self.closed = true;
        // The SFTP channel must go before the session it runs on.
        self.sftp.take();
        self.session
            .disconnect(None, "transfer complete", None)
            .map_err(|e| TransferError::Session(e.to_string()))
    }
}

impl TransferSession for SftpSession {
    fn put(&mut self, local: &Path, remote_path: &str) -> Result<u64, TransferError> {
        let upload_error = |message: String| TransferError::Upload {
            remote_path: remote_path.to_string(),
            message,
        };
        let sftp = self
            .sftp
            .as_ref()
            .ok_or_else(|| TransferError::Session("SFTP channel already closed".to_string()))?;

        let mut source = File::open(local)
            .map_err(|e| upload_error(format!("cannot read {}: {}", local.display(), e)))?;
        let mut remote = sftp
            .create(Path::new(remote_path))
            .map_err(|e| upload_error(e.to_string()))?;
        let bytes = io::copy(&mut source, &mut remote).map_err(|e| upload_error(e.to_string()))?;
        remote.flush().map_err(|e| upload_error(e.to_string()))?;
        Ok(bytes)
    }

    fn close(mut self: Box<Self>) -> Result<(), TransferError> {
        self.disconnect()
    }
}

impl Drop for SftpSession {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(err) = self.disconnect() {
                tracing::warn!(error = %err, "Failed to disconnect SFTP session");
            }
        }
    }
}
