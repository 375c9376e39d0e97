//! The transfer workflow: gate, fetch, deliver and settle for one event batch.

use crate::core::clock::Clock;
use crate::core::config::RelayConfig;
use crate::core::entities::{EventBatch, EventRecord, Notification, TransferCredentials};
use crate::core::error::AppError;
use crate::core::gate;
use crate::core::notifier::{send_best_effort, Notifier};
use crate::core::paths;
use crate::core::secrets::{load_credentials, SecretStore};
use crate::core::staging::StagedFile;
use crate::core::storage::ObjectStore;
use crate::core::transfer::{self, DeliveryPlan, SecureTransport};
use crate::core::types::{BatchOutcome, ErrorCategory, GateDecision};
use chrono::{DateTime, FixedOffset};
use std::sync::Arc;

/// External systems the workflow drives.
#[derive(Clone)]
pub struct Collaborators {
    pub storage: Arc<dyn ObjectStore>,
    pub secrets: Arc<dyn SecretStore>,
    pub notifier: Arc<dyn Notifier>,
    pub transport: Arc<dyn SecureTransport>,
    pub clock: Arc<dyn Clock>,
}

/// Relays every record of a batch from object storage to the SFTP server.
///
/// Records are handled one at a time in arrival order and each settled record is reported as
/// soon as it is archived. The first failing record aborts the rest of the batch, publishes one
/// failure notification and returns the error unchanged.
pub struct TransferWorkflow {
    config: RelayConfig,
    offset: FixedOffset,
    collaborators: Collaborators,
}

impl TransferWorkflow {
    pub fn new(config: RelayConfig, collaborators: Collaborators) -> Result<Self, AppError> {
        let offset = config.utc_offset().ok_or_else(|| {
            AppError::new(
                ErrorCategory::ConfigError,
                format!(
                    "UTC offset of {} hours is out of range",
                    config.utc_offset_hours
                ),
            )
        })?;
        Ok(Self {
            config,
            offset,
            collaborators,
        })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Current instant in the configured offset.
    pub fn local_now(&self) -> DateTime<FixedOffset> {
        self.collaborators.clock.now().with_timezone(&self.offset)
    }

    /// Run the whole workflow for one invocation, starting now.
    pub async fn handle(&self, batch: &EventBatch) -> Result<BatchOutcome, AppError> {
        self.handle_at(batch, &self.local_now()).await
    }

    /// Run the whole workflow with `now` as the run's instant.
    ///
    /// The gate and every archive date use this one instant.
    pub async fn handle_at(
        &self,
        batch: &EventBatch,
        now: &DateTime<FixedOffset>,
    ) -> Result<BatchOutcome, AppError> {
        tracing::info!(records = batch.len(), "Relay triggered");

        if gate::evaluate(now, self.config.weekend_alert) == GateDecision::Suppress {
            tracing::warn!(weekday = %now.format("%A"), "Weekend upload; skipping transfer");
            self.notify(&Notification::weekend_upload()).await;
            return Ok(BatchOutcome::Suppressed);
        }

        let outcome = self.process(batch, now).await;
        if let Err(err) = &outcome {
            tracing::error!(error = %err, "Relay failed");
            self.notify(&Notification::transfer_failed(err)).await;
        }
        outcome
    }

    async fn notify(&self, notification: &Notification) {
        send_best_effort(self.collaborators.notifier.as_ref(), notification).await;
    }

    async fn process(
        &self,
        batch: &EventBatch,
        now: &DateTime<FixedOffset>,
    ) -> Result<BatchOutcome, AppError> {
        let mut credentials: Option<TransferCredentials> = None;
        let mut transferred = Vec::with_capacity(batch.len());

        for record in &batch.records {
            let key = record.object_key.as_str();
            if !paths::is_eligible(key, &self.config.file_extension) {
                // Ends the whole batch, not just this record.
                tracing::info!(
                    key,
                    extension = %self.config.file_extension,
                    "Skipping ineligible object; ending batch"
                );
                return Ok(BatchOutcome::EndedEarly {
                    ineligible_key: key.to_string(),
                    transferred,
                });
            }

            if let Some(bucket) = &record.bucket {
                if bucket != &self.config.bucket {
                    tracing::warn!(
                        event_bucket = %bucket,
                        configured_bucket = %self.config.bucket,
                        "Event names a different bucket; using the configured one"
                    );
                }
            }

            let filename = paths::file_name(key).to_string();
            let staged = self.fetch(record, &filename).await?;

            let creds = match credentials.take() {
                Some(creds) => creds,
                None => self.load_credentials().await?,
            };

            self.deliver(&staged, &filename, &creds).await?;
            self.settle(key, &filename, now).await?;
            // Reported before the next record starts.
            self.notify(&Notification::transfer_succeeded(&filename)).await;

            credentials = Some(creds);
            transferred.push(filename);
        }

        Ok(BatchOutcome::Completed { transferred })
    }

    async fn fetch(&self, record: &EventRecord, filename: &str) -> Result<StagedFile, AppError> {
        let staged = StagedFile::reserve(&self.config.staging_dir, filename)?;
        tracing::info!(
            bucket = %self.config.bucket,
            key = %record.object_key,
            "Downloading object"
        );
        let bytes = self
            .collaborators
            .storage
            .download(&self.config.bucket, &record.object_key, staged.path())
            .await?;
        tracing::debug!(path = %staged.path().display(), bytes, "Object staged");
        Ok(staged)
    }

    async fn load_credentials(&self) -> Result<TransferCredentials, AppError> {
        tracing::info!(secret = %self.config.secret_name, "Loading SFTP credentials");
        let creds = load_credentials(
            self.collaborators.secrets.as_ref(),
            &self.config.secret_name,
        )
        .await?;
        Ok(creds)
    }

    async fn deliver(
        &self,
        staged: &StagedFile,
        filename: &str,
        credentials: &TransferCredentials,
    ) -> Result<(), AppError> {
        let plan = DeliveryPlan::new(credentials, filename);
        let transport = Arc::clone(&self.collaborators.transport);
        let credentials = credentials.clone();
        let local = staged.path().to_path_buf();

        tokio::task::spawn_blocking(move || {
            transfer::deliver(transport.as_ref(), &credentials, &local, &plan)
        })
        .await
        .map_err(|err| {
            AppError::new(
                ErrorCategory::InternalError,
                format!("SFTP worker did not complete: {}", err),
            )
        })??;
        Ok(())
    }

    async fn settle(
        &self,
        key: &str,
        filename: &str,
        now: &DateTime<FixedOffset>,
    ) -> Result<(), AppError> {
        let archive_key =
            paths::archive_key(&self.config.archive_prefix, now.date_naive(), filename);
        tracing::info!(archive_key = %archive_key, "Archiving object");

        let storage = self.collaborators.storage.as_ref();
        storage.copy(&self.config.bucket, key, &archive_key).await?;
        storage.delete(&self.config.bucket, key).await?;
        tracing::info!(key, "Original object deleted");
        Ok(())
    }
}
