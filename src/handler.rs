//! Per-invocation entry point shared by the Lambda runtime and the local `invoke` command.

use std::sync::Arc;

use aws_config::SdkConfig;
use aws_lambda_events::event::s3::S3Event;
use tracing::Instrument;

use crate::aws_integration::{
    batch_from_s3_event, S3ObjectStore, SecretsManagerStore, SnsNotifier,
};
use crate::core::clock::{run_stream_name, Clock};
use crate::core::config::RelayConfig;
use crate::core::error::AppError;
use crate::core::types::BatchOutcome;
use crate::core::workflow::{Collaborators, TransferWorkflow};
use crate::logging::{RunLogSink, UNSHIPPED_TARGET};
use crate::sftp::SftpTransport;

/// Wire the workflow to S3, Secrets Manager, SNS and SFTP.
pub fn build_workflow(
    config: RelayConfig,
    sdk_config: &SdkConfig,
    clock: Arc<dyn Clock>,
) -> Result<TransferWorkflow, AppError> {
    let collaborators = Collaborators {
        storage: Arc::new(S3ObjectStore::new(sdk_config)),
        secrets: Arc::new(SecretsManagerStore::new(sdk_config)),
        notifier: Arc::new(SnsNotifier::new(sdk_config, config.sns_topic.clone())),
        transport: Arc::new(SftpTransport::new()),
        clock,
    };
    TransferWorkflow::new(config, collaborators)
}

/// Handle one S3 event inside a `run` span named after the run's log stream.
///
/// The stream name, the gate and the archive dates all come from one clock reading. Logs are
/// flushed on every exit path; a flush failure is only a warning and never replaces the
/// workflow's own result.
pub async fn handle_invocation(
    workflow: &TransferWorkflow,
    logs: Option<&dyn RunLogSink>,
    event: &S3Event,
    request_id: &str,
) -> Result<BatchOutcome, AppError> {
    let now = workflow.local_now();
    let stream = run_stream_name(&now);
    let span = tracing::info_span!("run", stream = %stream, request_id = %request_id);

    let outcome = async {
        let batch = batch_from_s3_event(event);
        workflow.handle_at(&batch, &now).await
    }
    .instrument(span.clone())
    .await;

    if let Some(logs) = logs {
        if let Err(err) = logs.flush(&stream).await {
            span.in_scope(|| {
                tracing::warn!(target: UNSHIPPED_TARGET, error = %err, "Log flush failed")
            });
        }
    }

    outcome
}
