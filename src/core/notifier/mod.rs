use crate::core::entities::Notification;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use async_trait::async_trait;
use thiserror::Error;

/// Publishes operational notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification publish failed: {0}")]
    Publish(String),
}

impl From<NotifyError> for AppError {
    fn from(e: NotifyError) -> Self {
        AppError::with_source(ErrorCategory::NotificationError, e.to_string(), e)
    }
}

/// Publish a notification without letting a delivery failure escape; a failure is only logged.
pub async fn send_best_effort(notifier: &dyn Notifier, notification: &Notification) {
    match notifier
        .publish(&notification.subject, &notification.message)
        .await
    {
        Ok(()) => {
            tracing::info!(subject = %notification.subject, "Notification sent");
        }
        Err(err) => {
            tracing::error!(
                subject = %notification.subject,
                error = %err,
                "Failed to send notification"
            );
        }
    }
}
