use async_trait::async_trait;

use crate::error::NotifyError;

/// Outbound notification sink. Fire-and-forget: an `Err` is only logged.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient_external_id: &str, text: &str) -> Result<(), NotifyError>;
}
