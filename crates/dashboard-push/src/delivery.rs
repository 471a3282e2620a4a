//! Delivery trait for the poll loop.

use async_trait::async_trait;
use tracing::warn;

use geometry::ZonePayload;

use crate::client::{DashboardClient, PushOutcome};
use crate::error::PushError;

/// Trait for delivering pushes.
///
/// Abstracted so the poll loop can be driven against a test double instead
/// of a live dashboard.
#[async_trait]
pub trait PushDelivery: Send + Sync {
    /// Make sure the session is usable, logging in (and persisting the fresh
    /// session) when it isn't.
    async fn ensure_authenticated(&self) -> Result<(), PushError>;

    /// Submit one push with its zone targeting payload.
    async fn send_push(&self, message: &str, zones: &ZonePayload) -> Result<PushOutcome, PushError>;
}

#[async_trait]
impl PushDelivery for DashboardClient {
    async fn ensure_authenticated(&self) -> Result<(), PushError> {
        if self.is_logged_in().await {
            return Ok(());
        }
        self.login().await?;
        if let Err(e) = self.save_cookies() {
            warn!(error = %e, "failed to persist session cookies");
        }
        Ok(())
    }

    async fn send_push(&self, message: &str, zones: &ZonePayload) -> Result<PushOutcome, PushError> {
        self.submit(message, zones).await
    }
}
