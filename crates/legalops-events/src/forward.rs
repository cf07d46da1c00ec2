//! Seam between the local bus and the remote publish endpoint.

use async_trait::async_trait;

use crate::envelope::PublishEnvelope;
use crate::errors::PublishForwardError;

/// Sends locally published envelopes to the remote service for rebroadcast
/// to other sessions.
#[async_trait]
pub trait EventForwarder: Send + Sync {
    /// Forward one envelope. Errors are logged by the bus, never surfaced.
    async fn forward(&self, envelope: &PublishEnvelope) -> Result<(), PublishForwardError>;
}
