//! Messages arriving over the event stream.

use legalops_core::text::truncate_str;
use legalops_events::{Notification, PublishEnvelope};
use serde_json::Value;

use crate::errors::MalformedEventError;

const PREVIEW_BYTES: usize = 120;

/// One decoded stream message.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundMessage {
    /// A domain event published by some session.
    Event(PublishEnvelope),
    /// A notification for the inbox.
    Notification(Notification),
}

impl InboundMessage {
    /// Decode one SSE data payload.
    ///
    /// Objects carrying both `module` and `event` are envelopes; everything
    /// else must be a notification.
    pub fn parse(raw: &str) -> Result<Self, MalformedEventError> {
        let malformed = |reason: String| MalformedEventError {
            reason,
            preview: truncate_str(raw, PREVIEW_BYTES).to_owned(),
        };

        let value: Value = serde_json::from_str(raw).map_err(|e| malformed(e.to_string()))?;
        let Value::Object(fields) = &value else {
            return Err(malformed("not a JSON object".into()));
        };

        if fields.contains_key("module") && fields.contains_key("event") {
            serde_json::from_value(value)
                .map(Self::Event)
                .map_err(|e| malformed(format!("bad envelope: {e}")))
        } else {
            serde_json::from_value(value)
                .map(Self::Notification)
                .map_err(|e| malformed(format!("bad notification: {e}")))
        }
    }
}

/// Receives decoded stream messages after the bus has seen them.
///
/// Called on the channel's supervisor task; implementations must not block.
pub trait InboundObserver: Send + Sync {
    /// A remote event envelope.
    fn on_event(&self, _envelope: &PublishEnvelope) {}

    /// A remote notification.
    fn on_notification(&self, _notification: &Notification) {}
}
