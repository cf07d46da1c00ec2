//! Wire form of a published event.

use chrono::{SecondsFormat, Utc};
use legalops_core::EventId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current time as an RFC 3339 UTC timestamp with millisecond precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `{ module, event, data, timestamp, eventId? }` as sent to
/// `POST /notifications/publish` and received over the stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishEnvelope {
    /// Module the event is addressed to.
    pub module: String,
    /// Event type name.
    pub event: String,
    /// Detail object delivered to subscribers.
    #[serde(default)]
    pub data: Value,
    /// When the envelope was created.
    #[serde(default)]
    pub timestamp: String,
    /// Present only when duplicate suppression is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
}

impl PublishEnvelope {
    /// Stamp a new envelope with the current time.
    pub fn new(module: impl Into<String>, event: impl Into<String>, data: Value) -> Self {
        Self {
            module: module.into(),
            event: event.into(),
            data,
            timestamp: now_timestamp(),
            event_id: None,
        }
    }

    /// Attach an event id.
    #[must_use]
    pub fn with_event_id(mut self, id: EventId) -> Self {
        self.event_id = Some(id);
        self
    }
}
