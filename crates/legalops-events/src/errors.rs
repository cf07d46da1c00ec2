//! Event error types.

use thiserror::Error;

/// Errors building or decoding event payloads.
#[derive(Debug, Error)]
pub enum EventError {
    /// A payload could not be converted to or from JSON.
    #[error("event payload JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// The event name is not part of the closed taxonomy.
    #[error("unknown event type: {0}")]
    UnknownEventType(String),
}

/// Result alias for event operations.
pub type EventResult<T> = std::result::Result<T, EventError>;

/// Failure forwarding a locally published event to the remote service.
///
/// Only ever logged: local delivery has already happened by the time a
/// forward can fail.
#[derive(Debug, Error)]
pub enum PublishForwardError {
    /// The remote service answered with a non-success status.
    #[error("remote rejected publish ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },
    /// The request never produced a response.
    #[error("remote publish failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_event_display() {
        let err = EventError::UnknownEventType("matter_closed".into());
        assert_eq!(err.to_string(), "unknown event type: matter_closed");
    }

    #[test]
    fn forward_rejected_display() {
        let err = PublishForwardError::Rejected {
            status: 503,
            message: "unavailable".into(),
        };
        assert_eq!(err.to_string(), "remote rejected publish (503): unavailable");
    }

    #[test]
    fn forward_transport_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = PublishForwardError::Transport(Box::new(io));
        assert!(std::error::Error::source(&err).is_some());
    }
}
