//! Remote-side error types.

use thiserror::Error;

/// Failure of a REST call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or its body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },

    /// The response body was not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configured base URL cannot be used to build a request URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// HTTP status for [`ApiError::Status`], or the transport error's status.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Json(_) | Self::InvalidUrl(_) => None,
        }
    }

    /// Whether the remote reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Result alias for REST calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure establishing the event stream. Always retried by the channel.
#[derive(Debug, Error)]
pub enum StreamConnectError {
    /// The request could not be sent.
    #[error("stream request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service refused the stream.
    #[error("stream refused ({status}): {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },

    /// The stream URL could not be built.
    #[error("invalid stream URL: {0}")]
    InvalidUrl(String),
}

/// A stream message that is neither an event envelope nor a notification.
#[derive(Debug, Error)]
#[error("malformed stream message ({reason}): {preview}")]
pub struct MalformedEventError {
    /// Why the message was rejected.
    pub reason: String,
    /// Start of the raw message.
    pub preview: String,
}

/// Failure of an inbox operation.
#[derive(Debug, Error)]
pub enum InboxError {
    /// The backing REST call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display() {
        let err = ApiError::Status {
            status: 404,
            message: "linkage not found".into(),
        };
        assert_eq!(err.to_string(), "API error (404): linkage not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn json_error_has_no_status() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ApiError::from(json_err);
        assert_eq!(err.status(), None);
        assert!(!err.is_not_found());
    }

    #[test]
    fn inbox_error_is_transparent() {
        let err = InboxError::from(ApiError::InvalidUrl("nope".into()));
        assert_eq!(err.to_string(), "invalid URL: nope");
    }

    #[test]
    fn malformed_display_includes_preview() {
        let err = MalformedEventError {
            reason: "expected value".into(),
            preview: "not-json".into(),
        };
        assert_eq!(err.to_string(), "malformed stream message (expected value): not-json");
    }
}
