//! Inbox notifications.

use legalops_core::NotificationId;
use serde::{Deserialize, Serialize};

wire_enum! {
    /// Severity/flavour of a notification.
    NotificationKind {
        /// Informational.
        Info => "info",
        /// Something completed.
        Success => "success",
        /// Needs attention.
        Warning => "warning",
        /// Something failed.
        Error => "error",
    }
}

/// A human-facing notification.
///
/// Created by the remote service (or a local publish); only `read` ever
/// changes client-side, and notifications are never deleted locally.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Server-issued id.
    pub id: NotificationId,
    /// Severity/flavour.
    #[serde(rename = "type", alias = "kind")]
    pub kind: NotificationKind,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Creation time.
    pub timestamp: String,
    /// Whether the user has seen it.
    #[serde(default)]
    pub read: bool,
    /// Deep link into the application.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
}
