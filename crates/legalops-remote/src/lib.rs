//! # legalops-remote
//!
//! Everything that talks to the legalops service:
//!
//! - [`ApiClient`]: REST calls for notifications and linkages, and the
//!   bus's remote forwarder
//! - [`RemoteChannel`]: the server-push event stream with reconnection,
//!   behind the [`StreamConnector`] seam
//! - [`NotificationInbox`]: the user's notifications
//! - [`SessionCredentials`]: the bearer credential shared by all of them

#![deny(unsafe_code)]

pub mod api;
pub mod channel;
pub mod credentials;
pub mod errors;
pub mod inbound;
pub mod inbox;
pub mod sse;

pub use api::{ApiClient, DEFAULT_BASE_URL};
pub use channel::{
    ChannelState, ChannelStats, HttpStreamConnector, MessageStream, RemoteChannel, StreamConnector,
};
pub use credentials::SessionCredentials;
pub use errors::{ApiError, ApiResult, InboxError, MalformedEventError, StreamConnectError};
pub use inbound::{InboundMessage, InboundObserver};
pub use inbox::{InboxResult, NotificationInbox};
