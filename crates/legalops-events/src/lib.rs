//! # legalops-events
//!
//! In-process event plumbing shared by every legalops module:
//!
//! - [`EventBus`]: `(module, event)`-keyed publish/subscribe with weak
//!   subscriptions, per-callback failure isolation and remote forwarding
//! - [`Publisher`]: typed helpers for the closed domain-event taxonomy
//! - [`types`]: event payloads, linkages and notifications as wire types
//! - [`PublishEnvelope`]: the `{module, event, data, timestamp, eventId?}`
//!   form exchanged with the remote service

#![deny(unsafe_code)]

pub mod bus;
pub mod dedup;
pub mod envelope;
pub mod errors;
pub mod forward;
pub mod publisher;
pub mod types;

pub use bus::{EventBus, EventCallback, SubscriptionHandle};
pub use dedup::RecentEventIds;
pub use envelope::{PublishEnvelope, now_timestamp};
pub use errors::{EventError, EventResult, PublishForwardError};
pub use forward::EventForwarder;
pub use publisher::Publisher;
pub use types::{
    DomainEvent, EventType, LinkEndpoint, LinkType, ModuleLinkage, NewLinkage, Notification,
    NotificationKind,
};
