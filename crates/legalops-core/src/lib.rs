//! # legalops-core
//!
//! Shared vocabulary for the legalops crates:
//!
//! - **Branded IDs**: [`EventId`], [`SubscriptionId`], [`LinkageId`],
//!   [`NotificationId`] as newtypes so ids of different kinds never mix
//! - **Logging**: `tracing` subscriber setup and a capture layer for tests
//! - **Backoff**: reconnect delay policy for long-lived streams
//! - **Text**: log-friendly truncation

#![deny(unsafe_code)]

pub mod backoff;
pub mod ids;
pub mod logging;
pub mod text;

pub use backoff::{ReconnectPolicy, ReconnectStrategy};
pub use ids::{EventId, LinkageId, NotificationId, SubscriptionId};
