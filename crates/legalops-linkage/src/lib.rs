//! # legalops-linkage
//!
//! Directed, typed edges between records owned by different modules
//! ("contract C-1 references dispute D-9").
//!
//! [`LinkageStore`] persists edges through the remote API, keeps a local
//! bidirectional cache and announces every new edge to both endpoint
//! modules as `linkage_created` events.

#![deny(unsafe_code)]

pub mod errors;
pub mod store;

pub use errors::{LinkageError, Result};
pub use store::LinkageStore;
