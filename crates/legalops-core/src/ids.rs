//! Branded ID newtypes.
//!
//! Two families:
//!
//! - **Client-minted** ids ([`EventId`], [`SubscriptionId`]) are UUID v7
//!   strings generated locally via [`Uuid::now_v7`].
//! - **Server-issued** ids ([`LinkageId`], [`NotificationId`]) are opaque
//!   strings assigned by the remote API. They have no `new()`: a linkage id
//!   only exists once the remote service has accepted the edge.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! branded_id {
    (@common $(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Borrow the inner string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
    (minted $(#[$meta:meta])* $name:ident) => {
        branded_id!(@common $(#[$meta])* $name);

        impl $name {
            /// Mint a fresh time-ordered id (UUID v7).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
    (issued $(#[$meta:meta])* $name:ident) => {
        branded_id!(@common $(#[$meta])* $name);
    };
}

branded_id! {
    minted
    /// Identifier stamped on a published event envelope.
    EventId
}

branded_id! {
    minted
    /// Identifier of an event-bus subscription.
    SubscriptionId
}

branded_id! {
    issued
    /// Server-issued identifier of a module linkage edge.
    LinkageId
}

branded_id! {
    issued
    /// Server-issued identifier of an inbox notification.
    NotificationId
}
