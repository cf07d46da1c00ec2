//! Session credential shared by the REST client and the event stream.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// Bearer credential of the current session, shared by clones.
///
/// Authentication itself happens elsewhere; this only carries the result.
/// An empty string counts as no credential.
#[derive(Clone, Default)]
pub struct SessionCredentials {
    token: Arc<RwLock<Option<String>>>,
}

impl SessionCredentials {
    /// No credential yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        let credentials = Self::new();
        credentials.set(token);
        credentials
    }

    /// Replace the credential.
    pub fn set(&self, token: impl Into<String>) {
        let token = token.into();
        *self.token.write() = (!token.is_empty()).then_some(token);
    }

    /// Forget the credential (logout).
    pub fn clear(&self) {
        *self.token.write() = None;
    }

    /// Current credential, if any.
    pub fn current(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Whether a credential is present.
    pub fn is_present(&self) -> bool {
        self.token.read().is_some()
    }
}

impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = if self.is_present() { "[redacted]" } else { "none" };
        f.debug_struct("SessionCredentials").field("token", &shown).finish()
    }
}
