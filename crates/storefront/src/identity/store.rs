//! The process-wide current-identity slot.

use std::sync::Arc;

use tokio::sync::watch;

use super::Identity;

/// Single source of truth for "who is signed in".
///
/// Built on a watch channel: writers replace the slot (last write wins, which
/// is the declared ordering for racing transitions such as a stale session
/// check against a sign-out), and observers can await changes the way a UI
/// subscribes to auth-state events.
#[derive(Clone)]
pub struct IdentityStore {
    slot: Arc<watch::Sender<Option<Identity>>>,
}

impl IdentityStore {
    /// Create an empty (anonymous) store.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { slot: Arc::new(tx) }
    }

    /// The current identity, if any.
    #[must_use]
    pub fn current(&self) -> Option<Identity> {
        self.slot.borrow().clone()
    }

    /// Replace the current identity.
    pub fn set(&self, identity: Identity) {
        self.slot.send_replace(Some(identity));
    }

    /// Clear to the anonymous state.
    pub fn clear(&self) {
        self.slot.send_replace(None);
    }

    /// Subscribe to identity changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.slot.subscribe()
    }
}

impl Default for IdentityStore {
    fn default() -> Self {
        Self::new()
    }
}
