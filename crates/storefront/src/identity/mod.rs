//! Identity primitives: the current-identity slot, the demo-account
//! resolver, and the persisted session record.

pub mod cache;
pub mod demo;
mod store;

pub use cache::{CacheError, FileSessionCache, MemorySessionCache, SessionCache};
pub use store::IdentityStore;

use serde::{Deserialize, Serialize};

use vastra_core::{Email, Phone, UserId};

/// Where an identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityRealm {
    /// Issued by the hosted auth subsystem.
    Remote,
    /// Synthesized locally from a demo account.
    Demo,
}

/// The authenticated user as seen by every storefront service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    #[serde(default)]
    pub phone: Option<Phone>,
    #[serde(default)]
    pub email: Option<Email>,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Refreshed from the profile row on every identity change; a failed
    /// refresh degrades to `false`.
    #[serde(default)]
    pub is_admin: bool,
    pub realm: IdentityRealm,
}
