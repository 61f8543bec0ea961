//! Delivery address domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vastra_core::{AddressId, AddressKind, UserId};

/// A saved delivery address.
///
/// At most one address per user carries `is_default = true`; the invariant
/// is maintained by an explicit clear-then-set sequence in the address book,
/// not by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    /// Stored under the `type` column.
    #[serde(rename = "type")]
    pub kind: AddressKind,
    /// Recipient name.
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// User-supplied address fields, shared by insert and update.
#[derive(Debug, Clone, Serialize)]
pub struct AddressDraft {
    #[serde(rename = "type")]
    pub kind: AddressKind,
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
}

/// Request record for inserting an address.
#[derive(Debug, Clone, Serialize)]
pub struct NewAddress {
    pub user_id: UserId,
    #[serde(flatten)]
    pub draft: AddressDraft,
}
