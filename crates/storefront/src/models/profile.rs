//! User profile domain types.

use serde::{Deserialize, Serialize};

use vastra_core::{Phone, UserId};

/// A user profile row; carries the admin flag read on every identity change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Same id as the auth user.
    pub id: UserId,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<Phone>,
    #[serde(default)]
    pub is_admin: bool,
}

/// Upsert record for a user profile.
///
/// `is_admin` is only sent when explicitly set; a plain sign-up never
/// touches the flag.
#[derive(Debug, Clone, Serialize)]
pub struct NewProfile {
    pub id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<Phone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}
