//! Demo-account resolver.
//!
//! Two fixed phone numbers and two fixed email/password pairs act as
//! permanent demo accounts. Verifying against them bypasses the hosted auth
//! subsystem entirely and synthesizes a local identity; every other
//! credential is forwarded to the auth subsystem unmodified.

use vastra_core::{Email, Phone, UserId};

use super::{Identity, IdentityRealm};

/// The one-time code accepted for both demo phone numbers.
pub const DEMO_OTP: &str = "123456";

/// Demo customer phone number.
pub const DEMO_CUSTOMER_PHONE: &str = "+919876543210";
/// Demo admin phone number.
pub const DEMO_ADMIN_PHONE: &str = "+919876543211";

/// Demo customer email/password pair.
pub const DEMO_CUSTOMER_EMAIL: &str = "customer@demo.vastra.shop";
const DEMO_CUSTOMER_PASSWORD: &str = "demo1234";

/// Demo admin email/password pair.
pub const DEMO_ADMIN_EMAIL: &str = "admin@demo.vastra.shop";
const DEMO_ADMIN_PASSWORD: &str = "admin1234";

/// One of the fixed demo accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoAccount {
    user_id: &'static str,
    default_name: &'static str,
    phone: &'static str,
    email: &'static str,
    is_admin: bool,
}

const DEMO_CUSTOMER: DemoAccount = DemoAccount {
    user_id: "demo-customer-id",
    default_name: "Demo Customer",
    phone: DEMO_CUSTOMER_PHONE,
    email: DEMO_CUSTOMER_EMAIL,
    is_admin: false,
};

const DEMO_ADMIN: DemoAccount = DemoAccount {
    user_id: "demo-admin-id",
    default_name: "Demo Admin",
    phone: DEMO_ADMIN_PHONE,
    email: DEMO_ADMIN_EMAIL,
    is_admin: true,
};

impl DemoAccount {
    /// The fixed user id of this account.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        UserId::new(self.user_id)
    }

    /// Whether this is the admin demo account.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// The display name used when the caller supplies none.
    #[must_use]
    pub const fn default_name(&self) -> &'static str {
        self.default_name
    }

    /// Synthesize the local identity for this account.
    #[must_use]
    pub fn identity(&self, display_name: Option<&str>) -> Identity {
        Identity {
            user_id: self.user_id(),
            phone: Phone::parse(self.phone).ok(),
            email: Email::parse(self.email).ok(),
            display_name: Some(display_name.unwrap_or(self.default_name).to_owned()),
            is_admin: self.is_admin,
            realm: IdentityRealm::Demo,
        }
    }
}

/// Whether a phone number belongs to a demo account.
#[must_use]
pub fn is_demo_phone(phone: &Phone) -> bool {
    phone.as_str() == DEMO_CUSTOMER_PHONE || phone.as_str() == DEMO_ADMIN_PHONE
}

/// Resolve a phone/code pair against the demo accounts.
///
/// `None` means the pair is not a demo bypass and must be forwarded to the
/// auth subsystem (a demo phone with a wrong code is forwarded too, and will
/// fail there).
#[must_use]
pub fn resolve_otp(phone: &Phone, code: &str) -> Option<DemoAccount> {
    if code != DEMO_OTP {
        return None;
    }
    match phone.as_str() {
        DEMO_CUSTOMER_PHONE => Some(DEMO_CUSTOMER),
        DEMO_ADMIN_PHONE => Some(DEMO_ADMIN),
        _ => None,
    }
}

/// Resolve an email/password pair against the demo accounts.
#[must_use]
pub fn resolve_password(email: &Email, password: &str) -> Option<DemoAccount> {
    match (email.as_str(), password) {
        (DEMO_CUSTOMER_EMAIL, DEMO_CUSTOMER_PASSWORD) => Some(DEMO_CUSTOMER),
        (DEMO_ADMIN_EMAIL, DEMO_ADMIN_PASSWORD) => Some(DEMO_ADMIN),
        _ => None,
    }
}
