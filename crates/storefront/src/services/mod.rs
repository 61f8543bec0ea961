//! Storefront services.
//!
//! Each service is a thin handle over the shared backend clients and the
//! identity store; construction is cheap and clones are shallow.

pub mod addresses;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod dashboard;
pub mod identity;

pub use addresses::{AddressBook, AddressError};
pub use cart::{CartError, CartService};
pub use catalog::Catalog;
pub use checkout::{CheckoutError, CheckoutService};
pub use dashboard::{Dashboard, DashboardError};
pub use identity::IdentityService;
