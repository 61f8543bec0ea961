//! Unified error type for library consumers.
//!
//! Each service keeps its own error enum; this aggregate exists for callers
//! that funnel every storefront operation through one `Result` type.

use thiserror::Error;

use crate::backend::{AuthError, BackendError};
use crate::config::ConfigError;
use crate::identity::CacheError;
use crate::services::{AddressError, CartError, CheckoutError, DashboardError};

/// Any storefront error.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading failed.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Authentication failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// A cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Order placement failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// An address operation failed.
    #[error("Address error: {0}")]
    Address(#[from] AddressError),

    /// A dashboard read failed.
    #[error("Dashboard error: {0}")]
    Dashboard(#[from] DashboardError),

    /// The persisted session record failed.
    #[error("Session cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Result type alias for [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
