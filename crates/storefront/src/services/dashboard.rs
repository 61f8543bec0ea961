//! Admin dashboard reads.

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use crate::backend::{BackendError, DataService, LowStockVariant, StoreStats};
use crate::identity::IdentityStore;
use crate::models::Order;

/// Variants with stock below this count appear in the low-stock feed.
pub const LOW_STOCK_THRESHOLD: u32 = 10;

/// Errors surfaced by dashboard reads.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The current identity is missing or not an admin.
    #[error("admin access required")]
    NotAuthorized,

    /// A backend call failed.
    #[error("dashboard read failed: {0}")]
    Backend(#[from] BackendError),
}

/// Store-wide reads for the admin surface.
#[derive(Clone)]
pub struct Dashboard {
    data: Arc<dyn DataService>,
    identity: IdentityStore,
}

impl Dashboard {
    /// Create a new dashboard.
    #[must_use]
    pub fn new(data: Arc<dyn DataService>, identity: IdentityStore) -> Self {
        Self { data, identity }
    }

    fn require_admin(&self) -> Result<(), DashboardError> {
        match self.identity.current() {
            Some(identity) if identity.is_admin => Ok(()),
            _ => Err(DashboardError::NotAuthorized),
        }
    }

    /// Paid revenue and row counts.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::NotAuthorized` unless the current identity
    /// is an admin, or `DashboardError::Backend` if a read fails.
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<StoreStats, DashboardError> {
        self.require_admin()?;
        Ok(self.data.store_stats().await?)
    }

    /// Most recent orders across the store.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::NotAuthorized` unless the current identity
    /// is an admin, or `DashboardError::Backend` if the read fails.
    pub async fn recent_orders(&self, limit: u32) -> Result<Vec<Order>, DashboardError> {
        self.require_admin()?;
        Ok(self.data.recent_orders(limit).await?)
    }

    /// Active variants running low on stock.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::NotAuthorized` unless the current identity
    /// is an admin, or `DashboardError::Backend` if the read fails.
    pub async fn low_stock(&self, limit: u32) -> Result<Vec<LowStockVariant>, DashboardError> {
        self.require_admin()?;
        Ok(self
            .data
            .low_stock_variants(LOW_STOCK_THRESHOLD, limit)
            .await?)
    }
}
