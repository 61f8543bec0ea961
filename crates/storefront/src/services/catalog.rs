//! Catalog reads.
//!
//! Pure passthrough queries; the catalog is read-only from this crate's
//! perspective and no identity is required to browse it.

use std::sync::Arc;

use tracing::instrument;

use vastra_core::ProductId;

use crate::backend::{BackendError, DataService};
use crate::models::{Category, Product, ProductQuery};

/// Read access to products and categories.
#[derive(Clone)]
pub struct Catalog {
    data: Arc<dyn DataService>,
}

impl Catalog {
    /// Create a new catalog.
    #[must_use]
    pub fn new(data: Arc<dyn DataService>) -> Self {
        Self { data }
    }

    /// Fetch an active product by id, variants embedded.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the read fails.
    pub async fn product(&self, id: &ProductId) -> Result<Option<Product>, BackendError> {
        self.data.fetch_product(id).await
    }

    /// Fetch an active product by its URL slug, variants embedded.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the read fails.
    #[instrument(skip(self))]
    pub async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, BackendError> {
        self.data.fetch_product_by_slug(slug).await
    }

    /// List active products matching the query.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the read fails.
    pub async fn products(&self, query: &ProductQuery) -> Result<Vec<Product>, BackendError> {
        self.data.list_products(query).await
    }

    /// List active categories, name-sorted.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the read fails.
    pub async fn categories(&self) -> Result<Vec<Category>, BackendError> {
        self.data.list_categories().await
    }
}
