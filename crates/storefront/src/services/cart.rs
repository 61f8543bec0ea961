//! Cart aggregate.
//!
//! Every mutation re-fetches the full joined cart rather than patching local
//! state, so displayed prices always reflect current catalog data (unlike
//! order snapshots, which freeze at creation time).

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use vastra_core::{CartItemId, ProductId, UserId, VariantId};

use crate::backend::{BackendError, DataService};
use crate::identity::IdentityStore;
use crate::models::{CartItem, CartTotals, NewCartLine};

/// Errors surfaced by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// No identity present; nothing was sent to the backend.
    #[error("sign in to manage your cart")]
    NotAuthenticated,

    /// A backend call failed.
    #[error("cart operation failed: {0}")]
    Backend(#[from] BackendError),
}

/// The authenticated user's pending line items.
#[derive(Clone)]
pub struct CartService {
    data: Arc<dyn DataService>,
    identity: IdentityStore,
}

impl CartService {
    /// Create a new cart service.
    #[must_use]
    pub fn new(data: Arc<dyn DataService>, identity: IdentityStore) -> Self {
        Self { data, identity }
    }

    fn require_user(&self) -> Result<UserId, CartError> {
        self.identity
            .current()
            .map(|identity| identity.user_id)
            .ok_or(CartError::NotAuthenticated)
    }

    /// Fetch the current cart, newest lines first.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotAuthenticated` with no identity present, or
    /// `CartError::Backend` if the read fails.
    #[instrument(skip(self))]
    pub async fn items(&self) -> Result<Vec<CartItem>, CartError> {
        let user = self.require_user()?;
        Ok(self.data.list_cart(&user).await?)
    }

    /// Add a variant to the cart.
    ///
    /// Upserts on (user, variant): a repeated add increases the stored
    /// quantity instead of creating a duplicate row. Quantities below 1 are
    /// treated as 1.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotAuthenticated` with no identity present, or
    /// `CartError::Backend` if a remote call fails.
    #[instrument(skip(self), fields(product = %product, variant = %variant, quantity))]
    pub async fn add_item(
        &self,
        product: &ProductId,
        variant: &VariantId,
        quantity: u32,
    ) -> Result<Vec<CartItem>, CartError> {
        let user = self.require_user()?;
        let line = NewCartLine {
            user_id: user.clone(),
            product_id: product.clone(),
            variant_id: variant.clone(),
            quantity: quantity.max(1),
        };
        self.data.add_cart_line(&line).await?;
        Ok(self.data.list_cart(&user).await?)
    }

    /// Set the quantity of a cart line.
    ///
    /// A non-positive quantity is equivalent to removing the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotAuthenticated` with no identity present, or
    /// `CartError::Backend` if a remote call fails.
    #[instrument(skip(self), fields(item = %item, quantity))]
    pub async fn update_quantity(
        &self,
        item: &CartItemId,
        quantity: u32,
    ) -> Result<Vec<CartItem>, CartError> {
        if quantity == 0 {
            return self.remove_item(item).await;
        }
        let user = self.require_user()?;
        self.data.set_cart_line_quantity(item, quantity).await?;
        Ok(self.data.list_cart(&user).await?)
    }

    /// Remove one line from the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotAuthenticated` with no identity present, or
    /// `CartError::Backend` if a remote call fails.
    #[instrument(skip(self), fields(item = %item))]
    pub async fn remove_item(&self, item: &CartItemId) -> Result<Vec<CartItem>, CartError> {
        let user = self.require_user()?;
        self.data.delete_cart_line(item).await?;
        Ok(self.data.list_cart(&user).await?)
    }

    /// Delete every line in the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotAuthenticated` with no identity present, or
    /// `CartError::Backend` if the delete fails.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), CartError> {
        let user = self.require_user()?;
        Ok(self.data.clear_cart(&user).await?)
    }

    /// Aggregate figures for a set of cart lines.
    #[must_use]
    pub fn totals(items: &[CartItem]) -> CartTotals {
        CartTotals {
            subtotal: items.iter().map(CartItem::line_total).sum(),
            item_count: items.iter().map(|item| item.quantity).sum(),
        }
    }
}
