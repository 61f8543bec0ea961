//! Cart domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vastra_core::{CartItemId, Money, ProductId, UserId, VariantId};

use super::product::{Product, ProductVariant};

/// A cart line joined with its current product and variant snapshots.
///
/// Cart reads always embed the catalog rows, so displayed prices reflect
/// current catalog data (unlike order snapshots, which freeze at creation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    /// Always >= 1; a zero quantity is expressed by deleting the line.
    pub quantity: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub product: Product,
    pub variant: ProductVariant,
}

impl CartItem {
    /// The current effective unit price of this line.
    #[must_use]
    pub fn unit_price(&self) -> Money {
        self.product.unit_price(&self.variant)
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price() * self.quantity
    }
}

/// Request record for adding a line to the cart.
///
/// Conflict resolution on (user, variant) increments the stored quantity
/// instead of creating a duplicate row.
#[derive(Debug, Clone, Serialize)]
pub struct NewCartLine {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub quantity: u32,
}

/// Aggregated cart figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartTotals {
    /// Σ line totals at current catalog prices.
    pub subtotal: Money,
    /// Σ quantities across lines.
    pub item_count: u32,
}
