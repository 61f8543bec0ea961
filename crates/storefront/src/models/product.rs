//! Catalog domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use vastra_core::{CategoryId, Money, ProductId, VariantId};

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// URL-stable slug.
    pub slug: String,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub is_active: bool,
}

/// A catalog product.
///
/// Read-only from the checkout engine's perspective; only variant stock is
/// ever mutated by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// URL-stable slug, unique across products.
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category_id: CategoryId,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    /// Base price before discount, in rupees.
    pub base_price: Money,
    /// Discount in percent, 0-100.
    pub discount_percentage: Decimal,
    pub is_featured: bool,
    pub is_active: bool,
    /// Ordered image URLs, first is the primary image.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Embedded on joined reads; empty when the read did not ask for them.
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    /// Embedded on joined reads.
    #[serde(default)]
    pub category: Option<Category>,
}

impl Product {
    /// The effective unit price of one variant of this product.
    ///
    /// `base_price × (1 − discount/100) + additional_price`, in exact
    /// decimal arithmetic. This is the single pricing formula used by both
    /// the cart and the order snapshot.
    #[must_use]
    pub fn unit_price(&self, variant: &ProductVariant) -> Money {
        let factor = (Decimal::ONE_HUNDRED - self.discount_percentage) / Decimal::ONE_HUNDRED;
        Money::new(self.base_price.amount() * factor) + variant.additional_price
    }

    /// Find an embedded variant by id.
    #[must_use]
    pub fn variant(&self, id: &VariantId) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| &v.id == id)
    }
}

/// A size/color instance of a product; the unit inventory is tracked against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub size: String,
    pub color: String,
    #[serde(default)]
    pub color_hex: Option<String>,
    /// On-hand stock, never negative.
    pub stock_quantity: u32,
    /// Price delta added on top of the discounted base price.
    pub additional_price: Money,
    pub is_active: bool,
}

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    /// Newest first.
    #[default]
    Newest,
    /// Cheapest first.
    PriceAsc,
    /// Most expensive first.
    PriceDesc,
    /// Alphabetical by name.
    Name,
}

/// Filters for a product listing read.
///
/// Inactive products are always excluded.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub category: Option<CategoryId>,
    pub featured_only: bool,
    pub sort: ProductSort,
}
