//! The typed table contract consumed by the storefront services.

use async_trait::async_trait;
use serde::Deserialize;

use vastra_core::{AddressId, CartItemId, Money, OrderId, ProductId, UserId, VariantId};

use crate::models::{
    Address, AddressDraft, CartItem, Category, NewAddress, NewCartLine, NewOrder, NewOrderItem,
    NewProfile, Order, Product, ProductQuery, UserProfile,
};

use super::BackendError;

/// Result of an atomic stock decrement.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StockAdjustment {
    /// Stock remaining after the decrement.
    pub remaining: u32,
    /// True when the requested quantity exceeded the stock on hand and the
    /// decrement was floored at zero.
    pub clamped: bool,
}

/// Store-wide aggregates for the dashboard.
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    /// Σ `total_amount` over paid orders.
    pub total_revenue: Money,
    pub total_orders: u64,
    pub total_customers: u64,
    pub total_products: u64,
}

/// A variant running low on stock, joined with its product.
#[derive(Debug, Clone)]
pub struct LowStockVariant {
    pub variant_id: VariantId,
    pub product_name: String,
    pub size: String,
    pub color: String,
    pub stock_quantity: u32,
    pub image: Option<String>,
}

/// Typed operations against the hosted table API.
///
/// Every call is independently fallible and independently awaited; no method
/// retries, and no two methods share a transaction.
#[async_trait]
pub trait DataService: Send + Sync {
    // =========================================================================
    // Profiles
    // =========================================================================

    /// Fetch a user profile by id.
    async fn fetch_profile(&self, user: &UserId) -> Result<Option<UserProfile>, BackendError>;

    /// Insert or update a user profile.
    async fn upsert_profile(&self, profile: &NewProfile) -> Result<(), BackendError>;

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Fetch an active product with its variants and category embedded.
    async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, BackendError>;

    /// Fetch an active product by slug, variants and category embedded.
    async fn fetch_product_by_slug(&self, slug: &str) -> Result<Option<Product>, BackendError>;

    /// List active products matching the query.
    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, BackendError>;

    /// List active categories, name-sorted.
    async fn list_categories(&self) -> Result<Vec<Category>, BackendError>;

    // =========================================================================
    // Cart
    // =========================================================================

    /// Full joined cart read for a user, newest lines first.
    async fn list_cart(&self, user: &UserId) -> Result<Vec<CartItem>, BackendError>;

    /// Insert a cart line, incrementing quantity on (user, variant) conflict.
    async fn add_cart_line(&self, line: &NewCartLine) -> Result<(), BackendError>;

    /// Set the quantity of an existing cart line.
    async fn set_cart_line_quantity(
        &self,
        item: &CartItemId,
        quantity: u32,
    ) -> Result<(), BackendError>;

    /// Delete one cart line.
    async fn delete_cart_line(&self, item: &CartItemId) -> Result<(), BackendError>;

    /// Delete all cart lines for a user.
    async fn clear_cart(&self, user: &UserId) -> Result<(), BackendError>;

    // =========================================================================
    // Addresses
    // =========================================================================

    /// All addresses for a user, defaults first.
    async fn list_addresses(&self, user: &UserId) -> Result<Vec<Address>, BackendError>;

    /// The user's flagged default address, if any.
    async fn default_address(&self, user: &UserId) -> Result<Option<Address>, BackendError>;

    /// Insert an address and return the stored row.
    async fn insert_address(&self, address: &NewAddress) -> Result<Address, BackendError>;

    /// Replace the user-supplied fields of an address.
    async fn update_address(
        &self,
        id: &AddressId,
        draft: &AddressDraft,
    ) -> Result<(), BackendError>;

    /// Delete an address.
    async fn delete_address(&self, id: &AddressId) -> Result<(), BackendError>;

    /// Clear `is_default` on every address of a user.
    async fn clear_default_flags(&self, user: &UserId) -> Result<(), BackendError>;

    /// Set `is_default` on one address.
    async fn mark_default(&self, id: &AddressId) -> Result<(), BackendError>;

    // =========================================================================
    // Orders
    // =========================================================================

    /// Insert an order header and return the stored row.
    async fn insert_order(&self, order: &NewOrder) -> Result<Order, BackendError>;

    /// Insert the line items of an order.
    async fn insert_order_items(&self, items: &[NewOrderItem]) -> Result<(), BackendError>;

    /// Delete an order header (compensation for a failed items insert).
    async fn delete_order(&self, id: &OrderId) -> Result<(), BackendError>;

    /// All orders of a user, newest first.
    async fn list_orders(&self, user: &UserId) -> Result<Vec<Order>, BackendError>;

    /// Most recent orders across the store, newest first.
    async fn recent_orders(&self, limit: u32) -> Result<Vec<Order>, BackendError>;

    // =========================================================================
    // Inventory
    // =========================================================================

    /// Atomically decrement a variant's stock, floored at zero.
    ///
    /// Executed server-side in a single statement; never a read-then-write.
    async fn adjust_stock(
        &self,
        variant: &VariantId,
        quantity: u32,
    ) -> Result<StockAdjustment, BackendError>;

    // =========================================================================
    // Dashboard
    // =========================================================================

    /// Store-wide aggregates (paid revenue, row counts).
    async fn store_stats(&self) -> Result<StoreStats, BackendError>;

    /// Active variants with stock below `threshold`, lowest first.
    async fn low_stock_variants(
        &self,
        threshold: u32,
        limit: u32,
    ) -> Result<Vec<LowStockVariant>, BackendError>;
}
