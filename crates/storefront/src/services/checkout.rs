//! Order placement engine.
//!
//! Drives one order attempt through validate → price → persist header →
//! persist items → adjust stock. The three writes are not wrapped in a
//! backend transaction: a failed items insert triggers a best-effort
//! compensating delete of the header, and stock-adjustment failures are
//! logged and swallowed - a successfully recorded order never fails on
//! inventory.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use thiserror::Error;
use tracing::instrument;

use vastra_core::{Money, OrderStatus, PaymentStatus, ProductId, UserId, VariantId};

use crate::backend::{BackendError, DataService};
use crate::identity::IdentityStore;
use crate::models::{
    Address, AddressSnapshot, CartItem, NewOrder, NewOrderItem, Order, PaymentMethod,
};

/// Orders above this subtotal ship free.
const FREE_SHIPPING_THRESHOLD: i64 = 999;

/// Flat shipping fee below the free-shipping threshold.
const FLAT_SHIPPING_FEE: i64 = 99;

/// Length of the random order-number suffix.
const ORDER_SUFFIX_LEN: usize = 5;

const SUFFIX_CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Errors surfaced by order placement.
///
/// Mid-workflow persistence failures are deliberately not distinguished
/// from one another: callers see the same generic `Persistence` error
/// whether the header, items, or a pre-write read failed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No identity present; nothing was sent to the backend.
    #[error("sign in to place an order")]
    NotAuthenticated,

    /// The attempt carried no line items.
    #[error("cannot place an order with no items")]
    EmptyOrder,

    /// The user has no address flagged default.
    #[error("add a default delivery address first")]
    NoDefaultAddress,

    /// The product no longer exists or is inactive.
    #[error("product not found")]
    ProductNotFound,

    /// The requested variant does not belong to the product.
    #[error("product variant not found")]
    VariantNotFound,

    /// The variant has fewer units on hand than requested.
    #[error("not enough stock available")]
    InsufficientStock,

    /// A write or pre-write read failed.
    #[error("failed to place order")]
    Persistence(#[source] BackendError),
}

/// One priced line of an order attempt.
#[derive(Debug, Clone)]
struct PricedLine {
    product_id: ProductId,
    variant_id: VariantId,
    quantity: u32,
    unit_price: Money,
}

impl PricedLine {
    fn total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// The order placement engine.
#[derive(Clone)]
pub struct CheckoutService {
    data: Arc<dyn DataService>,
    identity: IdentityStore,
}

impl CheckoutService {
    /// Create a new checkout service.
    #[must_use]
    pub fn new(data: Arc<dyn DataService>, identity: IdentityStore) -> Self {
        Self { data, identity }
    }

    fn require_user(&self) -> Result<UserId, CheckoutError> {
        self.identity
            .current()
            .map(|identity| identity.user_id)
            .ok_or(CheckoutError::NotAuthenticated)
    }

    /// Place an order for the given cart lines, then clear the cart.
    ///
    /// Prices are frozen into the order from the lines' current catalog
    /// data. A failure to clear the cart after the order is recorded is
    /// logged, not surfaced.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`]; validation failures happen before any
    /// write.
    #[instrument(skip(self, items, address), fields(lines = items.len()))]
    pub async fn checkout_cart(
        &self,
        items: &[CartItem],
        address: &Address,
        payment_method: PaymentMethod,
    ) -> Result<Order, CheckoutError> {
        let user = self.require_user()?;

        let lines: Vec<PricedLine> = items
            .iter()
            .map(|item| PricedLine {
                product_id: item.product_id.clone(),
                variant_id: item.variant_id.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price(),
            })
            .collect();

        let order = self.process(&user, &lines, address, payment_method).await?;

        if let Err(e) = self.data.clear_cart(&user).await {
            tracing::warn!(
                order_number = %order.order_number,
                error = %e,
                "Order recorded but cart clear failed"
            );
        }

        Ok(order)
    }

    /// Express single-item checkout against the user's default address.
    ///
    /// Bypasses the stored cart entirely: re-fetches the product, resolves
    /// the variant, checks stock, and drives a synthesized single line
    /// through the same placement sequence with payment fixed to cash on
    /// delivery. Rejections (no address, unknown product/variant, not
    /// enough stock) happen before any write.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`].
    #[instrument(skip(self), fields(product = %product, variant = %variant, quantity))]
    pub async fn quick_purchase(
        &self,
        product: &ProductId,
        variant: &VariantId,
        quantity: u32,
    ) -> Result<Order, CheckoutError> {
        let user = self.require_user()?;
        let quantity = quantity.max(1);

        let address = self
            .data
            .default_address(&user)
            .await
            .map_err(CheckoutError::Persistence)?
            .ok_or(CheckoutError::NoDefaultAddress)?;

        let catalog_product = self
            .data
            .fetch_product(product)
            .await
            .map_err(CheckoutError::Persistence)?
            .ok_or(CheckoutError::ProductNotFound)?;

        let catalog_variant = catalog_product
            .variant(variant)
            .ok_or(CheckoutError::VariantNotFound)?;

        if catalog_variant.stock_quantity < quantity {
            return Err(CheckoutError::InsufficientStock);
        }

        let line = PricedLine {
            product_id: product.clone(),
            variant_id: variant.clone(),
            quantity,
            unit_price: catalog_product.unit_price(catalog_variant),
        };

        self.process(&user, &[line], &address, PaymentMethod::CashOnDelivery)
            .await
    }

    // =========================================================================
    // Placement sequence
    // =========================================================================

    /// Validate → price → persist header → persist items → adjust stock.
    async fn process(
        &self,
        user: &UserId,
        lines: &[PricedLine],
        address: &Address,
        payment_method: PaymentMethod,
    ) -> Result<Order, CheckoutError> {
        if lines.is_empty() {
            return Err(CheckoutError::EmptyOrder);
        }

        let subtotal: Money = lines.iter().map(PricedLine::total).sum();
        let shipping_amount = shipping_for(subtotal);
        let total_amount = subtotal + shipping_amount;

        let new_order = NewOrder {
            user_id: user.clone(),
            order_number: generate_order_number(),
            status: OrderStatus::Pending,
            total_amount,
            discount_amount: Money::ZERO,
            shipping_amount,
            payment_status: PaymentStatus::Pending,
            payment_method,
            shipping_address: AddressSnapshot::from(address),
        };

        let order = self
            .data
            .insert_order(&new_order)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Order header insert failed");
                CheckoutError::Persistence(e)
            })?;

        let items: Vec<NewOrderItem> = lines
            .iter()
            .map(|line| NewOrderItem {
                order_id: order.id.clone(),
                product_id: line.product_id.clone(),
                variant_id: line.variant_id.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                total_price: line.total(),
            })
            .collect();

        if let Err(e) = self.data.insert_order_items(&items).await {
            tracing::error!(
                order_number = %order.order_number,
                error = %e,
                "Order items insert failed; deleting header"
            );
            // Best-effort compensation; a leftover header is logged, not fatal.
            if let Err(del) = self.data.delete_order(&order.id).await {
                tracing::error!(
                    order_number = %order.order_number,
                    error = %del,
                    "Compensating order delete failed; orphan header remains"
                );
            }
            return Err(CheckoutError::Persistence(e));
        }

        // Inventory adjustment never fails a recorded order.
        for line in lines {
            match self.data.adjust_stock(&line.variant_id, line.quantity).await {
                Ok(adjustment) if adjustment.clamped => {
                    tracing::warn!(
                        order_number = %order.order_number,
                        variant = %line.variant_id,
                        requested = line.quantity,
                        "Stock decrement clamped at zero; oversold"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(
                        order_number = %order.order_number,
                        variant = %line.variant_id,
                        error = %e,
                        "Stock adjustment failed"
                    );
                }
            }
        }

        tracing::info!(
            order_number = %order.order_number,
            total = %order.total_amount,
            "Order placed"
        );
        Ok(order)
    }
}

/// Shipping charge for a subtotal: free above the threshold, flat below.
fn shipping_for(subtotal: Money) -> Money {
    if subtotal > Money::from_major(FREE_SHIPPING_THRESHOLD) {
        Money::ZERO
    } else {
        Money::from_major(FLAT_SHIPPING_FEE)
    }
}

/// Generate a human-readable order number.
///
/// Timestamp plus a short random suffix; collision-resistant under low
/// contention, with the backend's unique constraint as the arbiter.
fn generate_order_number() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ORDER_SUFFIX_LEN)
        .map(|_| {
            let idx = rng.random_range(0..SUFFIX_CHARSET.len());
            char::from(SUFFIX_CHARSET[idx])
        })
        .collect();
    format!("ORD{}{suffix}", Utc::now().timestamp_millis())
}
