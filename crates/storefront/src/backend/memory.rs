//! In-memory backend for tests and local development.
//!
//! State lives behind a single mutex, so every operation is atomic the way a
//! single-statement call to the hosted backend is. Failure-injection
//! switches let tests exercise the partial-failure paths of the order
//! placement sequence.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use vastra_core::{
    AddressId, CartItemId, Email, OrderId, OrderItemId, Phone, ProductId, UserId, VariantId,
};

use crate::models::{
    Address, AddressDraft, CartItem, Category, NewAddress, NewCartLine, NewOrder, NewOrderItem,
    NewProfile, Order, OrderItem, Product, ProductQuery, ProductSort, UserProfile,
};

use super::auth::{AuthApi, AuthError, AuthSession, AuthUser};
use super::service::{DataService, LowStockVariant, StockAdjustment, StoreStats};
use super::{ApiError, BackendError};

fn injected(step: &str) -> BackendError {
    BackendError::Api(ApiError::new(500, format!("injected {step} failure")))
}

fn row_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// MemoryDataService
// =============================================================================

#[derive(Debug, Clone)]
struct CartRow {
    id: CartItemId,
    user_id: UserId,
    product_id: ProductId,
    variant_id: VariantId,
    quantity: u32,
    position: u64,
}

#[derive(Debug, Default)]
struct MemoryState {
    profiles: HashMap<String, UserProfile>,
    categories: Vec<Category>,
    products: Vec<Product>,
    cart: Vec<CartRow>,
    addresses: Vec<Address>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    next_position: u64,
    fail_profile_fetch: bool,
    fail_order_insert: bool,
    fail_order_items_insert: bool,
    fail_order_delete: bool,
    fail_stock_adjust: bool,
}

/// In-memory table backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataService {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDataService {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    /// Seed a category.
    pub fn seed_category(&self, category: Category) {
        self.lock().categories.push(category);
    }

    /// Seed a product (variants embedded).
    pub fn seed_product(&self, product: Product) {
        self.lock().products.push(product);
    }

    /// Seed an address.
    pub fn seed_address(&self, address: Address) {
        self.lock().addresses.push(address);
    }

    /// Seed a user profile.
    pub fn seed_profile(&self, profile: UserProfile) {
        let mut state = self.lock();
        state.profiles.insert(profile.id.to_string(), profile);
    }

    /// Change a product's base price in place (simulates a catalog edit).
    pub fn set_product_price(&self, product: &ProductId, price: vastra_core::Money) {
        let mut state = self.lock();
        if let Some(found) = state.products.iter_mut().find(|p| &p.id == product) {
            found.base_price = price;
        }
    }

    // =========================================================================
    // Failure injection
    // =========================================================================

    /// Fail every subsequent profile fetch.
    pub fn set_fail_profile_fetch(&self, fail: bool) {
        self.lock().fail_profile_fetch = fail;
    }

    /// Fail every subsequent order-header insert.
    pub fn set_fail_order_insert(&self, fail: bool) {
        self.lock().fail_order_insert = fail;
    }

    /// Fail every subsequent order-items insert.
    pub fn set_fail_order_items_insert(&self, fail: bool) {
        self.lock().fail_order_items_insert = fail;
    }

    /// Fail every subsequent order delete (blocks compensation).
    pub fn set_fail_order_delete(&self, fail: bool) {
        self.lock().fail_order_delete = fail;
    }

    /// Fail every subsequent stock adjustment.
    pub fn set_fail_stock_adjust(&self, fail: bool) {
        self.lock().fail_stock_adjust = fail;
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// All stored order headers.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.lock().orders.clone()
    }

    /// Line items of one order.
    #[must_use]
    pub fn order_items(&self, order: &OrderId) -> Vec<OrderItem> {
        self.lock()
            .order_items
            .iter()
            .filter(|item| &item.order_id == order)
            .cloned()
            .collect()
    }

    /// Current stock of a variant.
    #[must_use]
    pub fn stock_of(&self, variant: &VariantId) -> Option<u32> {
        self.lock()
            .products
            .iter()
            .flat_map(|p| &p.variants)
            .find(|v| &v.id == variant)
            .map(|v| v.stock_quantity)
    }

    /// Number of cart rows stored for a user.
    #[must_use]
    pub fn cart_row_count(&self, user: &UserId) -> usize {
        self.lock()
            .cart
            .iter()
            .filter(|row| &row.user_id == user)
            .count()
    }

    /// Number of addresses flagged default for a user.
    #[must_use]
    pub fn default_flag_count(&self, user: &UserId) -> usize {
        self.lock()
            .addresses
            .iter()
            .filter(|a| &a.user_id == user && a.is_default)
            .count()
    }
}

#[async_trait]
impl DataService for MemoryDataService {
    async fn fetch_profile(&self, user: &UserId) -> Result<Option<UserProfile>, BackendError> {
        let state = self.lock();
        if state.fail_profile_fetch {
            return Err(injected("profile fetch"));
        }
        Ok(state.profiles.get(user.as_str()).cloned())
    }

    async fn upsert_profile(&self, profile: &NewProfile) -> Result<(), BackendError> {
        let mut state = self.lock();
        let key = profile.id.to_string();
        if let Some(existing) = state.profiles.get_mut(&key) {
            if profile.full_name.is_some() {
                existing.full_name.clone_from(&profile.full_name);
            }
            if profile.phone.is_some() {
                existing.phone.clone_from(&profile.phone);
            }
            if let Some(is_admin) = profile.is_admin {
                existing.is_admin = is_admin;
            }
        } else {
            state.profiles.insert(
                key,
                UserProfile {
                    id: profile.id.clone(),
                    full_name: profile.full_name.clone(),
                    phone: profile.phone.clone(),
                    is_admin: profile.is_admin.unwrap_or(false),
                },
            );
        }
        Ok(())
    }

    async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, BackendError> {
        Ok(self
            .lock()
            .products
            .iter()
            .find(|p| &p.id == id && p.is_active)
            .cloned())
    }

    async fn fetch_product_by_slug(&self, slug: &str) -> Result<Option<Product>, BackendError> {
        Ok(self
            .lock()
            .products
            .iter()
            .find(|p| p.slug == slug && p.is_active)
            .cloned())
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, BackendError> {
        let state = self.lock();
        let mut products: Vec<Product> = state
            .products
            .iter()
            .filter(|p| p.is_active)
            .filter(|p| query.category.as_ref().is_none_or(|c| &p.category_id == c))
            .filter(|p| !query.featured_only || p.is_featured)
            .cloned()
            .collect();

        match query.sort {
            ProductSort::Newest => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            ProductSort::PriceAsc => products.sort_by(|a, b| a.base_price.cmp(&b.base_price)),
            ProductSort::PriceDesc => products.sort_by(|a, b| b.base_price.cmp(&a.base_price)),
            ProductSort::Name => products.sort_by(|a, b| a.name.cmp(&b.name)),
        }

        Ok(products)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        let state = self.lock();
        let mut categories: Vec<Category> = state
            .categories
            .iter()
            .filter(|c| c.is_active)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn list_cart(&self, user: &UserId) -> Result<Vec<CartItem>, BackendError> {
        let state = self.lock();
        let mut rows: Vec<&CartRow> = state
            .cart
            .iter()
            .filter(|row| &row.user_id == user)
            .collect();
        rows.sort_by(|a, b| b.position.cmp(&a.position));

        // Joined read; rows whose catalog data is gone are dropped, the way
        // an inner-join read would drop them.
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let product = state.products.iter().find(|p| p.id == row.product_id)?;
                let variant = product.variant(&row.variant_id)?;
                Some(CartItem {
                    id: row.id.clone(),
                    user_id: row.user_id.clone(),
                    product_id: row.product_id.clone(),
                    variant_id: row.variant_id.clone(),
                    quantity: row.quantity,
                    created_at: None,
                    updated_at: None,
                    product: product.clone(),
                    variant: variant.clone(),
                })
            })
            .collect())
    }

    async fn add_cart_line(&self, line: &NewCartLine) -> Result<(), BackendError> {
        let mut state = self.lock();
        if let Some(existing) = state
            .cart
            .iter_mut()
            .find(|row| row.user_id == line.user_id && row.variant_id == line.variant_id)
        {
            existing.quantity += line.quantity;
            return Ok(());
        }
        let position = state.next_position;
        state.next_position += 1;
        state.cart.push(CartRow {
            id: CartItemId::new(row_id()),
            user_id: line.user_id.clone(),
            product_id: line.product_id.clone(),
            variant_id: line.variant_id.clone(),
            quantity: line.quantity,
            position,
        });
        Ok(())
    }

    async fn set_cart_line_quantity(
        &self,
        item: &CartItemId,
        quantity: u32,
    ) -> Result<(), BackendError> {
        let mut state = self.lock();
        if let Some(row) = state.cart.iter_mut().find(|row| &row.id == item) {
            row.quantity = quantity;
        }
        Ok(())
    }

    async fn delete_cart_line(&self, item: &CartItemId) -> Result<(), BackendError> {
        self.lock().cart.retain(|row| &row.id != item);
        Ok(())
    }

    async fn clear_cart(&self, user: &UserId) -> Result<(), BackendError> {
        self.lock().cart.retain(|row| &row.user_id != user);
        Ok(())
    }

    async fn list_addresses(&self, user: &UserId) -> Result<Vec<Address>, BackendError> {
        let state = self.lock();
        let mut addresses: Vec<Address> = state
            .addresses
            .iter()
            .filter(|a| &a.user_id == user)
            .cloned()
            .collect();
        addresses.sort_by(|a, b| b.is_default.cmp(&a.is_default));
        Ok(addresses)
    }

    async fn default_address(&self, user: &UserId) -> Result<Option<Address>, BackendError> {
        Ok(self
            .lock()
            .addresses
            .iter()
            .find(|a| &a.user_id == user && a.is_default)
            .cloned())
    }

    async fn insert_address(&self, address: &NewAddress) -> Result<Address, BackendError> {
        let stored = Address {
            id: AddressId::new(row_id()),
            user_id: address.user_id.clone(),
            kind: address.draft.kind,
            name: address.draft.name.clone(),
            phone: address.draft.phone.clone(),
            address_line1: address.draft.address_line1.clone(),
            address_line2: address.draft.address_line2.clone(),
            city: address.draft.city.clone(),
            state: address.draft.state.clone(),
            postal_code: address.draft.postal_code.clone(),
            country: address.draft.country.clone(),
            is_default: address.draft.is_default,
            created_at: Some(Utc::now()),
        };
        self.lock().addresses.push(stored.clone());
        Ok(stored)
    }

    async fn update_address(
        &self,
        id: &AddressId,
        draft: &AddressDraft,
    ) -> Result<(), BackendError> {
        let mut state = self.lock();
        if let Some(address) = state.addresses.iter_mut().find(|a| &a.id == id) {
            address.kind = draft.kind;
            address.name.clone_from(&draft.name);
            address.phone.clone_from(&draft.phone);
            address.address_line1.clone_from(&draft.address_line1);
            address.address_line2.clone_from(&draft.address_line2);
            address.city.clone_from(&draft.city);
            address.state.clone_from(&draft.state);
            address.postal_code.clone_from(&draft.postal_code);
            address.country.clone_from(&draft.country);
            address.is_default = draft.is_default;
        }
        Ok(())
    }

    async fn delete_address(&self, id: &AddressId) -> Result<(), BackendError> {
        self.lock().addresses.retain(|a| &a.id != id);
        Ok(())
    }

    async fn clear_default_flags(&self, user: &UserId) -> Result<(), BackendError> {
        let mut state = self.lock();
        for address in state.addresses.iter_mut().filter(|a| &a.user_id == user) {
            address.is_default = false;
        }
        Ok(())
    }

    async fn mark_default(&self, id: &AddressId) -> Result<(), BackendError> {
        let mut state = self.lock();
        if let Some(address) = state.addresses.iter_mut().find(|a| &a.id == id) {
            address.is_default = true;
        }
        Ok(())
    }

    async fn insert_order(&self, order: &NewOrder) -> Result<Order, BackendError> {
        let mut state = self.lock();
        if state.fail_order_insert {
            return Err(injected("order insert"));
        }
        // order_number carries a unique constraint
        if state
            .orders
            .iter()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(BackendError::Api(ApiError::new(
                409,
                "duplicate key value violates unique constraint \"orders_order_number_key\"",
            )));
        }
        let stored = Order {
            id: OrderId::new(row_id()),
            user_id: order.user_id.clone(),
            order_number: order.order_number.clone(),
            status: order.status,
            total_amount: order.total_amount,
            discount_amount: order.discount_amount,
            shipping_amount: order.shipping_amount,
            payment_status: order.payment_status,
            payment_method: order.payment_method,
            shipping_address: order.shipping_address.clone(),
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };
        state.orders.push(stored.clone());
        Ok(stored)
    }

    async fn insert_order_items(&self, items: &[NewOrderItem]) -> Result<(), BackendError> {
        let mut state = self.lock();
        if state.fail_order_items_insert {
            return Err(injected("order items insert"));
        }
        for item in items {
            state.order_items.push(OrderItem {
                id: OrderItemId::new(row_id()),
                order_id: item.order_id.clone(),
                product_id: item.product_id.clone(),
                variant_id: item.variant_id.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                total_price: item.total_price,
                created_at: Some(Utc::now()),
            });
        }
        Ok(())
    }

    async fn delete_order(&self, id: &OrderId) -> Result<(), BackendError> {
        let mut state = self.lock();
        if state.fail_order_delete {
            return Err(injected("order delete"));
        }
        state.orders.retain(|o| &o.id != id);
        state.order_items.retain(|item| &item.order_id != id);
        Ok(())
    }

    async fn list_orders(&self, user: &UserId) -> Result<Vec<Order>, BackendError> {
        let state = self.lock();
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| &o.user_id == user)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn recent_orders(&self, limit: u32) -> Result<Vec<Order>, BackendError> {
        let state = self.lock();
        let mut orders: Vec<Order> = state.orders.clone();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders.truncate(limit as usize);
        Ok(orders)
    }

    async fn adjust_stock(
        &self,
        variant: &VariantId,
        quantity: u32,
    ) -> Result<StockAdjustment, BackendError> {
        let mut state = self.lock();
        if state.fail_stock_adjust {
            return Err(injected("stock adjust"));
        }
        let found = state
            .products
            .iter_mut()
            .flat_map(|p| &mut p.variants)
            .find(|v| &v.id == variant);
        let Some(found) = found else {
            return Err(BackendError::NotFound(format!("variant {variant}")));
        };
        let clamped = quantity > found.stock_quantity;
        found.stock_quantity = found.stock_quantity.saturating_sub(quantity);
        Ok(StockAdjustment {
            remaining: found.stock_quantity,
            clamped,
        })
    }

    async fn store_stats(&self) -> Result<StoreStats, BackendError> {
        let state = self.lock();
        let total_revenue = state
            .orders
            .iter()
            .filter(|o| o.payment_status == vastra_core::PaymentStatus::Paid)
            .map(|o| o.total_amount)
            .sum();
        Ok(StoreStats {
            total_revenue,
            total_orders: state.orders.len() as u64,
            total_customers: state.profiles.len() as u64,
            total_products: state.products.len() as u64,
        })
    }

    async fn low_stock_variants(
        &self,
        threshold: u32,
        limit: u32,
    ) -> Result<Vec<LowStockVariant>, BackendError> {
        let state = self.lock();
        let mut rows: Vec<LowStockVariant> = state
            .products
            .iter()
            .flat_map(|p| p.variants.iter().map(move |v| (p, v)))
            .filter(|(_, v)| v.is_active && v.stock_quantity < threshold)
            .map(|(p, v)| LowStockVariant {
                variant_id: v.id.clone(),
                product_name: p.name.clone(),
                size: v.size.clone(),
                color: v.color.clone(),
                stock_quantity: v.stock_quantity,
                image: p.images.first().cloned(),
            })
            .collect();
        rows.sort_by_key(|row| row.stock_quantity);
        rows.truncate(limit as usize);
        Ok(rows)
    }
}

// =============================================================================
// MemoryAuthApi
// =============================================================================

#[derive(Debug, Clone)]
struct MemoryAccount {
    id: UserId,
    phone: Option<Phone>,
    email: Option<Email>,
    password: Option<String>,
}

#[derive(Debug, Default)]
struct AuthState {
    accounts: Vec<MemoryAccount>,
    pending_codes: HashMap<String, String>,
    session: Option<AuthSession>,
}

/// In-memory auth subsystem.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuthApi {
    state: Arc<Mutex<AuthState>>,
}

impl MemoryAuthApi {
    /// The code every OTP request "sends".
    pub const TEST_OTP: &'static str = "424242";

    /// Create an empty auth backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install a session returned by `get_session`.
    pub fn set_session(&self, session: AuthSession) {
        self.lock().session = Some(session);
    }

    /// Whether an OTP has been issued for this phone.
    #[must_use]
    pub fn code_issued_for(&self, phone: &Phone) -> bool {
        self.lock().pending_codes.contains_key(phone.as_str())
    }

    fn session_for(account: &MemoryAccount) -> AuthSession {
        AuthSession {
            user: AuthUser {
                id: account.id.clone(),
                phone: account.phone.clone(),
                email: account.email.clone(),
            },
            access_token: row_id(),
        }
    }
}

#[async_trait]
impl AuthApi for MemoryAuthApi {
    async fn get_session(&self) -> Result<Option<AuthSession>, AuthError> {
        Ok(self.lock().session.clone())
    }

    async fn sign_in_with_otp(&self, phone: &Phone) -> Result<(), AuthError> {
        self.lock()
            .pending_codes
            .insert(phone.as_str().to_owned(), Self::TEST_OTP.to_owned());
        Ok(())
    }

    async fn verify_otp(&self, phone: &Phone, code: &str) -> Result<AuthSession, AuthError> {
        let mut state = self.lock();
        let expected = state.pending_codes.remove(phone.as_str());
        if expected.as_deref() != Some(code) {
            return Err(AuthError::InvalidCode);
        }
        if let Some(account) = state
            .accounts
            .iter()
            .find(|a| a.phone.as_ref() == Some(phone))
        {
            return Ok(Self::session_for(account));
        }
        let account = MemoryAccount {
            id: UserId::new(row_id()),
            phone: Some(phone.clone()),
            email: None,
            password: None,
        };
        let session = Self::session_for(&account);
        state.accounts.push(account);
        Ok(session)
    }

    async fn sign_up(&self, email: &Email, password: &str) -> Result<AuthSession, AuthError> {
        let mut state = self.lock();
        if state
            .accounts
            .iter()
            .any(|a| a.email.as_ref() == Some(email))
        {
            return Err(AuthError::UserAlreadyExists);
        }
        let account = MemoryAccount {
            id: UserId::new(row_id()),
            phone: None,
            email: Some(email.clone()),
            password: Some(password.to_owned()),
        };
        let session = Self::session_for(&account);
        state.accounts.push(account);
        Ok(session)
    }

    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let state = self.lock();
        state
            .accounts
            .iter()
            .find(|a| a.email.as_ref() == Some(email) && a.password.as_deref() == Some(password))
            .map(Self::session_for)
            .ok_or(AuthError::InvalidCredentials)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.lock().session = None;
        Ok(())
    }
}
