//! Shared fixtures for the integration suites.

// Not every suite uses every fixture
#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;

use vastra_core::{AddressId, AddressKind, CategoryId, Money, Phone, ProductId, UserId, VariantId};
use vastra_storefront::Storefront;
use vastra_storefront::backend::{MemoryAuthApi, MemoryDataService};
use vastra_storefront::identity::demo::{DEMO_ADMIN_PHONE, DEMO_CUSTOMER_PHONE, DEMO_OTP};
use vastra_storefront::identity::{MemorySessionCache, SessionCache};
use vastra_storefront::models::{Address, AddressDraft, Product, ProductVariant};

/// The fixed id of the demo customer.
#[must_use]
pub fn demo_user() -> UserId {
    UserId::new("demo-customer-id")
}

/// A variant fixture.
#[must_use]
pub fn variant(id: &str, product: &str, stock: u32, additional: i64) -> ProductVariant {
    ProductVariant {
        id: VariantId::new(id),
        product_id: ProductId::new(product),
        size: "M".to_owned(),
        color: "Indigo".to_owned(),
        color_hex: None,
        stock_quantity: stock,
        additional_price: Money::from_major(additional),
        is_active: true,
    }
}

/// A product fixture with one or more variants embedded.
#[must_use]
pub fn product(
    id: &str,
    slug: &str,
    base: i64,
    discount: i64,
    variants: Vec<ProductVariant>,
) -> Product {
    Product {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        slug: slug.to_owned(),
        description: None,
        category_id: CategoryId::new("c1"),
        brand: None,
        material: None,
        base_price: Money::from_major(base),
        discount_percentage: Decimal::from(discount),
        is_featured: false,
        is_active: true,
        images: vec![],
        created_at: None,
        updated_at: None,
        variants,
        category: None,
    }
}

/// An address draft fixture.
#[must_use]
pub fn draft(name: &str, is_default: bool) -> AddressDraft {
    AddressDraft {
        kind: AddressKind::Home,
        name: name.to_owned(),
        phone: "+919800000000".to_owned(),
        address_line1: "12 MG Road".to_owned(),
        address_line2: None,
        city: "Bengaluru".to_owned(),
        state: "Karnataka".to_owned(),
        postal_code: "560001".to_owned(),
        country: "India".to_owned(),
        is_default,
    }
}

/// A stored address fixture for direct seeding.
#[must_use]
pub fn stored_address(id: &str, user: &UserId, is_default: bool) -> Address {
    Address {
        id: AddressId::new(id),
        user_id: user.clone(),
        kind: AddressKind::Home,
        name: "Asha Rao".to_owned(),
        phone: "+919800000000".to_owned(),
        address_line1: "12 MG Road".to_owned(),
        address_line2: None,
        city: "Bengaluru".to_owned(),
        state: "Karnataka".to_owned(),
        postal_code: "560001".to_owned(),
        country: "India".to_owned(),
        is_default,
        created_at: None,
    }
}

/// Route test logs through the env-filtered subscriber (`RUST_LOG=debug`).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An anonymous in-memory storefront plus handles to its backends.
#[must_use]
pub fn anonymous_storefront() -> (Storefront, MemoryDataService, MemoryAuthApi) {
    init_tracing();
    let data = MemoryDataService::new();
    let auth = MemoryAuthApi::new();
    let storefront = Storefront::in_memory(data.clone(), auth.clone());
    (storefront, data, auth)
}

/// An in-memory storefront signed in as the demo customer.
pub async fn customer_storefront() -> (Storefront, MemoryDataService, MemoryAuthApi) {
    let (storefront, data, auth) = anonymous_storefront();
    sign_in_demo_customer(&storefront).await;
    (storefront, data, auth)
}

/// Sign the demo customer in.
pub async fn sign_in_demo_customer(storefront: &Storefront) {
    let phone = Phone::parse(DEMO_CUSTOMER_PHONE).expect("demo phone is valid");
    storefront
        .identity()
        .verify_code(&phone, DEMO_OTP, None)
        .await
        .expect("demo sign-in succeeds");
}

/// Sign the demo admin in.
pub async fn sign_in_demo_admin(storefront: &Storefront) {
    let phone = Phone::parse(DEMO_ADMIN_PHONE).expect("demo phone is valid");
    storefront
        .identity()
        .verify_code(&phone, DEMO_OTP, None)
        .await
        .expect("demo sign-in succeeds");
}

/// A storefront over explicit shared backends, for restart-style tests.
#[must_use]
pub fn storefront_with_cache(
    data: &MemoryDataService,
    auth: &MemoryAuthApi,
    cache: &Arc<MemorySessionCache>,
) -> Storefront {
    Storefront::with_backend(
        Arc::new(data.clone()),
        Arc::new(auth.clone()),
        Arc::clone(cache) as Arc<dyn SessionCache>,
    )
}
