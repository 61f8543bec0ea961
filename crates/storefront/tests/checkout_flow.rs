//! Order placement end to end over the in-memory backend.

mod common;

use vastra_core::{Money, OrderStatus, PaymentStatus, ProductId, VariantId};
use vastra_storefront::models::PaymentMethod;
use vastra_storefront::services::CheckoutError;

use common::{customer_storefront, demo_user, product, stored_address, variant};

#[tokio::test]
async fn test_cart_checkout_records_order_items_and_stock() {
    let (storefront, data, _auth) = customer_storefront().await;
    let user = demo_user();
    data.seed_product(product("p1", "kurta", 500, 0, vec![variant("v1", "p1", 10, 0)]));
    data.seed_address(stored_address("a1", &user, true));

    let cart = storefront.cart();
    let items = cart
        .add_item(&ProductId::new("p1"), &VariantId::new("v1"), 2)
        .await
        .expect("add to cart");

    let order = storefront
        .checkout()
        .checkout_cart(&items, &stored_address("a1", &user, true), PaymentMethod::CashOnDelivery)
        .await
        .expect("order placed");

    // qty 2 × unit 500 = subtotal 1000 > 999, so shipping is free
    assert_eq!(order.total_amount, Money::from_major(1000));
    assert_eq!(order.shipping_amount, Money::ZERO);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Pending);

    let order_items = data.order_items(&order.id);
    assert_eq!(order_items.len(), 1);
    let line = order_items.first().expect("one line");
    assert_eq!(line.unit_price, Money::from_major(500));
    assert_eq!(line.total_price, Money::from_major(1000));
    assert_eq!(line.quantity, 2);

    assert_eq!(data.stock_of(&VariantId::new("v1")), Some(8));
    // Full checkout clears the cart
    assert_eq!(data.cart_row_count(&user), 0);
}

#[tokio::test]
async fn test_flat_shipping_below_threshold() {
    let (storefront, data, _auth) = customer_storefront().await;
    let user = demo_user();
    data.seed_product(product("p1", "tee", 500, 0, vec![variant("v1", "p1", 10, 0)]));
    data.seed_address(stored_address("a1", &user, true));

    let items = storefront
        .cart()
        .add_item(&ProductId::new("p1"), &VariantId::new("v1"), 1)
        .await
        .expect("add to cart");
    let order = storefront
        .checkout()
        .checkout_cart(&items, &stored_address("a1", &user, true), PaymentMethod::Upi)
        .await
        .expect("order placed");

    assert_eq!(order.shipping_amount, Money::from_major(99));
    assert_eq!(order.total_amount, Money::from_major(599));
}

#[tokio::test]
async fn test_subtotal_of_exactly_999_still_pays_shipping() {
    let (storefront, data, _auth) = customer_storefront().await;
    let user = demo_user();
    data.seed_product(product("p1", "stole", 999, 0, vec![variant("v1", "p1", 5, 0)]));
    data.seed_address(stored_address("a1", &user, true));

    let items = storefront
        .cart()
        .add_item(&ProductId::new("p1"), &VariantId::new("v1"), 1)
        .await
        .expect("add to cart");
    let order = storefront
        .checkout()
        .checkout_cart(&items, &stored_address("a1", &user, true), PaymentMethod::Card)
        .await
        .expect("order placed");

    assert_eq!(order.shipping_amount, Money::from_major(99));
    assert_eq!(order.total_amount, Money::from_major(1098));
}

#[tokio::test]
async fn test_discount_and_variant_delta_priced_into_snapshot() {
    let (storefront, data, _auth) = customer_storefront().await;
    let user = demo_user();
    // (1000 × 0.75 + 50) = 800 per unit
    data.seed_product(product("p1", "jacket", 1000, 25, vec![variant("v1", "p1", 5, 50)]));
    data.seed_address(stored_address("a1", &user, true));

    let items = storefront
        .cart()
        .add_item(&ProductId::new("p1"), &VariantId::new("v1"), 2)
        .await
        .expect("add to cart");
    let order = storefront
        .checkout()
        .checkout_cart(&items, &stored_address("a1", &user, true), PaymentMethod::CashOnDelivery)
        .await
        .expect("order placed");

    let line = data.order_items(&order.id).into_iter().next().expect("one line");
    assert_eq!(line.unit_price, Money::from_major(800));
    assert_eq!(line.total_price, Money::from_major(1600));
    assert_eq!(order.total_amount, Money::from_major(1600));
}

#[tokio::test]
async fn test_order_prices_stay_frozen_after_catalog_edit() {
    let (storefront, data, _auth) = customer_storefront().await;
    let user = demo_user();
    data.seed_product(product("p1", "saree", 500, 0, vec![variant("v1", "p1", 10, 0)]));
    data.seed_address(stored_address("a1", &user, true));

    let order = storefront
        .checkout()
        .quick_purchase(&ProductId::new("p1"), &VariantId::new("v1"), 1)
        .await
        .expect("quick purchase");

    data.set_product_price(&ProductId::new("p1"), Money::from_major(900));

    let line = data.order_items(&order.id).into_iter().next().expect("one line");
    assert_eq!(line.unit_price, Money::from_major(500));

    // The cart, by contrast, always reprices from the current catalog
    let items = storefront
        .cart()
        .add_item(&ProductId::new("p1"), &VariantId::new("v1"), 1)
        .await
        .expect("add to cart");
    assert_eq!(items.first().expect("one line").unit_price(), Money::from_major(900));
}

#[tokio::test]
async fn test_quick_purchase_uses_default_address_and_cod() {
    let (storefront, data, _auth) = customer_storefront().await;
    let user = demo_user();
    data.seed_product(product("p1", "tee", 250, 0, vec![variant("v1", "p1", 4, 0)]));
    data.seed_address(stored_address("a1", &user, true));

    // A cart line that must remain untouched by the express path
    storefront
        .cart()
        .add_item(&ProductId::new("p1"), &VariantId::new("v1"), 1)
        .await
        .expect("add to cart");

    let order = storefront
        .checkout()
        .quick_purchase(&ProductId::new("p1"), &VariantId::new("v1"), 2)
        .await
        .expect("quick purchase");

    assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);
    assert_eq!(order.shipping_address.city, "Bengaluru");
    assert_eq!(data.stock_of(&VariantId::new("v1")), Some(2));
    assert_eq!(data.cart_row_count(&user), 1);
}

#[tokio::test]
async fn test_quick_purchase_insufficient_stock_performs_zero_writes() {
    let (storefront, data, _auth) = customer_storefront().await;
    let user = demo_user();
    data.seed_product(product("p1", "tee", 250, 0, vec![variant("v1", "p1", 1, 0)]));
    data.seed_address(stored_address("a1", &user, true));

    let err = storefront
        .checkout()
        .quick_purchase(&ProductId::new("p1"), &VariantId::new("v1"), 2)
        .await
        .expect_err("must reject");

    assert!(matches!(err, CheckoutError::InsufficientStock));
    assert!(data.orders().is_empty());
    assert_eq!(data.stock_of(&VariantId::new("v1")), Some(1));
}

#[tokio::test]
async fn test_quick_purchase_without_default_address_rejects_before_writes() {
    let (storefront, data, _auth) = customer_storefront().await;
    data.seed_product(product("p1", "tee", 250, 0, vec![variant("v1", "p1", 5, 0)]));

    let err = storefront
        .checkout()
        .quick_purchase(&ProductId::new("p1"), &VariantId::new("v1"), 1)
        .await
        .expect_err("must reject");

    assert!(matches!(err, CheckoutError::NoDefaultAddress));
    assert!(data.orders().is_empty());
}

#[tokio::test]
async fn test_quick_purchase_unknown_product_and_variant() {
    let (storefront, data, _auth) = customer_storefront().await;
    let user = demo_user();
    data.seed_product(product("p1", "tee", 250, 0, vec![variant("v1", "p1", 5, 0)]));
    data.seed_address(stored_address("a1", &user, true));

    let err = storefront
        .checkout()
        .quick_purchase(&ProductId::new("p-missing"), &VariantId::new("v1"), 1)
        .await
        .expect_err("must reject");
    assert!(matches!(err, CheckoutError::ProductNotFound));

    let err = storefront
        .checkout()
        .quick_purchase(&ProductId::new("p1"), &VariantId::new("v-missing"), 1)
        .await
        .expect_err("must reject");
    assert!(matches!(err, CheckoutError::VariantNotFound));

    assert!(data.orders().is_empty());
}

#[tokio::test]
async fn test_items_insert_failure_deletes_header() {
    let (storefront, data, _auth) = customer_storefront().await;
    let user = demo_user();
    data.seed_product(product("p1", "tee", 250, 0, vec![variant("v1", "p1", 5, 0)]));
    data.seed_address(stored_address("a1", &user, true));

    let items = storefront
        .cart()
        .add_item(&ProductId::new("p1"), &VariantId::new("v1"), 1)
        .await
        .expect("add to cart");

    data.set_fail_order_items_insert(true);
    let err = storefront
        .checkout()
        .checkout_cart(&items, &stored_address("a1", &user, true), PaymentMethod::CashOnDelivery)
        .await
        .expect_err("must fail");

    assert!(matches!(err, CheckoutError::Persistence(_)));
    // Compensation removed the orphan header, and stock was never touched
    assert!(data.orders().is_empty());
    assert_eq!(data.stock_of(&VariantId::new("v1")), Some(5));
}

#[tokio::test]
async fn test_failed_compensation_leaves_orphan_header() {
    let (storefront, data, _auth) = customer_storefront().await;
    let user = demo_user();
    data.seed_product(product("p1", "tee", 250, 0, vec![variant("v1", "p1", 5, 0)]));
    data.seed_address(stored_address("a1", &user, true));

    let items = storefront
        .cart()
        .add_item(&ProductId::new("p1"), &VariantId::new("v1"), 1)
        .await
        .expect("add to cart");

    data.set_fail_order_items_insert(true);
    data.set_fail_order_delete(true);
    let err = storefront
        .checkout()
        .checkout_cart(&items, &stored_address("a1", &user, true), PaymentMethod::CashOnDelivery)
        .await
        .expect_err("must fail");

    assert!(matches!(err, CheckoutError::Persistence(_)));
    // Known gap: the header survives with no line items
    let orders = data.orders();
    assert_eq!(orders.len(), 1);
    assert!(data.order_items(&orders.first().expect("header").id).is_empty());
}

#[tokio::test]
async fn test_stock_adjustment_failure_never_fails_the_order() {
    let (storefront, data, _auth) = customer_storefront().await;
    let user = demo_user();
    data.seed_product(product("p1", "tee", 250, 0, vec![variant("v1", "p1", 5, 0)]));
    data.seed_address(stored_address("a1", &user, true));

    let items = storefront
        .cart()
        .add_item(&ProductId::new("p1"), &VariantId::new("v1"), 2)
        .await
        .expect("add to cart");

    data.set_fail_stock_adjust(true);
    let order = storefront
        .checkout()
        .checkout_cart(&items, &stored_address("a1", &user, true), PaymentMethod::CashOnDelivery)
        .await
        .expect("order still placed");

    assert_eq!(data.order_items(&order.id).len(), 1);
    // Inventory was left untouched
    assert_eq!(data.stock_of(&VariantId::new("v1")), Some(5));
}

#[tokio::test]
async fn test_cart_checkout_oversell_clamps_stock_at_zero() {
    let (storefront, data, _auth) = customer_storefront().await;
    let user = demo_user();
    data.seed_product(product("p1", "tee", 250, 0, vec![variant("v1", "p1", 1, 0)]));
    data.seed_address(stored_address("a1", &user, true));

    // The cart path performs no stock pre-check; the decrement clamps
    let items = storefront
        .cart()
        .add_item(&ProductId::new("p1"), &VariantId::new("v1"), 3)
        .await
        .expect("add to cart");
    storefront
        .checkout()
        .checkout_cart(&items, &stored_address("a1", &user, true), PaymentMethod::CashOnDelivery)
        .await
        .expect("order placed");

    assert_eq!(data.stock_of(&VariantId::new("v1")), Some(0));
}

#[tokio::test]
async fn test_checkout_requires_identity() {
    let (storefront, data, _auth) = common::anonymous_storefront();
    let user = demo_user();
    data.seed_product(product("p1", "tee", 250, 0, vec![variant("v1", "p1", 5, 0)]));

    let err = storefront
        .checkout()
        .checkout_cart(&[], &stored_address("a1", &user, true), PaymentMethod::CashOnDelivery)
        .await
        .expect_err("must reject");
    assert!(matches!(err, CheckoutError::NotAuthenticated));

    let err = storefront
        .checkout()
        .quick_purchase(&ProductId::new("p1"), &VariantId::new("v1"), 1)
        .await
        .expect_err("must reject");
    assert!(matches!(err, CheckoutError::NotAuthenticated));
}

#[tokio::test]
async fn test_empty_order_rejected_before_writes() {
    let (storefront, data, _auth) = customer_storefront().await;
    let user = demo_user();
    data.seed_address(stored_address("a1", &user, true));

    let err = storefront
        .checkout()
        .checkout_cart(&[], &stored_address("a1", &user, true), PaymentMethod::CashOnDelivery)
        .await
        .expect_err("must reject");

    assert!(matches!(err, CheckoutError::EmptyOrder));
    assert!(data.orders().is_empty());
}
