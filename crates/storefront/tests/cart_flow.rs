//! Cart aggregate behavior over the in-memory backend.

mod common;

use vastra_core::{Money, ProductId, VariantId};
use vastra_storefront::services::{CartError, CartService};

use common::{anonymous_storefront, customer_storefront, product, variant};

#[tokio::test]
async fn test_repeated_add_increments_single_line() {
    let (storefront, data, _auth) = customer_storefront().await;
    data.seed_product(product("p1", "tee", 250, 0, vec![variant("v1", "p1", 10, 0)]));

    let cart = storefront.cart();
    cart.add_item(&ProductId::new("p1"), &VariantId::new("v1"), 1)
        .await
        .expect("first add");
    let items = cart
        .add_item(&ProductId::new("p1"), &VariantId::new("v1"), 2)
        .await
        .expect("second add");

    assert_eq!(items.len(), 1);
    assert_eq!(items.first().expect("one line").quantity, 3);
}

#[tokio::test]
async fn test_distinct_variants_get_distinct_lines() {
    let (storefront, data, _auth) = customer_storefront().await;
    data.seed_product(product(
        "p1",
        "tee",
        250,
        0,
        vec![variant("v1", "p1", 10, 0), variant("v2", "p1", 10, 50)],
    ));

    let cart = storefront.cart();
    cart.add_item(&ProductId::new("p1"), &VariantId::new("v1"), 1)
        .await
        .expect("add v1");
    let items = cart
        .add_item(&ProductId::new("p1"), &VariantId::new("v2"), 1)
        .await
        .expect("add v2");

    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn test_update_quantity_zero_equals_remove() {
    let (storefront, data, _auth) = customer_storefront().await;
    data.seed_product(product("p1", "tee", 250, 0, vec![variant("v1", "p1", 10, 0)]));

    let cart = storefront.cart();
    let items = cart
        .add_item(&ProductId::new("p1"), &VariantId::new("v1"), 2)
        .await
        .expect("add");
    let line_id = items.first().expect("one line").id.clone();

    let items = cart.update_quantity(&line_id, 0).await.expect("update");
    assert!(items.is_empty());
}

#[tokio::test]
async fn test_update_quantity_sets_new_value() {
    let (storefront, data, _auth) = customer_storefront().await;
    data.seed_product(product("p1", "tee", 250, 0, vec![variant("v1", "p1", 10, 0)]));

    let cart = storefront.cart();
    let items = cart
        .add_item(&ProductId::new("p1"), &VariantId::new("v1"), 1)
        .await
        .expect("add");
    let line_id = items.first().expect("one line").id.clone();

    let items = cart.update_quantity(&line_id, 5).await.expect("update");
    assert_eq!(items.first().expect("one line").quantity, 5);
}

#[tokio::test]
async fn test_remove_and_clear() {
    let (storefront, data, _auth) = customer_storefront().await;
    data.seed_product(product(
        "p1",
        "tee",
        250,
        0,
        vec![variant("v1", "p1", 10, 0), variant("v2", "p1", 10, 0)],
    ));

    let cart = storefront.cart();
    cart.add_item(&ProductId::new("p1"), &VariantId::new("v1"), 1)
        .await
        .expect("add v1");
    let items = cart
        .add_item(&ProductId::new("p1"), &VariantId::new("v2"), 1)
        .await
        .expect("add v2");

    let keep = items.first().expect("line").id.clone();
    let items = cart.remove_item(&keep).await.expect("remove");
    assert_eq!(items.len(), 1);

    cart.clear().await.expect("clear");
    assert!(cart.items().await.expect("refresh").is_empty());
}

#[tokio::test]
async fn test_totals_use_discounted_price_plus_delta() {
    let (storefront, data, _auth) = customer_storefront().await;
    // (400 × 0.75 + 100) × 3 = 1200
    data.seed_product(product("p1", "tee", 400, 25, vec![variant("v1", "p1", 10, 100)]));

    let items = storefront
        .cart()
        .add_item(&ProductId::new("p1"), &VariantId::new("v1"), 3)
        .await
        .expect("add");

    let totals = CartService::totals(&items);
    assert_eq!(totals.subtotal, Money::from_major(1200));
    assert_eq!(totals.item_count, 3);
}

#[tokio::test]
async fn test_cart_reprices_from_current_catalog() {
    let (storefront, data, _auth) = customer_storefront().await;
    data.seed_product(product("p1", "tee", 250, 0, vec![variant("v1", "p1", 10, 0)]));

    let cart = storefront.cart();
    cart.add_item(&ProductId::new("p1"), &VariantId::new("v1"), 1)
        .await
        .expect("add");

    data.set_product_price(&ProductId::new("p1"), Money::from_major(300));

    let items = cart.items().await.expect("refresh");
    assert_eq!(items.first().expect("one line").line_total(), Money::from_major(300));
}

#[tokio::test]
async fn test_all_operations_require_identity() {
    let (storefront, data, _auth) = anonymous_storefront();
    data.seed_product(product("p1", "tee", 250, 0, vec![variant("v1", "p1", 10, 0)]));

    let cart = storefront.cart();
    assert!(matches!(
        cart.items().await.expect_err("reject"),
        CartError::NotAuthenticated
    ));
    assert!(matches!(
        cart.add_item(&ProductId::new("p1"), &VariantId::new("v1"), 1)
            .await
            .expect_err("reject"),
        CartError::NotAuthenticated
    ));
    assert!(matches!(
        cart.clear().await.expect_err("reject"),
        CartError::NotAuthenticated
    ));
    // Nothing was written while anonymous
    assert_eq!(data.cart_row_count(&common::demo_user()), 0);
}
