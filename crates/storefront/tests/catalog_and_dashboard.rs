//! Catalog reads and the admin dashboard.

mod common;

use chrono::{Duration, Utc};

use vastra_core::{CategoryId, Money, ProductId, VariantId};
use vastra_storefront::models::{Category, ProductQuery, ProductSort};
use vastra_storefront::services::DashboardError;

use common::{
    anonymous_storefront, customer_storefront, product, sign_in_demo_admin, stored_address,
    variant,
};

fn category(id: &str, name: &str, active: bool) -> Category {
    Category {
        id: CategoryId::new(id),
        name: name.to_owned(),
        slug: name.to_lowercase(),
        parent_id: None,
        image_url: None,
        is_active: active,
    }
}

#[tokio::test]
async fn test_product_by_slug_hides_inactive() {
    let (storefront, data, _auth) = anonymous_storefront();
    data.seed_product(product("p1", "kurta", 500, 0, vec![]));
    let mut hidden = product("p2", "old-kurta", 500, 0, vec![]);
    hidden.is_active = false;
    data.seed_product(hidden);

    let catalog = storefront.catalog();
    assert!(catalog.product_by_slug("kurta").await.expect("read").is_some());
    assert!(catalog.product_by_slug("old-kurta").await.expect("read").is_none());
    assert!(catalog.product(&ProductId::new("p2")).await.expect("read").is_none());
}

#[tokio::test]
async fn test_listing_filters_and_sorts() {
    let (storefront, data, _auth) = anonymous_storefront();

    let mut cheap = product("p1", "tee", 200, 0, vec![]);
    cheap.created_at = Some(Utc::now() - Duration::hours(2));
    let mut pricey = product("p2", "jacket", 2000, 0, vec![]);
    pricey.is_featured = true;
    pricey.created_at = Some(Utc::now());
    data.seed_product(cheap);
    data.seed_product(pricey);

    let catalog = storefront.catalog();

    let newest = catalog
        .products(&ProductQuery::default())
        .await
        .expect("list");
    assert_eq!(newest.first().expect("first").id, ProductId::new("p2"));

    let by_price = catalog
        .products(&ProductQuery {
            sort: ProductSort::PriceAsc,
            ..ProductQuery::default()
        })
        .await
        .expect("list");
    assert_eq!(by_price.first().expect("first").id, ProductId::new("p1"));

    let featured = catalog
        .products(&ProductQuery {
            featured_only: true,
            ..ProductQuery::default()
        })
        .await
        .expect("list");
    assert_eq!(featured.len(), 1);
    assert_eq!(featured.first().expect("first").id, ProductId::new("p2"));
}

#[tokio::test]
async fn test_categories_active_and_name_sorted() {
    let (storefront, data, _auth) = anonymous_storefront();
    data.seed_category(category("c2", "Women", true));
    data.seed_category(category("c1", "Men", true));
    data.seed_category(category("c3", "Archive", false));

    let categories = storefront.catalog().categories().await.expect("list");
    let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Men", "Women"]);
}

#[tokio::test]
async fn test_dashboard_requires_admin() {
    let (storefront, _data, _auth) = customer_storefront().await;

    let err = storefront.dashboard().stats().await.expect_err("reject");
    assert!(matches!(err, DashboardError::NotAuthorized));

    let (anonymous, _data, _auth) = anonymous_storefront();
    let err = anonymous.dashboard().stats().await.expect_err("reject");
    assert!(matches!(err, DashboardError::NotAuthorized));
}

#[tokio::test]
async fn test_dashboard_stats_and_low_stock() {
    let (storefront, data, _auth) = anonymous_storefront();
    sign_in_demo_admin(&storefront).await;

    data.seed_product(product("p1", "tee", 500, 0, vec![variant("v1", "p1", 3, 0)]));
    data.seed_product(product("p2", "kurta", 800, 0, vec![variant("v2", "p2", 50, 0)]));
    data.seed_address(stored_address(
        "a1",
        &vastra_core::UserId::new("demo-admin-id"),
        true,
    ));

    storefront
        .checkout()
        .quick_purchase(&ProductId::new("p2"), &VariantId::new("v2"), 1)
        .await
        .expect("order placed");

    let stats = storefront.dashboard().stats().await.expect("stats");
    assert_eq!(stats.total_orders, 1);
    assert_eq!(stats.total_products, 2);
    // Revenue counts paid orders only; this one is still pending
    assert_eq!(stats.total_revenue, Money::ZERO);

    let low = storefront.dashboard().low_stock(5).await.expect("low stock");
    assert_eq!(low.len(), 1);
    let entry = low.first().expect("entry");
    assert_eq!(entry.variant_id, VariantId::new("v1"));
    assert_eq!(entry.stock_quantity, 3);

    let recent = storefront.dashboard().recent_orders(5).await.expect("recent");
    assert_eq!(recent.len(), 1);
}
