//! REST implementation of the table contract.
//!
//! Speaks the backend's PostgREST-style conventions: filters as query
//! parameters (`user_id=eq.<id>`), embedded relations in the `select`
//! projection, `Prefer` headers for write behavior, and database functions
//! under `/rest/v1/rpc/` for the conflict-sensitive mutations (cart
//! upsert-increment, stock decrement).

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use vastra_core::{AddressId, CartItemId, Money, OrderId, ProductId, UserId, VariantId};

use crate::config::BackendConfig;
use crate::models::{
    Address, AddressDraft, CartItem, Category, NewAddress, NewCartLine, NewOrder, NewOrderItem,
    NewProfile, Order, Product, ProductQuery, ProductSort, UserProfile,
};

use super::service::{DataService, LowStockVariant, StockAdjustment, StoreStats};
use super::{ApiError, BackendError};

/// Projection used whenever a product row is read on its own.
const PRODUCT_SELECT: &str = "*,variants:product_variants(*),category:categories(*)";

/// Projection used for joined cart reads.
const CART_SELECT: &str = "*,product:products(*),variant:product_variants(*)";

// =============================================================================
// RestDataService
// =============================================================================

/// Client for the hosted table API.
#[derive(Clone)]
pub struct RestDataService {
    inner: Arc<RestInner>,
}

struct RestInner {
    client: reqwest::Client,
    rest_base: String,
    key: String,
}

impl RestDataService {
    /// Create a new table API client.
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        let rest_base = format!("{}/rest/v1", config.url.as_str().trim_end_matches('/'));

        Self {
            inner: Arc::new(RestInner {
                client: reqwest::Client::new(),
                rest_base,
                key: config.key.expose_secret().to_owned(),
            }),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{table}", self.inner.rest_base)
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}/rpc/{function}", self.inner.rest_base)
    }

    /// Attach auth headers and send, mapping non-success responses.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let response = request
            .header("apikey", &self.inner.key)
            .bearer_auth(&self.inner.key)
            .send()
            .await?;

        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        if !status.is_success() {
            // Get the body as text for better error diagnostics
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(BackendError::Api(parse_error_body(status.as_u16(), &body)));
        }

        Ok(response)
    }

    /// GET matching rows from a table.
    async fn get_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, BackendError> {
        let response = self
            .send(self.inner.client.get(self.table_url(table)).query(query))
            .await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                table,
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    /// GET at most one row from a table.
    async fn get_single<T: DeserializeOwned>(
        &self,
        table: &str,
        mut query: Vec<(&str, String)>,
    ) -> Result<Option<T>, BackendError> {
        query.push(("limit", "1".to_owned()));
        let mut rows: Vec<T> = self.get_rows(table, &query).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    /// POST rows, discarding the response body.
    async fn insert<B: serde::Serialize + ?Sized>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<(), BackendError> {
        self.send(
            self.inner
                .client
                .post(self.table_url(table))
                .header("Prefer", "return=minimal")
                .json(body),
        )
        .await?;
        Ok(())
    }

    /// POST one row and return the stored representation.
    async fn insert_returning<T, B>(&self, table: &str, body: &B) -> Result<T, BackendError>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let response = self
            .send(
                self.inner
                    .client
                    .post(self.table_url(table))
                    .header("Prefer", "return=representation")
                    .json(body),
            )
            .await?;
        let mut rows: Vec<T> = response.json().await?;
        if rows.is_empty() {
            return Err(BackendError::Api(ApiError::new(
                500,
                format!("insert into {table} returned no rows"),
            )));
        }
        Ok(rows.swap_remove(0))
    }

    /// PATCH matching rows.
    async fn patch<B: serde::Serialize + ?Sized>(
        &self,
        table: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<(), BackendError> {
        self.send(
            self.inner
                .client
                .patch(self.table_url(table))
                .query(query)
                .header("Prefer", "return=minimal")
                .json(body),
        )
        .await?;
        Ok(())
    }

    /// DELETE matching rows.
    async fn delete_rows(&self, table: &str, query: &[(&str, String)]) -> Result<(), BackendError> {
        self.send(self.inner.client.delete(self.table_url(table)).query(query))
            .await?;
        Ok(())
    }

    /// Call a database function and parse its result.
    async fn rpc<T, B>(&self, function: &str, body: &B) -> Result<T, BackendError>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let response = self
            .send(self.inner.client.post(self.rpc_url(function)).json(body))
            .await?;
        Ok(response.json().await?)
    }

    /// Call a database function, discarding any result.
    async fn rpc_void<B: serde::Serialize + ?Sized>(
        &self,
        function: &str,
        body: &B,
    ) -> Result<(), BackendError> {
        self.send(self.inner.client.post(self.rpc_url(function)).json(body))
            .await?;
        Ok(())
    }

    /// Exact row count for a table, via the `Content-Range` header.
    async fn count_rows(&self, table: &str) -> Result<u64, BackendError> {
        let response = self
            .send(
                self.inner
                    .client
                    .head(self.table_url(table))
                    .query(&[("select", "id")])
                    .header("Prefer", "count=exact"),
            )
            .await?;

        let count = response
            .headers()
            .get("Content-Range")
            .and_then(|v| v.to_str().ok())
            .and_then(|range| range.rsplit('/').next())
            .and_then(|total| total.parse::<u64>().ok());

        count.ok_or_else(|| {
            BackendError::Api(ApiError::new(
                500,
                format!("count for {table} missing from Content-Range"),
            ))
        })
    }
}

/// Parse an error body into an [`ApiError`], falling back to a body snippet.
fn parse_error_body(status: u16, body: &str) -> ApiError {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        details: Option<String>,
        #[serde(default)]
        hint: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body).map_or_else(
        |_| ApiError::new(status, body.chars().take(200).collect::<String>()),
        |parsed| ApiError {
            status,
            message: parsed.message.unwrap_or_default(),
            code: parsed.code,
            details: parsed.details,
            hint: parsed.hint,
        },
    )
}

const fn order_param(sort: ProductSort) -> &'static str {
    match sort {
        ProductSort::Newest => "created_at.desc",
        ProductSort::PriceAsc => "base_price.asc",
        ProductSort::PriceDesc => "base_price.desc",
        ProductSort::Name => "name.asc",
    }
}

#[async_trait]
impl DataService for RestDataService {
    // =========================================================================
    // Profiles
    // =========================================================================

    #[instrument(skip(self), fields(user = %user))]
    async fn fetch_profile(&self, user: &UserId) -> Result<Option<UserProfile>, BackendError> {
        self.get_single(
            "user_profiles",
            vec![("select", "*".to_owned()), ("id", format!("eq.{user}"))],
        )
        .await
    }

    async fn upsert_profile(&self, profile: &NewProfile) -> Result<(), BackendError> {
        self.send(
            self.inner
                .client
                .post(self.table_url("user_profiles"))
                .query(&[("on_conflict", "id")])
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .json(profile),
        )
        .await?;
        Ok(())
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    #[instrument(skip(self), fields(id = %id))]
    async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, BackendError> {
        self.get_single(
            "products",
            vec![
                ("select", PRODUCT_SELECT.to_owned()),
                ("id", format!("eq.{id}")),
                ("is_active", "eq.true".to_owned()),
            ],
        )
        .await
    }

    #[instrument(skip(self), fields(slug = %slug))]
    async fn fetch_product_by_slug(&self, slug: &str) -> Result<Option<Product>, BackendError> {
        self.get_single(
            "products",
            vec![
                ("select", PRODUCT_SELECT.to_owned()),
                ("slug", format!("eq.{slug}")),
                ("is_active", "eq.true".to_owned()),
            ],
        )
        .await
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, BackendError> {
        let mut params = vec![
            ("select", PRODUCT_SELECT.to_owned()),
            ("is_active", "eq.true".to_owned()),
            ("order", order_param(query.sort).to_owned()),
        ];
        if let Some(category) = &query.category {
            params.push(("category_id", format!("eq.{category}")));
        }
        if query.featured_only {
            params.push(("is_featured", "eq.true".to_owned()));
        }
        self.get_rows("products", &params).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        self.get_rows(
            "categories",
            &[
                ("select", "*".to_owned()),
                ("is_active", "eq.true".to_owned()),
                ("order", "name.asc".to_owned()),
            ],
        )
        .await
    }

    // =========================================================================
    // Cart
    // =========================================================================

    #[instrument(skip(self), fields(user = %user))]
    async fn list_cart(&self, user: &UserId) -> Result<Vec<CartItem>, BackendError> {
        self.get_rows(
            "cart_items",
            &[
                ("select", CART_SELECT.to_owned()),
                ("user_id", format!("eq.{user}")),
                ("order", "created_at.desc".to_owned()),
            ],
        )
        .await
    }

    async fn add_cart_line(&self, line: &NewCartLine) -> Result<(), BackendError> {
        // Quantity accumulation on (user, variant) conflict lives in a
        // database function; a plain upsert would replace the quantity.
        self.rpc_void(
            "add_cart_item",
            &serde_json::json!({
                "p_user_id": line.user_id,
                "p_product_id": line.product_id,
                "p_variant_id": line.variant_id,
                "p_quantity": line.quantity,
            }),
        )
        .await
    }

    async fn set_cart_line_quantity(
        &self,
        item: &CartItemId,
        quantity: u32,
    ) -> Result<(), BackendError> {
        self.patch(
            "cart_items",
            &[("id", format!("eq.{item}"))],
            &serde_json::json!({ "quantity": quantity }),
        )
        .await
    }

    async fn delete_cart_line(&self, item: &CartItemId) -> Result<(), BackendError> {
        self.delete_rows("cart_items", &[("id", format!("eq.{item}"))])
            .await
    }

    async fn clear_cart(&self, user: &UserId) -> Result<(), BackendError> {
        self.delete_rows("cart_items", &[("user_id", format!("eq.{user}"))])
            .await
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    async fn list_addresses(&self, user: &UserId) -> Result<Vec<Address>, BackendError> {
        self.get_rows(
            "addresses",
            &[
                ("select", "*".to_owned()),
                ("user_id", format!("eq.{user}")),
                ("order", "is_default.desc".to_owned()),
            ],
        )
        .await
    }

    #[instrument(skip(self), fields(user = %user))]
    async fn default_address(&self, user: &UserId) -> Result<Option<Address>, BackendError> {
        self.get_single(
            "addresses",
            vec![
                ("select", "*".to_owned()),
                ("user_id", format!("eq.{user}")),
                ("is_default", "eq.true".to_owned()),
            ],
        )
        .await
    }

    async fn insert_address(&self, address: &NewAddress) -> Result<Address, BackendError> {
        self.insert_returning("addresses", address).await
    }

    async fn update_address(
        &self,
        id: &AddressId,
        draft: &AddressDraft,
    ) -> Result<(), BackendError> {
        self.patch("addresses", &[("id", format!("eq.{id}"))], draft)
            .await
    }

    async fn delete_address(&self, id: &AddressId) -> Result<(), BackendError> {
        self.delete_rows("addresses", &[("id", format!("eq.{id}"))])
            .await
    }

    async fn clear_default_flags(&self, user: &UserId) -> Result<(), BackendError> {
        self.patch(
            "addresses",
            &[("user_id", format!("eq.{user}"))],
            &serde_json::json!({ "is_default": false }),
        )
        .await
    }

    async fn mark_default(&self, id: &AddressId) -> Result<(), BackendError> {
        self.patch(
            "addresses",
            &[("id", format!("eq.{id}"))],
            &serde_json::json!({ "is_default": true }),
        )
        .await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    #[instrument(skip(self, order), fields(order_number = %order.order_number))]
    async fn insert_order(&self, order: &NewOrder) -> Result<Order, BackendError> {
        self.insert_returning("orders", order).await
    }

    async fn insert_order_items(&self, items: &[NewOrderItem]) -> Result<(), BackendError> {
        self.insert("order_items", items).await
    }

    async fn delete_order(&self, id: &OrderId) -> Result<(), BackendError> {
        self.delete_rows("orders", &[("id", format!("eq.{id}"))])
            .await
    }

    async fn list_orders(&self, user: &UserId) -> Result<Vec<Order>, BackendError> {
        self.get_rows(
            "orders",
            &[
                ("select", "*".to_owned()),
                ("user_id", format!("eq.{user}")),
                ("order", "created_at.desc".to_owned()),
            ],
        )
        .await
    }

    async fn recent_orders(&self, limit: u32) -> Result<Vec<Order>, BackendError> {
        self.get_rows(
            "orders",
            &[
                ("select", "*".to_owned()),
                ("order", "created_at.desc".to_owned()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    #[instrument(skip(self), fields(variant = %variant, quantity))]
    async fn adjust_stock(
        &self,
        variant: &VariantId,
        quantity: u32,
    ) -> Result<StockAdjustment, BackendError> {
        self.rpc(
            "decrement_variant_stock",
            &serde_json::json!({
                "p_variant_id": variant,
                "p_quantity": quantity,
            }),
        )
        .await
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    async fn store_stats(&self) -> Result<StoreStats, BackendError> {
        #[derive(Deserialize)]
        struct RevenueRow {
            total_amount: Money,
        }

        let paid: Vec<RevenueRow> = self
            .get_rows(
                "orders",
                &[
                    ("select", "total_amount".to_owned()),
                    ("payment_status", "eq.paid".to_owned()),
                ],
            )
            .await?;
        let total_revenue = paid.into_iter().map(|row| row.total_amount).sum();

        Ok(StoreStats {
            total_revenue,
            total_orders: self.count_rows("orders").await?,
            total_customers: self.count_rows("user_profiles").await?,
            total_products: self.count_rows("products").await?,
        })
    }

    async fn low_stock_variants(
        &self,
        threshold: u32,
        limit: u32,
    ) -> Result<Vec<LowStockVariant>, BackendError> {
        #[derive(Deserialize)]
        struct LowStockRow {
            id: VariantId,
            size: String,
            color: String,
            stock_quantity: u32,
            #[serde(default)]
            product: Option<LowStockProduct>,
        }

        #[derive(Deserialize)]
        struct LowStockProduct {
            name: String,
            #[serde(default)]
            images: Vec<String>,
        }

        let rows: Vec<LowStockRow> = self
            .get_rows(
                "product_variants",
                &[
                    (
                        "select",
                        "id,size,color,stock_quantity,product:products(name,images)".to_owned(),
                    ),
                    ("stock_quantity", format!("lt.{threshold}")),
                    ("is_active", "eq.true".to_owned()),
                    ("order", "stock_quantity.asc".to_owned()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let (product_name, image) = row.product.map_or_else(
                    || ("Unknown Product".to_owned(), None),
                    |p| (p.name, p.images.into_iter().next()),
                );
                LowStockVariant {
                    variant_id: row.id,
                    product_name,
                    size: row.size,
                    color: row.color,
                    stock_quantity: row.stock_quantity,
                    image,
                }
            })
            .collect())
    }
}
