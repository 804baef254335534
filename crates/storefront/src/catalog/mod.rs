//! Product catalog client.
//!
//! Read-only access to the public product catalog (`dummyjson.com` shape):
//! paged listings and single-product details. Responses are cached in memory
//! with `moka` for five minutes, keyed by what was asked for.

mod cache;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use subify_core::{Price, PriceError, ProductId};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::cart::{CartItem, CartItemError};
use cache::{CacheKey, CacheValue};

/// Page size the home page asks for.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Errors from the catalog service.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("catalog returned HTTP {0}")]
    Status(u16),

    /// Product not found.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A request URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub price: Decimal,
    #[serde(default)]
    pub discount_percentage: f64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub images: Vec<String>,
}

impl Product {
    /// Listed price in the store currency.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if the catalog lists a negative price.
    pub fn price(&self) -> Result<Price, PriceError> {
        Price::inr(self.price)
    }

    /// Snapshot this product as a cart line.
    ///
    /// # Errors
    ///
    /// Returns `CartItemError` if the catalog record fails cart validation.
    pub fn to_cart_item(&self) -> Result<CartItem, CartItemError> {
        CartItem::new(self.id, &self.title, self.price, &self.thumbnail)
    }
}

/// One page of a product listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub skip: u32,
    #[serde(default)]
    pub limit: u32,
}

/// Client for the product catalog. Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogClient {
    /// Create a catalog client for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, CatalogError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client,
                base_url,
                cache,
            }),
        })
    }

    /// List products (`GET /products?limit=&skip=`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    #[instrument(skip(self))]
    pub async fn list_products(&self, limit: u32, skip: u32) -> Result<ProductPage, CatalogError> {
        let cache_key = CacheKey::Products { limit, skip };
        if let Some(CacheValue::Products(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product listing");
            return Ok(page);
        }

        let mut url = self.inner.base_url.join("products")?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("skip", &skip.to_string());

        let body = self.get(url).await?.ok_or(CatalogError::Status(404))?;
        let page: ProductPage = serde_json::from_str(&body)?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(page.clone()))
            .await;

        Ok(page)
    }

    /// Fetch one product (`GET /products/{id}`).
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for unknown ids, or an error if the
    /// request fails or the response cannot be parsed.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let cache_key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.inner.base_url.join(&format!("products/{id}"))?;
        let body = self.get(url).await?.ok_or(CatalogError::NotFound(id))?;
        let product: Product = serde_json::from_str(&body)?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// GET a URL. `Ok(None)` means 404.
    async fn get(&self, url: Url) -> Result<Option<String>, CatalogError> {
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            tracing::error!(status = %status, "Catalog returned non-success status");
            return Err(CatalogError::Status(status.as_u16()));
        }

        Ok(Some(response.text().await?))
    }
}
