//! Client for the cart kept by the REST API.
//!
//! This cart is separate from the locally persisted one. Lines here are
//! removed by product id, which removes every line for that product on the
//! server side; nothing reconciles the two carts.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use subify_core::ProductId;
use tracing::{instrument, warn};

use crate::api::{ApiClient, ApiError};
use crate::cart::CartItem;

/// A line in the server-side cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCartLine {
    /// Server-assigned line id.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub item: CartItem,
}

#[derive(Debug, Deserialize)]
struct CartItemsResponse {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

impl CartItemsResponse {
    /// Valid lines in server order. Lines that fail validation are logged
    /// and left out.
    fn into_lines(self) -> Vec<RemoteCartLine> {
        self.items
            .into_iter()
            .filter_map(|raw| {
                let line_id = raw
                    .get("_id")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_owned);
                serde_json::from_value::<RemoteCartLine>(raw)
                    .inspect_err(|error| {
                        warn!(%error, line_id = ?line_id, "Skipping invalid remote cart line");
                    })
                    .ok()
            })
            .collect()
    }
}

#[derive(Serialize)]
struct AddItemRequest<'a> {
    item: &'a CartItem,
}

/// Client for `/cart`.
#[derive(Clone)]
pub struct RemoteCartClient {
    api: ApiClient,
}

impl RemoteCartClient {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// List the server-side cart (`GET /cart/item`).
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-success status, or a body
    /// that is not an items list. Individual lines that fail validation are
    /// skipped.
    #[instrument(skip(self))]
    pub async fn items(&self) -> Result<Vec<RemoteCartLine>, ApiError> {
        let request = self.api.request(Method::GET, "cart/item")?;
        let response: CartItemsResponse = self.api.send_json(request).await?;
        Ok(response.into_lines())
    }

    /// Add a line (`POST /cart/add` with `{ "item": ... }`).
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or non-success status.
    #[instrument(skip(self, item), fields(product_id = %item.product_id()))]
    pub async fn add(&self, item: &CartItem) -> Result<(), ApiError> {
        let request = self
            .api
            .request(Method::POST, "cart/add")?
            .json(&AddItemRequest { item });
        self.api.send_text(request).await?;
        Ok(())
    }

    /// Remove a product (`DELETE /cart/remove/{productId}`).
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or non-success status.
    #[instrument(skip(self))]
    pub async fn remove(&self, product_id: ProductId) -> Result<(), ApiError> {
        let request = self
            .api
            .request(Method::DELETE, &format!("cart/remove/{product_id}"))?;
        self.api.send_text(request).await?;
        Ok(())
    }
}

/// Sum of line prices, as shown under the server-side cart.
#[must_use]
pub fn total(lines: &[RemoteCartLine]) -> rust_decimal::Decimal {
    lines.iter().map(|line| line.item.price().amount()).sum()
}
