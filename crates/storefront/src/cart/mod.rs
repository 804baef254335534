//! Cart line items and their client-side persistence.
//!
//! A [`CartItem`] is a snapshot of a catalog product taken at add-to-cart
//! time. It is validated whenever it crosses a boundary: built from a catalog
//! product, read back from local storage, or returned by the REST API.

mod store;
mod writer;

pub use store::{CART_STORAGE_KEY, CartStore, CartStoreError, CorruptCartPolicy};
pub(crate) use writer::CartWriter;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use subify_core::{Price, PriceError, ProductId};
use thiserror::Error;
use url::Url;

/// Reasons a cart item snapshot is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartItemError {
    #[error("product id must be positive (got {0})")]
    InvalidProductId(ProductId),
    #[error("title cannot be empty")]
    EmptyTitle,
    #[error("invalid price: {0}")]
    InvalidPrice(#[from] PriceError),
    #[error("price {0} cannot be stored as a JSON number without loss")]
    UnrepresentablePrice(Decimal),
    #[error("thumbnail must be an absolute http(s) URL (got {0:?})")]
    InvalidThumbnail(String),
}

/// A validated product snapshot held in the cart.
///
/// Serialized in the camelCase shape the storefront has always written to
/// local storage, with `price` as a JSON number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawCartItem")]
pub struct CartItem {
    product_id: ProductId,
    title: String,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
    thumbnail: String,
}

/// Unvalidated wire form of a [`CartItem`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCartItem {
    pub product_id: ProductId,
    pub title: String,
    pub price: Decimal,
    pub thumbnail: String,
}

impl CartItem {
    /// Validate and build a cart item.
    ///
    /// The price is rounded to paise (two decimal places, half away from
    /// zero) so that the stored JSON number reads back as the same value.
    ///
    /// # Errors
    ///
    /// Returns `CartItemError` if the product id is not positive, the title is
    /// blank, the price is negative or too large to survive an `f64`, or the
    /// thumbnail is not an http(s) URL.
    pub fn new(
        product_id: ProductId,
        title: impl Into<String>,
        price: Decimal,
        thumbnail: impl Into<String>,
    ) -> Result<Self, CartItemError> {
        if product_id.as_i64() <= 0 {
            return Err(CartItemError::InvalidProductId(product_id));
        }

        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(CartItemError::EmptyTitle);
        }

        let price = price
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .normalize();
        Price::inr(price)?;
        if !survives_json_number(price) {
            return Err(CartItemError::UnrepresentablePrice(price));
        }

        let thumbnail = thumbnail.into();
        match Url::parse(&thumbnail) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => return Err(CartItemError::InvalidThumbnail(thumbnail)),
        }

        Ok(Self {
            product_id,
            title,
            price,
            thumbnail,
        })
    }

    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Unit price in the store currency.
    #[must_use]
    pub fn price(&self) -> Price {
        // Validated non-negative at construction.
        Price::inr(self.price).unwrap_or(Price::zero(subify_core::CurrencyCode::INR))
    }

    #[must_use]
    pub fn thumbnail(&self) -> &str {
        &self.thumbnail
    }
}

impl TryFrom<RawCartItem> for CartItem {
    type Error = CartItemError;

    fn try_from(raw: RawCartItem) -> Result<Self, Self::Error> {
        Self::new(raw.product_id, raw.title, raw.price, raw.thumbnail)
    }
}

/// Whether `price` reads back unchanged after the `f64` trip through JSON.
fn survives_json_number(price: Decimal) -> bool {
    price
        .to_f64()
        .and_then(|float| float.to_string().parse::<Decimal>().ok())
        == Some(price)
}

/// Sum of unit prices. Each line is one unit; duplicates are separate lines.
#[must_use]
pub fn subtotal(items: &[CartItem]) -> Decimal {
    items.iter().map(|item| item.price).sum()
}

/// Positions of every line holding `product_id`.
///
/// Local removal is positional while the REST cart removes by product id;
/// this shows a caller which local lines a remote removal corresponds to.
#[must_use]
pub fn positions_of(items: &[CartItem], product_id: ProductId) -> Vec<usize> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.product_id == product_id)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn item(id: i64, price: i64) -> CartItem {
        CartItem::new(
            ProductId::new(id),
            format!("Product {id}"),
            Decimal::from(price),
            format!("https://cdn.dummyjson.com/products/{id}/thumbnail.png"),
        )
        .unwrap()
    }

    #[test]
    fn test_new_trims_title() {
        let item = CartItem::new(
            ProductId::new(1),
            "  Essence Mascara  ",
            Decimal::new(999, 2),
            "https://cdn.dummyjson.com/1.png",
        )
        .unwrap();
        assert_eq!(item.title(), "Essence Mascara");
        assert_eq!(item.price().to_string(), "₹9.99");
    }

    #[test]
    fn test_new_rejects_invalid_fields() {
        let thumb = "https://cdn.dummyjson.com/1.png";
        assert_eq!(
            CartItem::new(ProductId::new(0), "x", Decimal::ONE, thumb),
            Err(CartItemError::InvalidProductId(ProductId::new(0)))
        );
        assert_eq!(
            CartItem::new(ProductId::new(1), "   ", Decimal::ONE, thumb),
            Err(CartItemError::EmptyTitle)
        );
        assert!(matches!(
            CartItem::new(ProductId::new(1), "x", Decimal::NEGATIVE_ONE, thumb),
            Err(CartItemError::InvalidPrice(_))
        ));
        assert!(matches!(
            CartItem::new(ProductId::new(1), "x", Decimal::ONE, "thumbnail.png"),
            Err(CartItemError::InvalidThumbnail(_))
        ));
        assert!(matches!(
            CartItem::new(ProductId::new(1), "x", Decimal::ONE, "ftp://host/x.png"),
            Err(CartItemError::InvalidThumbnail(_))
        ));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(item(1, 10)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "productId": 1,
                "title": "Product 1",
                "price": 10.0,
                "thumbnail": "https://cdn.dummyjson.com/products/1/thumbnail.png",
            })
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: CartItem = serde_json::from_str(
            r#"{"productId":5,"title":"Lamp","price":12.5,"thumbnail":"https://x.io/l.png"}"#,
        )
        .unwrap();
        assert_eq!(ok.price().amount(), Decimal::new(125, 1));

        let bad = serde_json::from_str::<CartItem>(
            r#"{"productId":5,"title":"","price":12.5,"thumbnail":"https://x.io/l.png"}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_price_rounds_to_paise() {
        let thumb = "https://cdn.dummyjson.com/1.png";
        let long: Decimal = "12.3456789012345678".parse().unwrap();
        let item = CartItem::new(ProductId::new(1), "Serum", long, thumb).unwrap();
        assert_eq!(item.price().amount(), Decimal::new(1235, 2));

        let half: Decimal = "0.125".parse().unwrap();
        let item = CartItem::new(ProductId::new(1), "Serum", half, thumb).unwrap();
        assert_eq!(item.price().amount(), Decimal::new(13, 2));
    }

    #[test]
    fn test_fractional_prices_survive_json() {
        let thumb = "https://cdn.dummyjson.com/1.png";
        for raw in ["12.3456789012345678", "9.99", "0.1", "1249.5", "0.3"] {
            let item =
                CartItem::new(ProductId::new(3), "Serum", raw.parse().unwrap(), thumb).unwrap();
            let json = serde_json::to_string(&item).unwrap();
            let back: CartItem = serde_json::from_str(&json).unwrap();
            assert_eq!(back, item, "{raw} via {json}");
        }
    }

    #[test]
    fn test_price_beyond_f64_precision_is_rejected() {
        let huge: Decimal = "12345678901234567.89".parse().unwrap();
        assert!(matches!(
            CartItem::new(ProductId::new(1), "x", huge, "https://x.io/a.png"),
            Err(CartItemError::UnrepresentablePrice(_))
        ));
    }

    #[test]
    fn test_subtotal_counts_duplicate_lines() {
        let items = vec![item(1, 10), item(2, 20), item(1, 10)];
        assert_eq!(subtotal(&items), Decimal::from(40));
        assert_eq!(subtotal(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_positions_of() {
        let items = vec![item(1, 10), item(2, 20), item(1, 10)];
        assert_eq!(positions_of(&items, ProductId::new(1)), vec![0, 2]);
        assert!(positions_of(&items, ProductId::new(9)).is_empty());
    }
}
