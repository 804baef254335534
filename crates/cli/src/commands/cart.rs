//! The local cart: lines live in the state container and persist to local
//! storage.

use serde::Serialize;
use subify_core::ProductId;
use subify_storefront::AppState;
use subify_storefront::cart::CartItem;
use subify_storefront::checkout::CartSummary;
use subify_storefront::error::{AppError, Result};
use tracing::{error, instrument};

use crate::output::Output;

#[derive(Serialize)]
struct CartReport<'a> {
    items: &'a [CartItem],
    summary: CartSummary,
}

/// Show cart lines with their positions, then the totals.
///
/// # Errors
///
/// Returns an error if the configured tax rate is out of range.
#[instrument(skip_all)]
pub async fn show(state: &AppState, out: &Output) -> Result<()> {
    let context = state.context();
    let items = context.current_view().await.cart;
    let summary = context.cart_summary(state.config().tax_rate).await?;

    out.emit(
        &CartReport {
            items: &items,
            summary,
        },
        || render(&items, &summary),
    );
    Ok(())
}

/// Fetch a product from the catalog and append it to the cart.
///
/// # Errors
///
/// Returns an error if the product cannot be fetched or fails cart
/// validation.
#[instrument(skip(state, out))]
pub async fn add(state: &AppState, out: &Output, product_id: ProductId) -> Result<()> {
    let item = match fetch_item(state, product_id).await {
        Ok(item) => item,
        Err(e) => {
            error!(error = %e, "Error adding to cart");
            state
                .notifications()
                .error("Failed to add product to cart.", None);
            return Err(e);
        }
    };

    let title = item.title().to_string();
    state.context().add_to_cart(item.clone()).await;
    state.notifications().success(format!("{title} added to cart!"));

    let count = state.context().cart_len().await;
    out.emit(&item, || format!("{count} items in cart"));
    Ok(())
}

/// Remove the line at `index`.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if no line sits at `index`; the cart is
/// left unchanged.
#[instrument(skip(state, out))]
pub async fn remove(state: &AppState, out: &Output, index: usize) -> Result<()> {
    let Some(removed) = state.context().remove_from_cart(index).await else {
        return Err(AppError::BadRequest(format!(
            "no cart line at position {index}"
        )));
    };

    out.emit(&removed, || format!("Removed {}", removed.title()));
    Ok(())
}

async fn fetch_item(state: &AppState, product_id: ProductId) -> Result<CartItem> {
    let product = state.catalog().get_product(product_id).await?;
    Ok(product.to_cart_item()?)
}

fn render(items: &[CartItem], summary: &CartSummary) -> String {
    if items.is_empty() {
        return "Your cart is empty".to_string();
    }

    let mut lines: Vec<String> = items
        .iter()
        .enumerate()
        .map(|(position, item)| {
            format!(
                "{position:>3}  {:<40}  {:>12}",
                item.title(),
                item.price().to_string()
            )
        })
        .collect();
    lines.push(String::new());
    lines.push(format!("Items:    {}", summary.item_count));
    lines.push(format!("Subtotal: {}", summary.subtotal));
    lines.push(format!("Tax:      {}", summary.tax));
    lines.push(format!("Total:    {}", summary.grand_total));
    lines.join("\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use subify_storefront::checkout;

    use super::*;

    fn item(id: i64, price: i64) -> CartItem {
        CartItem::new(
            ProductId::new(id),
            &format!("Product {id}"),
            Decimal::from(price),
            &format!("https://cdn.dummyjson.com/products/{id}/thumbnail.png"),
        )
        .unwrap()
    }

    #[test]
    fn test_render_positions_and_totals() {
        let items = vec![item(1, 10), item(2, 20)];
        let summary = checkout::summarize(&items, Decimal::new(18, 2)).unwrap();
        let text = render(&items, &summary);

        assert!(text.starts_with("  0  Product 1"));
        assert!(text.contains("  1  Product 2"));
        assert!(text.contains("Subtotal: ₹30.00"));
        assert!(text.contains("Tax:      ₹5.40"));
        assert!(text.ends_with("Total:    ₹35.40"));
    }

    #[test]
    fn test_render_empty() {
        let summary = checkout::summarize(&[], Decimal::new(18, 2)).unwrap();
        assert_eq!(render(&[], &summary), "Your cart is empty");
    }
}
