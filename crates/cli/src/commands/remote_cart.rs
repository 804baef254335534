//! The cart kept by the Subify API for the signed-in user.

use serde::Serialize;
use subify_core::ProductId;
use subify_storefront::AppState;
use subify_storefront::error::{AppError, Result};
use subify_storefront::remote_cart::{self, RemoteCartLine};
use tracing::{error, instrument};

use super::money;
use crate::output::Output;

#[derive(Serialize)]
struct RemoteCartReport<'a> {
    items: &'a [RemoteCartLine],
    total: rust_decimal::Decimal,
}

/// Show the server-side cart and its total.
///
/// # Errors
///
/// Returns an error if the cart cannot be fetched.
#[instrument(skip_all)]
pub async fn show(state: &AppState, out: &Output) -> Result<()> {
    let items = state
        .remote_cart()
        .items()
        .await
        .inspect_err(|e| error!(error = %e, "Error fetching cart items"))?;
    let total = remote_cart::total(&items);

    out.emit(
        &RemoteCartReport {
            items: &items,
            total,
        },
        || {
            if items.is_empty() {
                return "Your cart is empty".to_string();
            }
            let mut lines: Vec<String> = items
                .iter()
                .map(|line| {
                    format!(
                        "{:>5}  {:<40}  {:>12}",
                        line.item.product_id().to_string(),
                        line.item.title(),
                        line.item.price().to_string()
                    )
                })
                .collect();
            lines.push(format!("\nTotal: {}", money(total)));
            lines.join("\n")
        },
    );
    Ok(())
}

/// Add a catalog product to the server-side cart.
///
/// # Errors
///
/// Returns an error if the product cannot be fetched or the API rejects the
/// item.
#[instrument(skip(state, out))]
pub async fn add(state: &AppState, out: &Output, product_id: ProductId) -> Result<()> {
    let result = async {
        let product = state.catalog().get_product(product_id).await?;
        let item = product.to_cart_item()?;
        state.remote_cart().add(&item).await?;
        Ok::<_, AppError>(item)
    }
    .await;

    match result {
        Ok(item) => {
            state
                .notifications()
                .success(format!("{} added to cart!", item.title()));
            out.emit(&item, || format!("Added {}", item.title()));
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Error adding to cart");
            state
                .notifications()
                .error("Failed to add product to cart.", None);
            Err(e)
        }
    }
}

/// Remove a product from the server-side cart.
///
/// # Errors
///
/// Returns an error if the API call fails.
#[instrument(skip(state, out))]
pub async fn remove(state: &AppState, out: &Output, product_id: ProductId) -> Result<()> {
    state
        .remote_cart()
        .remove(product_id)
        .await
        .inspect_err(|e| error!(error = %e, "Error removing item"))?;

    out.emit(&product_id, || format!("Removed product {product_id}"));
    Ok(())
}
