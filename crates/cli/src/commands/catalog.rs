//! Catalog browsing: listing, title search, product detail.

use std::fmt::Write as _;

use subify_core::ProductId;
use subify_storefront::AppState;
use subify_storefront::catalog::Product;
use subify_storefront::error::Result;
use subify_storefront::search;
use tracing::{error, instrument};

use super::money;
use crate::output::Output;

/// List one page of the catalog.
///
/// # Errors
///
/// Returns an error if the catalog cannot be fetched.
#[instrument(skip(state, out))]
pub async fn products(state: &AppState, out: &Output, limit: u32, skip: u32) -> Result<()> {
    let page = state
        .catalog()
        .list_products(limit, skip)
        .await
        .inspect_err(|e| error!(error = %e, "Error fetching products"))?;

    out.emit(&page, || {
        let mut text = product_table(page.products.iter());
        let _ = write!(
            text,
            "\n{} of {} products",
            page.products.len(),
            page.total
        );
        text
    });
    Ok(())
}

/// Case-insensitive title search over the first `limit` catalog products.
///
/// # Errors
///
/// Returns an error if `text` is blank or the catalog cannot be fetched.
#[instrument(skip(state, out))]
pub async fn search(state: &AppState, out: &Output, text: &str, limit: u32) -> Result<()> {
    let page = state.catalog().list_products(limit, 0).await?;
    let matches = search::filter_by_title(&page.products, text)?;

    out.emit(&matches, || {
        if matches.is_empty() {
            "No products found".to_string()
        } else {
            product_table(matches.iter().copied())
        }
    });
    Ok(())
}

/// Show one product in full.
///
/// # Errors
///
/// Returns an error if the product does not exist or the catalog is
/// unreachable.
#[instrument(skip(state, out))]
pub async fn product(state: &AppState, out: &Output, id: ProductId) -> Result<()> {
    let product = state
        .catalog()
        .get_product(id)
        .await
        .inspect_err(|e| error!(error = %e, "Unable to fetch details"))?;

    out.emit(&product, || product_detail(&product));
    Ok(())
}

fn product_table<'a>(products: impl Iterator<Item = &'a Product>) -> String {
    products
        .map(|p| format!("{:>5}  {:<40}  {:>12}", p.id.to_string(), p.title, money(p.price)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn product_detail(product: &Product) -> String {
    let mut text = format!(
        "{}\n{}\n\n{}\n",
        product.title,
        money(product.price),
        product.description
    );
    let _ = writeln!(
        text,
        "\nBrand: {}",
        product.brand.as_deref().unwrap_or("-")
    );
    let _ = writeln!(text, "Category: {}", product.category);
    let _ = writeln!(text, "Rating: {}", product.rating);
    let _ = writeln!(text, "Discount: {}%", product.discount_percentage);
    let _ = write!(text, "Stock: {}", product.stock);
    text
}
