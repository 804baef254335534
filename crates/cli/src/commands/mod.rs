//! Command implementations.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod remote_cart;

use rust_decimal::Decimal;
use subify_core::{CurrencyCode, Price};

/// Format a catalog amount in the store currency.
fn money(amount: Decimal) -> String {
    Price::inr(amount).map_or_else(
        |_| format!("{}{amount:.2}", CurrencyCode::INR.symbol()),
        |price| price.to_string(),
    )
}
