//! Cart totals and order placement.
//!
//! Orders are confirmed locally: the REST API has no order endpoint, so a
//! confirmed order is a receipt for the front end to show.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use subify_core::{CurrencyCode, PaymentMode, Price};
use thiserror::Error;
use uuid::Uuid;

use crate::cart::{self, CartItem};

/// Checkout input rejected locally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("delivery address cannot be empty")]
    EmptyAddress,
    #[error("tax rate must be between 0 and 1 (got {0})")]
    InvalidTaxRate(Decimal),
}

/// Totals shown on the cart page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub item_count: usize,
    pub subtotal: Price,
    pub tax: Price,
    pub grand_total: Price,
}

/// Compute subtotal, tax and grand total. Tax is rounded to two places,
/// half away from zero.
///
/// # Errors
///
/// Returns `CheckoutError::InvalidTaxRate` if `tax_rate` is outside `[0, 1]`.
pub fn summarize(items: &[CartItem], tax_rate: Decimal) -> Result<CartSummary, CheckoutError> {
    if tax_rate < Decimal::ZERO || tax_rate > Decimal::ONE {
        return Err(CheckoutError::InvalidTaxRate(tax_rate));
    }

    let subtotal = cart::subtotal(items);
    let tax = (subtotal * tax_rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    Ok(CartSummary {
        item_count: items.len(),
        subtotal: inr(subtotal),
        tax: inr(tax),
        grand_total: inr(subtotal + tax),
    })
}

/// Non-negative sums of validated prices.
fn inr(amount: Decimal) -> Price {
    Price::inr(amount).unwrap_or(Price::zero(CurrencyCode::INR))
}

/// An order being filled in on the checkout page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub address: String,
    pub payment_mode: PaymentMode,
    pub grand_total: Price,
}

impl OrderDraft {
    /// Start a draft for a cart summary, paying cash on delivery.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if the summary has no items.
    pub fn for_summary(summary: &CartSummary) -> Result<Self, CheckoutError> {
        if summary.item_count == 0 {
            return Err(CheckoutError::EmptyCart);
        }
        Ok(Self {
            address: String::new(),
            payment_mode: PaymentMode::default(),
            grand_total: summary.grand_total,
        })
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    #[must_use]
    pub const fn with_payment_mode(mut self, payment_mode: PaymentMode) -> Self {
        self.payment_mode = payment_mode;
        self
    }

    /// Place the order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyAddress` if the address is blank.
    pub fn confirm(self) -> Result<OrderConfirmation, CheckoutError> {
        let address = self.address.trim().to_string();
        if address.is_empty() {
            return Err(CheckoutError::EmptyAddress);
        }

        let confirmation = OrderConfirmation {
            order_id: Uuid::new_v4(),
            placed_at: Utc::now(),
            address,
            payment_mode: self.payment_mode,
            grand_total: self.grand_total,
        };
        tracing::info!(
            order_id = %confirmation.order_id,
            payment_mode = %confirmation.payment_mode,
            grand_total = %confirmation.grand_total,
            "Order placed"
        );
        Ok(confirmation)
    }
}

/// Receipt for a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_id: Uuid,
    pub placed_at: DateTime<Utc>,
    pub address: String,
    pub payment_mode: PaymentMode,
    pub grand_total: Price,
}

impl std::fmt::Display for OrderConfirmation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Order Placed!\nAddress: {}\nPayment: {}\nTotal: {}",
            self.address, self.payment_mode, self.grand_total
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::tests::item;

    #[test]
    fn test_summary_math() {
        let items = vec![item(1, 10), item(2, 20)];
        let summary = summarize(&items, Decimal::new(18, 2)).unwrap();

        assert_eq!(summary.item_count, 2);
        assert_eq!(summary.subtotal.amount(), Decimal::from(30));
        assert_eq!(summary.tax.amount(), Decimal::new(540, 2));
        assert_eq!(summary.grand_total.to_string(), "₹35.40");
    }

    #[test]
    fn test_tax_rounds_half_away_from_zero() {
        let items = vec![
            CartItem::new(
                subify_core::ProductId::new(1),
                "Gum",
                Decimal::new(25, 2),
                "https://x.io/g.png",
            )
            .unwrap(),
        ];
        // 0.25 * 0.10 = 0.025
        let summary = summarize(&items, Decimal::new(10, 2)).unwrap();
        assert_eq!(summary.tax.amount(), Decimal::new(3, 2));
    }

    #[test]
    fn test_empty_cart_summary_is_zero() {
        let summary = summarize(&[], Decimal::new(18, 2)).unwrap();
        assert_eq!(summary.grand_total.amount(), Decimal::ZERO);
        assert_eq!(
            OrderDraft::for_summary(&summary),
            Err(CheckoutError::EmptyCart)
        );
    }

    #[test]
    fn test_rejects_out_of_range_tax() {
        assert!(matches!(
            summarize(&[], Decimal::TWO),
            Err(CheckoutError::InvalidTaxRate(_))
        ));
    }

    #[test]
    fn test_confirm_requires_address() {
        let summary = summarize(&[item(1, 10)], Decimal::ZERO).unwrap();
        let draft = OrderDraft::for_summary(&summary).unwrap().with_address("  ");
        assert_eq!(draft.confirm(), Err(CheckoutError::EmptyAddress));
    }

    #[test]
    fn test_confirm_builds_receipt() {
        let summary = summarize(&[item(1, 10)], Decimal::ZERO).unwrap();
        let confirmation = OrderDraft::for_summary(&summary)
            .unwrap()
            .with_address(" 221B Baker Street ")
            .with_payment_mode(PaymentMode::Upi)
            .confirm()
            .unwrap();

        assert_eq!(confirmation.address, "221B Baker Street");
        assert_eq!(
            confirmation.to_string(),
            "Order Placed!\nAddress: 221B Baker Street\nPayment: UPI\nTotal: ₹10.00"
        );
    }
}
