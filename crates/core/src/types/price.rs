//! Type-safe price representation using decimal arithmetic.
//!
//! Catalog prices arrive as JSON numbers (e.g. `9.99`). They are converted to
//! [`Decimal`] once at the boundary so that cart totals and tax are computed
//! exactly. The store sells in Indian rupees.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
}

/// A non-negative price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., rupees, not paise).
    amount: Decimal,
    /// ISO 4217 currency code.
    currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `amount` is below zero.
    pub fn new(amount: Decimal, currency_code: CurrencyCode) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self {
            amount,
            currency_code,
        })
    }

    /// Create a price in the store's default currency.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `amount` is below zero.
    pub fn inr(amount: Decimal) -> Result<Self, PriceError> {
        Self::new(amount, CurrencyCode::INR)
    }

    /// Zero in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency_code,
        }
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// The currency.
    #[must_use]
    pub const fn currency_code(&self) -> CurrencyCode {
        self.currency_code
    }

    /// Amount rounded half-away-from-zero to two decimal places.
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        self.amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:.2}", self.currency_code.symbol(), self.rounded())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// Three-letter ISO code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::INR => "INR",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative() {
        let result = Price::inr(Decimal::new(-1, 2));
        assert!(matches!(result, Err(PriceError::Negative(_))));
    }

    #[test]
    fn test_accepts_zero() {
        assert_eq!(
            Price::inr(Decimal::ZERO).unwrap(),
            Price::zero(CurrencyCode::INR)
        );
    }

    #[test]
    fn test_display_rounds_to_two_places() {
        let price = Price::inr(Decimal::new(19_995, 3)).unwrap();
        assert_eq!(price.to_string(), "₹20.00");

        let price = Price::new(Decimal::new(999, 2), CurrencyCode::USD).unwrap();
        assert_eq!(price.to_string(), "$9.99");
    }

    #[test]
    fn test_currency_codes() {
        assert_eq!(CurrencyCode::default(), CurrencyCode::INR);
        assert_eq!(CurrencyCode::GBP.code(), "GBP");
        assert_eq!(CurrencyCode::EUR.symbol(), "€");
    }
}
