//! Enumerations shared between the client library and its front ends.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentMode {
    #[default]
    #[serde(rename = "Cash On Delivery")]
    CashOnDelivery,
    #[serde(rename = "UPI")]
    Upi,
    #[serde(rename = "Credit Card")]
    CreditCard,
    #[serde(rename = "Net Banking")]
    NetBanking,
}

impl PaymentMode {
    /// Every payment mode, in the order the checkout form offers them.
    pub const ALL: [Self; 4] = [
        Self::CashOnDelivery,
        Self::Upi,
        Self::CreditCard,
        Self::NetBanking,
    ];

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::CashOnDelivery => "Cash On Delivery",
            Self::Upi => "UPI",
            Self::CreditCard => "Credit Card",
            Self::NetBanking => "Net Banking",
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a payment mode name is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown payment mode: {0}")]
pub struct UnknownPaymentMode(pub String);

impl FromStr for PaymentMode {
    type Err = UnknownPaymentMode;

    /// Accepts labels and short forms (`cod`, `upi`, `card`, `netbanking`),
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "cashondelivery" | "cod" | "cash" => Ok(Self::CashOnDelivery),
            "upi" => Ok(Self::Upi),
            "creditcard" | "card" => Ok(Self::CreditCard),
            "netbanking" => Ok(Self::NetBanking),
            _ => Err(UnknownPaymentMode(s.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_cash_on_delivery() {
        assert_eq!(PaymentMode::default(), PaymentMode::CashOnDelivery);
    }

    #[test]
    fn test_parse_labels_and_short_forms() {
        assert_eq!("Credit Card".parse::<PaymentMode>().unwrap(), PaymentMode::CreditCard);
        assert_eq!("net-banking".parse::<PaymentMode>().unwrap(), PaymentMode::NetBanking);
        assert_eq!("COD".parse::<PaymentMode>().unwrap(), PaymentMode::CashOnDelivery);
        assert!("bitcoin".parse::<PaymentMode>().is_err());
    }

    #[test]
    fn test_serde_uses_labels() {
        assert_eq!(serde_json::to_string(&PaymentMode::Upi).unwrap(), "\"UPI\"");
        let mode: PaymentMode = serde_json::from_str("\"Net Banking\"").unwrap();
        assert_eq!(mode, PaymentMode::NetBanking);
    }

    #[test]
    fn test_all_round_trips_through_label() {
        for mode in PaymentMode::ALL {
            assert_eq!(mode.label().parse::<PaymentMode>().unwrap(), mode);
        }
    }
}
