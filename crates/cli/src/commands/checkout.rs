//! Order placement for the local cart.

use subify_core::PaymentMode;
use subify_storefront::AppState;
use subify_storefront::checkout::OrderDraft;
use subify_storefront::error::Result;
use subify_storefront::geocoder::Coordinates;
use tracing::{info, instrument};

use crate::output::Output;

/// Where the order is delivered.
#[derive(Debug, Clone, PartialEq)]
pub enum Destination {
    /// Address typed by the user.
    Address(String),
    /// Position to reverse-geocode into an address.
    Locate { lat: f64, lon: f64 },
}

/// Place an order for the current cart. The cart itself is left as is.
///
/// # Errors
///
/// Returns an error if the cart is empty, the coordinates are out of range,
/// or the resolved address is blank.
#[instrument(skip(state, out))]
pub async fn place_order(
    state: &AppState,
    out: &Output,
    destination: Destination,
    payment_mode: PaymentMode,
) -> Result<()> {
    let summary = state
        .context()
        .cart_summary(state.config().tax_rate)
        .await?;
    let draft = OrderDraft::for_summary(&summary)?;

    let address = match destination {
        Destination::Address(address) => address,
        Destination::Locate { lat, lon } => {
            let address = state
                .geocoder()
                .reverse(Coordinates::new(lat, lon)?)
                .await;
            info!(%address, "Resolved delivery address");
            address
        }
    };

    let confirmation = draft
        .with_address(address)
        .with_payment_mode(payment_mode)
        .confirm()?;

    out.emit(&confirmation, || confirmation.to_string());
    Ok(())
}
