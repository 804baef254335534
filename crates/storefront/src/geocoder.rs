//! Reverse geocoding for the delivery address field.
//!
//! Uses OpenStreetMap Nominatim's `/reverse` endpoint. Lookup failures of any
//! kind produce [`ADDRESS_NOT_FOUND`] so the checkout form always gets text.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{instrument, warn};
use url::Url;

/// Text returned when no address can be resolved.
pub const ADDRESS_NOT_FOUND: &str = "Address not found";

/// Nominatim's usage policy requires an identifying user agent.
const USER_AGENT: &str = concat!("subify-storefront/", env!("CARGO_PKG_VERSION"));

/// Coordinates rejected before any lookup.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinatesError {
    #[error("latitude must be within [-90, 90] (got {0})")]
    Latitude(f64),
    #[error("longitude must be within [-180, 180] (got {0})")]
    Longitude(f64),
}

/// A validated WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// # Errors
    ///
    /// Returns `CoordinatesError` if either value is out of range or not finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinatesError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinatesError::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinatesError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
}

/// Reverse geocoding client.
#[derive(Clone)]
pub struct Geocoder {
    client: reqwest::Client,
    base_url: Url,
}

impl Geocoder {
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, base_url })
    }

    /// Human-readable address for `coordinates`, or [`ADDRESS_NOT_FOUND`].
    #[instrument(skip(self))]
    pub async fn reverse(&self, coordinates: Coordinates) -> String {
        match self.lookup(coordinates).await {
            Ok(Some(address)) => address,
            Ok(None) => ADDRESS_NOT_FOUND.to_string(),
            Err(e) => {
                warn!(error = %e, "Reverse geocoding failed");
                ADDRESS_NOT_FOUND.to_string()
            }
        }
    }

    async fn lookup(&self, coordinates: Coordinates) -> Result<Option<String>, LookupError> {
        let mut url = self.base_url.join("reverse")?;
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("lat", &coordinates.latitude.to_string())
            .append_pair("lon", &coordinates.longitude.to_string());

        let response = self.client.get(url).send().await?.error_for_status()?;
        let body: ReverseResponse = response.json().await?;
        Ok(body.display_name.filter(|name| !name.trim().is_empty()))
    }
}

#[derive(Debug, Error)]
enum LookupError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_range() {
        assert!(Coordinates::new(12.97, 77.59).is_ok());
        assert!(Coordinates::new(-90.0, 180.0).is_ok());
        assert_eq!(
            Coordinates::new(91.0, 0.0),
            Err(CoordinatesError::Latitude(91.0))
        );
        assert_eq!(
            Coordinates::new(0.0, -180.5),
            Err(CoordinatesError::Longitude(-180.5))
        );
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_response_without_name() {
        let body: ReverseResponse =
            serde_json::from_str(r#"{"error":"Unable to geocode"}"#).unwrap();
        assert!(body.display_name.is_none());
    }
}
