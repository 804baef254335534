//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type for front ends. Errors from external
//! services and local storage are captured to Sentry by [`AppError::report`];
//! validation errors are the user's to fix and are not captured.

use thiserror::Error;

use crate::api::ApiError;
use crate::cart::{CartItemError, CartStoreError};
use crate::catalog::CatalogError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::geocoder::CoordinatesError;
use crate::search::SearchError;
use crate::storage::StorageError;

/// Application-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Local storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The persisted cart could not be read or written.
    #[error("Cart store error: {0}")]
    CartStore(#[from] CartStoreError),

    /// Subify REST API operation failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Product catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// A cart item failed validation.
    #[error("Invalid cart item: {0}")]
    CartItem(#[from] CartItemError),

    /// Search input was rejected.
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Checkout input was rejected.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Coordinates were out of range.
    #[error("Invalid coordinates: {0}")]
    Coordinates(#[from] CoordinatesError),

    /// An HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Input the user supplied was invalid.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Whether this error is a local validation failure rather than a
    /// failure of storage or an external service.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::CartItem(_)
                | Self::Search(_)
                | Self::Checkout(_)
                | Self::Coordinates(_)
                | Self::BadRequest(_)
        )
    }

    /// Log the error and, unless it is a validation failure, capture it to
    /// Sentry.
    pub fn report(&self) {
        if self.is_validation() {
            tracing::warn!(error = %self, "Rejected input");
            return;
        }

        let event_id = sentry::capture_error(self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Operation failed"
        );
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after a successful bootstrap.
pub fn set_sentry_user(user_id: Option<&str>, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: user_id.map(ToString::to_string),
            email: email.map(ToString::to_string),
            ..Default::default()
        }));
    });
}
