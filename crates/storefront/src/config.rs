//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SUBIFY_API_BASE_URL` - Base URL of the Subify REST API (e.g. `https://api.subify.in/api/v1`)
//!
//! ## Optional
//! - `SUBIFY_CATALOG_BASE_URL` - Product catalog service (default: `https://dummyjson.com`)
//! - `SUBIFY_GEOCODER_BASE_URL` - Reverse geocoding service (default: `https://nominatim.openstreetmap.org`)
//! - `SUBIFY_STORAGE_PATH` - Local storage file (default: `.subify/storage.json`)
//! - `SUBIFY_SESSION_COOKIE` - Session cookie sent to the REST API (e.g. `token=...`)
//! - `SUBIFY_TAX_RATE` - Tax rate applied at checkout as a fraction (default: 0.18)
//! - `SUBIFY_RESET_CORRUPT_CART` - Reset an unreadable persisted cart to empty (default: false)
//! - `SUBIFY_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_CATALOG_BASE_URL: &str = "https://dummyjson.com";
const DEFAULT_GEOCODER_BASE_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_STORAGE_PATH: &str = ".subify/storage.json";
const DEFAULT_TAX_RATE: &str = "0.18";
const DEFAULT_HTTP_TIMEOUT_SECS: &str = "30";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// Subify REST API (users, auth, cart)
    pub api_base_url: Url,
    /// Product catalog service
    pub catalog_base_url: Url,
    /// Reverse geocoding service
    pub geocoder_base_url: Url,
    /// File backing client-local storage
    pub storage_path: PathBuf,
    /// Session cookie forwarded to the REST API
    pub session_cookie: Option<SecretString>,
    /// Tax rate applied to the cart subtotal at checkout
    pub tax_rate: Decimal,
    /// Reset an unreadable persisted cart instead of failing startup
    pub reset_corrupt_cart: bool,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production", "staging")
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("api_base_url", &self.api_base_url.as_str())
            .field("catalog_base_url", &self.catalog_base_url.as_str())
            .field("geocoder_base_url", &self.geocoder_base_url.as_str())
            .field("storage_path", &self.storage_path)
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "[REDACTED]"),
            )
            .field("tax_rate", &self.tax_rate)
            .field("reset_corrupt_cart", &self.reset_corrupt_cart)
            .field("http_timeout", &self.http_timeout)
            .field("sentry_dsn", &self.sentry_dsn)
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_base_url(
            "SUBIFY_API_BASE_URL",
            &get_required_env("SUBIFY_API_BASE_URL")?,
        )?;
        let catalog_base_url = parse_base_url(
            "SUBIFY_CATALOG_BASE_URL",
            &get_env_or_default("SUBIFY_CATALOG_BASE_URL", DEFAULT_CATALOG_BASE_URL),
        )?;
        let geocoder_base_url = parse_base_url(
            "SUBIFY_GEOCODER_BASE_URL",
            &get_env_or_default("SUBIFY_GEOCODER_BASE_URL", DEFAULT_GEOCODER_BASE_URL),
        )?;
        let storage_path =
            PathBuf::from(get_env_or_default("SUBIFY_STORAGE_PATH", DEFAULT_STORAGE_PATH));
        let session_cookie = get_optional_env("SUBIFY_SESSION_COOKIE").map(SecretString::from);
        let tax_rate = parse_tax_rate(&get_env_or_default("SUBIFY_TAX_RATE", DEFAULT_TAX_RATE))?;
        let reset_corrupt_cart = parse_env::<bool>("SUBIFY_RESET_CORRUPT_CART", "false")?;
        let http_timeout = Duration::from_secs(parse_env::<u64>(
            "SUBIFY_HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?);

        Ok(Self {
            api_base_url,
            catalog_base_url,
            geocoder_base_url,
            storage_path,
            session_cookie,
            tax_rate,
            reset_corrupt_cart,
            http_timeout,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration pointing every service at the given base URLs, with
    /// defaults for everything else. Used by tests and embedders.
    #[must_use]
    pub fn with_base_urls(api: Url, catalog: Url, geocoder: Url, storage_path: PathBuf) -> Self {
        Self {
            api_base_url: api,
            catalog_base_url: catalog,
            geocoder_base_url: geocoder,
            storage_path,
            session_cookie: None,
            tax_rate: Decimal::new(18, 2),
            reset_corrupt_cart: false,
            http_timeout: Duration::from_secs(30),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) with `FromStr`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a base URL, normalizing it to end with `/` so `Url::join` appends
/// path segments instead of replacing the last one.
pub(crate) fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Parse a tax rate expressed as a fraction in `[0, 1]`.
fn parse_tax_rate(value: &str) -> Result<Decimal, ConfigError> {
    let rate = value
        .trim()
        .parse::<Decimal>()
        .map_err(|e| ConfigError::InvalidEnvVar("SUBIFY_TAX_RATE".to_string(), e.to_string()))?;
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(ConfigError::InvalidEnvVar(
            "SUBIFY_TAX_RATE".to_string(),
            format!("must be between 0 and 1 (got {rate})"),
        ));
    }
    Ok(rate)
}
