//! HTTP plumbing shared by the Subify REST API clients.
//!
//! The REST API authenticates with a session cookie. The web client relied on
//! the browser cookie jar; here the cookie comes from configuration and is
//! attached to every request as a sensitive default header.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::StorefrontConfig;

/// Longest slice of an error body kept in [`ApiError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Errors from the Subify REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connect, timeout, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// The server answered `isSuccess: false`.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A request URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// A local file needed for the request could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configured session cookie is not a valid header value.
    #[error("invalid session cookie")]
    InvalidCookie,
}

impl ApiError {
    /// The message a notification should show: the server's own message when
    /// it sent one, otherwise the error text.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } | Self::Rejected(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

/// `{ isSuccess, data, message }` envelope used by the user endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub is_success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap the payload of a successful envelope.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` if `isSuccess` is false or `data` is absent.
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.is_success {
            return Err(ApiError::Rejected(
                self.message
                    .unwrap_or_else(|| "request was not successful".to_string()),
            ));
        }
        self.data
            .ok_or_else(|| ApiError::Rejected("response has no data".to_string()))
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Client for the Subify REST API. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cookie is not a valid header value or
    /// the HTTP client fails to build.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        Self::with_session(
            config.api_base_url.clone(),
            config.session_cookie.as_ref(),
            config.http_timeout,
        )
    }

    /// Build a client for `base_url`, optionally sending `session_cookie`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cookie is not a valid header value or
    /// the HTTP client fails to build.
    pub fn with_session(
        base_url: Url,
        session_cookie: Option<&SecretString>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = session_cookie {
            let mut value = HeaderValue::from_str(cookie.expose_secret())
                .map_err(|_| ApiError::InvalidCookie)?;
            value.set_sensitive(true);
            headers.insert(COOKIE, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner { client, base_url }),
        })
    }

    /// The API base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Start a request to `path`, relative to the base URL.
    pub(crate) fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.inner.base_url.join(path.trim_start_matches('/'))?;
        Ok(self.inner.client.request(method, url))
    }

    /// Send a request and decode a JSON body from a success response.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let text = self.send_text(request).await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Parse(e.to_string())
        })
    }

    /// Send a request and return the body of a success response.
    pub(crate) async fn send_text(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| text.chars().take(MAX_ERROR_BODY_CHARS).collect());
            tracing::warn!(status = %status, message = %message, "API returned non-success status");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(text)
    }
}
