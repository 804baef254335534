//! Client for the user and auth endpoints.
//!
//! One round trip per call. No retries and no caching.

use std::path::Path;

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::instrument;

use super::User;
use crate::api::{ApiClient, ApiEnvelope, ApiError};

/// Multipart field name the upload endpoint expects.
const DISPLAY_PICTURE_FIELD: &str = "displayPicture";

#[derive(Debug, Deserialize)]
struct UserData {
    user: User,
}

/// Client for `/users` and `/auth`.
#[derive(Clone)]
pub struct SessionClient {
    api: ApiClient,
}

impl SessionClient {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Fetch the signed-in user (`GET /users`).
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-success status, or an
    /// `isSuccess: false` envelope.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<User, ApiError> {
        let request = self.api.request(Method::GET, "users")?;
        let envelope: ApiEnvelope<UserData> = self.api.send_json(request).await?;
        Ok(envelope.into_data()?.user)
    }

    /// Fetch the full profile shown on the profile page (`GET /users/details`).
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-success status, or an
    /// `isSuccess: false` envelope.
    #[instrument(skip(self))]
    pub async fn user_details(&self) -> Result<User, ApiError> {
        let request = self.api.request(Method::GET, "users/details")?;
        let envelope: ApiEnvelope<UserData> = self.api.send_json(request).await?;
        Ok(envelope.into_data()?.user)
    }

    /// Upload a new display picture (`PUT /users/display-picture`).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Io` if the file cannot be read, or any request error.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn upload_display_picture(&self, path: &Path) -> Result<(), ApiError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "display-picture".to_string(), |n| n.to_string_lossy().into_owned());

        let mut part = Part::bytes(bytes).file_name(file_name);
        if let Some(mime) = image_mime(path) {
            part = part.mime_str(mime)?;
        }
        let form = Form::new().part(DISPLAY_PICTURE_FIELD, part);

        let request = self
            .api
            .request(Method::PUT, "users/display-picture")?
            .multipart(form);
        self.api.send_text(request).await?;
        Ok(())
    }

    /// End the server-side session (`GET /auth/logout`).
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or non-success status.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        let request = self.api.request(Method::GET, "auth/logout")?;
        self.api.send_text(request).await?;
        Ok(())
    }
}

/// MIME type for common image extensions.
fn image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
