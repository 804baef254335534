//! Application state shared across front-end views.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::cart::{CartStore, CorruptCartPolicy};
use crate::catalog::CatalogClient;
use crate::config::StorefrontConfig;
use crate::context::AppContext;
use crate::error::Result;
use crate::geocoder::Geocoder;
use crate::notifications::Notifications;
use crate::remote_cart::RemoteCartClient;
use crate::session::SessionClient;
use crate::storage::LocalStorage;

/// Everything a view needs: the state container plus the service clients
/// views call directly.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    context: AppContext,
    catalog: CatalogClient,
    remote_cart: RemoteCartClient,
    geocoder: Geocoder,
}

impl AppState {
    /// Wire up storage, clients and the state container from configuration.
    ///
    /// Does not bootstrap the session; call
    /// [`AppContext::bootstrap`] once the state is built.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be opened, the persisted cart is
    /// unreadable (unless configured to reset), or an HTTP client fails to
    /// build.
    pub async fn new(config: StorefrontConfig) -> Result<Self> {
        let storage = LocalStorage::open(&config.storage_path).await?;
        Self::with_storage(config, storage).await
    }

    /// Like [`AppState::new`] but with caller-supplied storage.
    ///
    /// # Errors
    ///
    /// See [`AppState::new`].
    pub async fn with_storage(config: StorefrontConfig, storage: LocalStorage) -> Result<Self> {
        let api = ApiClient::new(&config)?;
        let policy = if config.reset_corrupt_cart {
            CorruptCartPolicy::Reset
        } else {
            CorruptCartPolicy::Fail
        };

        let context = AppContext::hydrate(
            CartStore::new(storage),
            SessionClient::new(api.clone()),
            Notifications::new(),
            policy,
        )
        .await?;

        let catalog = CatalogClient::new(config.catalog_base_url.clone(), config.http_timeout)?;
        let geocoder = Geocoder::new(config.geocoder_base_url.clone(), config.http_timeout)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                context,
                catalog,
                remote_cart: RemoteCartClient::new(api),
                geocoder,
                config,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the session and cart container.
    #[must_use]
    pub fn context(&self) -> &AppContext {
        &self.inner.context
    }

    /// Get a reference to the product catalog client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// Get a reference to the REST cart client.
    #[must_use]
    pub fn remote_cart(&self) -> &RemoteCartClient {
        &self.inner.remote_cart
    }

    /// Get a reference to the reverse geocoder.
    #[must_use]
    pub fn geocoder(&self) -> &Geocoder {
        &self.inner.geocoder
    }

    /// Get a reference to the notification log.
    #[must_use]
    pub fn notifications(&self) -> &Notifications {
        self.inner.context.notifications()
    }
}
