//! The application state container.
//!
//! [`AppContext`] owns the session and the cart for the whole process. It is
//! built once at startup and handed to every consumer as a cloneable handle;
//! consumers read snapshots through [`AppContext::current_view`] and change
//! state only through its operations.
//!
//! Session and cart sit behind independent locks, so a bootstrap in flight
//! never blocks or corrupts a concurrent cart mutation. Cart mutations queue a
//! full snapshot for the background writer while still holding the cart lock,
//! which keeps persisted snapshots in mutation order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rust_decimal::Decimal;
use serde::Serialize;
use subify_core::Email;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::cart::{CartItem, CartStore, CartStoreError, CartWriter, CorruptCartPolicy};
use crate::checkout::{self, CartSummary, CheckoutError};
use crate::error::set_sentry_user;
use crate::notifications::Notifications;
use crate::session::{Session, SessionClient};

/// Notification title for a failed bootstrap.
pub const USER_VALIDATION_ERROR: &str = "Error in user validation";

/// Read-only snapshot of the container.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppView {
    pub app_loading: bool,
    pub session: Session,
    pub cart: Vec<CartItem>,
}

/// Handle to the application state. Clones share the same state.
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<AppContextInner>,
}

struct AppContextInner {
    loading: LoadingState,
    session: RwLock<Session>,
    cart: RwLock<Vec<CartItem>>,
    writer: CartWriter,
    sessions: SessionClient,
    notifications: Notifications,
}

/// Loading until the first bootstrap finishes, and again while any bootstrap
/// is in flight.
#[derive(Default)]
struct LoadingState {
    in_flight: AtomicUsize,
    finished_once: AtomicBool,
}

impl LoadingState {
    fn start(&self) -> LoadingGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        LoadingGuard(self)
    }

    fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0 || !self.finished_once.load(Ordering::SeqCst)
    }
}

/// Ends one bootstrap when dropped, on every exit path.
struct LoadingGuard<'a>(&'a LoadingState);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.finished_once.store(true, Ordering::SeqCst);
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AppContext {
    /// Build the container, hydrating the cart from `store`.
    ///
    /// The session starts anonymous and `app_loading` starts true until the
    /// first [`bootstrap`](Self::bootstrap) completes. Must be called inside a
    /// tokio runtime: the cart writer task is spawned here.
    ///
    /// # Errors
    ///
    /// Returns `CartStoreError` if the persisted cart cannot be read and
    /// `policy` is [`CorruptCartPolicy::Fail`], or if storage fails.
    #[instrument(skip_all)]
    pub async fn hydrate(
        store: CartStore,
        sessions: SessionClient,
        notifications: Notifications,
        policy: CorruptCartPolicy,
    ) -> Result<Self, CartStoreError> {
        let cart = store.load_with_policy(policy).await?;
        info!(items = cart.len(), "Cart hydrated from storage");

        Ok(Self {
            inner: Arc::new(AppContextInner {
                loading: LoadingState::default(),
                session: RwLock::new(Session::Anonymous),
                cart: RwLock::new(cart),
                writer: CartWriter::spawn(store),
                sessions,
                notifications,
            }),
        })
    }

    /// Load the current user.
    ///
    /// On success the session becomes authenticated with the returned user.
    /// On any failure the session is left as it was and an error notification
    /// is recorded. `app_loading` is false afterwards in every case, unless
    /// another bootstrap is still running.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) {
        let _loading = self.inner.loading.start();

        match self.inner.sessions.current_user().await {
            Ok(user) => {
                debug!(user_id = ?user.id, "User validated");
                set_sentry_user(user.id.as_deref(), user.email.as_ref().map(Email::as_str));
                *self.inner.session.write().await = Session::Authenticated(user);
            }
            Err(e) => {
                self.inner
                    .notifications
                    .error(USER_VALIDATION_ERROR, Some(e.user_message()));
            }
        }
    }

    /// Append `item` to the end of the cart and schedule persistence.
    #[instrument(skip(self, item), fields(product_id = %item.product_id()))]
    pub async fn add_to_cart(&self, item: CartItem) {
        let mut cart = self.inner.cart.write().await;
        cart.push(item);
        self.inner.writer.schedule(cart.clone());
        debug!(items = cart.len(), "Added to cart");
    }

    /// Remove the line at `index` and schedule persistence.
    ///
    /// Other lines keep their relative order. An out-of-range index changes
    /// nothing and returns `None`; persistence is scheduled either way.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, index: usize) -> Option<CartItem> {
        let mut cart = self.inner.cart.write().await;
        let removed = (index < cart.len()).then(|| cart.remove(index));
        self.inner.writer.schedule(cart.clone());
        debug!(items = cart.len(), removed = removed.is_some(), "Removed from cart");
        removed
    }

    /// Sign out on the server, then reset the session to anonymous.
    ///
    /// The cart is kept. Returns whether the session was reset; on failure an
    /// error notification is recorded and the session is unchanged.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> bool {
        match self.inner.sessions.logout().await {
            Ok(()) => {
                *self.inner.session.write().await = Session::Anonymous;
                self.inner.notifications.success("Logout successful!");
                true
            }
            Err(e) => {
                self.inner
                    .notifications
                    .error("Logout failed", Some(e.user_message()));
                false
            }
        }
    }

    /// Snapshot of loading flag, session and cart.
    pub async fn current_view(&self) -> AppView {
        AppView {
            app_loading: self.is_loading(),
            session: self.inner.session.read().await.clone(),
            cart: self.inner.cart.read().await.clone(),
        }
    }

    /// Whether no bootstrap has completed yet, or one is still running.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.loading.is_loading()
    }

    /// Number of cart lines, for the navbar badge.
    pub async fn cart_len(&self) -> usize {
        self.inner.cart.read().await.len()
    }

    /// Totals for the current cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidTaxRate` if `tax_rate` is outside `[0, 1]`.
    pub async fn cart_summary(&self, tax_rate: Decimal) -> Result<CartSummary, CheckoutError> {
        checkout::summarize(&self.inner.cart.read().await, tax_rate)
    }

    /// Wait until every persistence write scheduled so far has been applied.
    pub async fn flush(&self) {
        self.inner.writer.flush().await;
    }

    /// The notification log this container records to.
    #[must_use]
    pub fn notifications(&self) -> &Notifications {
        &self.inner.notifications
    }

    /// The user service client used for bootstrap.
    #[must_use]
    pub fn sessions(&self) -> &SessionClient {
        &self.inner.sessions
    }
}
