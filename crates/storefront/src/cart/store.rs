//! Serialization boundary between the in-memory cart and local storage.

use thiserror::Error;
use tracing::{instrument, warn};

use super::CartItem;
use crate::storage::{LocalStorage, StorageError};

/// The storage slot holding the serialized cart.
pub const CART_STORAGE_KEY: &str = "cartItems";

/// Errors raised by [`CartStore`].
#[derive(Debug, Error)]
pub enum CartStoreError {
    /// The underlying storage failed.
    #[error("cart storage error: {0}")]
    Storage(#[from] StorageError),

    /// The slot exists but does not hold a valid list of cart items.
    #[error("persisted cart is unreadable: {0}")]
    Corrupt(#[source] serde_json::Error),

    /// The cart could not be serialized.
    #[error("cart serialization failed: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// What to do when the persisted cart cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorruptCartPolicy {
    /// Surface [`CartStoreError::Corrupt`] to the caller.
    #[default]
    Fail,
    /// Log a warning, overwrite the slot with an empty cart and continue.
    Reset,
}

/// Reads and writes the whole cart as one JSON array in a fixed slot.
#[derive(Clone)]
pub struct CartStore {
    storage: LocalStorage,
}

impl CartStore {
    #[must_use]
    pub const fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    /// The storage this store writes to.
    #[must_use]
    pub const fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    /// Load the persisted cart. An absent slot is an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `CartStoreError::Corrupt` if the slot content is not a JSON
    /// array of valid cart items.
    pub async fn load(&self) -> Result<Vec<CartItem>, CartStoreError> {
        match self.storage.get_item(CART_STORAGE_KEY).await {
            Some(raw) => serde_json::from_str(&raw).map_err(CartStoreError::Corrupt),
            None => Ok(Vec::new()),
        }
    }

    /// Load the persisted cart, applying `policy` when it is unreadable.
    ///
    /// # Errors
    ///
    /// Returns `CartStoreError::Corrupt` under [`CorruptCartPolicy::Fail`], or
    /// a storage error if resetting the slot fails.
    #[instrument(skip(self))]
    pub async fn load_with_policy(
        &self,
        policy: CorruptCartPolicy,
    ) -> Result<Vec<CartItem>, CartStoreError> {
        match self.load().await {
            Err(CartStoreError::Corrupt(e)) if policy == CorruptCartPolicy::Reset => {
                warn!(error = %e, "Persisted cart is unreadable, resetting to empty");
                self.save(&[]).await?;
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Serialize the whole cart and overwrite the slot.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the storage write fails.
    pub async fn save(&self, items: &[CartItem]) -> Result<(), CartStoreError> {
        let raw = serde_json::to_string(items).map_err(CartStoreError::Serialize)?;
        self.storage.set_item(CART_STORAGE_KEY, raw).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::tests::item;
    use subify_core::ProductId;

    #[tokio::test]
    async fn test_absent_slot_loads_empty() {
        let store = CartStore::new(LocalStorage::in_memory());
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = CartStore::new(LocalStorage::in_memory());
        let items = vec![item(1, 10), item(2, 20)];
        store.save(&items).await.unwrap();
        assert_eq!(store.load().await.unwrap(), items);
    }

    #[tokio::test]
    async fn test_fractional_prices_reload_unchanged() {
        let store = CartStore::new(LocalStorage::in_memory());
        let items: Vec<CartItem> = ["12.3456789012345678", "9.99", "0.1", "1249.5"]
            .into_iter()
            .zip(1..)
            .map(|(price, id)| {
                CartItem::new(
                    ProductId::new(id),
                    format!("Product {id}"),
                    price.parse().unwrap(),
                    format!("https://cdn.dummyjson.com/products/{id}/thumbnail.png"),
                )
                .unwrap()
            })
            .collect();

        store.save(&items).await.unwrap();
        assert_eq!(store.load().await.unwrap(), items);
    }

    #[tokio::test]
    async fn test_reads_legacy_slot_written_by_the_web_client() {
        let storage = LocalStorage::in_memory();
        storage
            .set_item(
                CART_STORAGE_KEY,
                r#"[{"productId":1,"title":"Essence Mascara Lash Princess","price":9.99,"thumbnail":"https://cdn.dummyjson.com/products/images/beauty/1/thumbnail.png"}]"#
                    .to_string(),
            )
            .await
            .unwrap();

        let items = CartStore::new(storage).load().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price().to_string(), "₹9.99");
    }

    #[tokio::test]
    async fn test_corrupt_slot_fails_by_default() {
        let storage = LocalStorage::in_memory();
        storage
            .set_item(CART_STORAGE_KEY, "{oops".to_string())
            .await
            .unwrap();
        let store = CartStore::new(storage);

        let result = store.load_with_policy(CorruptCartPolicy::Fail).await;
        assert!(matches!(result, Err(CartStoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_invalid_item_counts_as_corrupt() {
        let storage = LocalStorage::in_memory();
        storage
            .set_item(
                CART_STORAGE_KEY,
                r#"[{"productId":1,"title":"x","price":-3,"thumbnail":"https://x.io/a.png"}]"#
                    .to_string(),
            )
            .await
            .unwrap();

        let result = CartStore::new(storage).load().await;
        assert!(matches!(result, Err(CartStoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_corrupt_slot_resets_when_asked() {
        let storage = LocalStorage::in_memory();
        storage
            .set_item(CART_STORAGE_KEY, "not json".to_string())
            .await
            .unwrap();
        let store = CartStore::new(storage.clone());

        let items = store
            .load_with_policy(CorruptCartPolicy::Reset)
            .await
            .unwrap();
        assert!(items.is_empty());
        assert_eq!(
            storage.get_item(CART_STORAGE_KEY).await.as_deref(),
            Some("[]")
        );
    }
}
