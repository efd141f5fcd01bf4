// Favorite car ids persisted under "favorites-storage"

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{
    error::{ApiError, StorageError},
    models::Car,
    rental_api::CarSource,
    storage::{self, FAVORITES_KEY, KeyValueStore},
};

/// Favorite status of a car. `Unknown` until persisted state has been read,
/// so callers never render a value that contradicts storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FavoriteStatus {
    Unknown,
    Favorite,
    NotFavorite,
}

impl FavoriteStatus {
    pub fn as_option(self) -> Option<bool> {
        match self {
            FavoriteStatus::Unknown => None,
            FavoriteStatus::Favorite => Some(true),
            FavoriteStatus::NotFavorite => Some(false),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FavoritesState {
    #[serde(default)]
    favorites: Vec<String>,
}

#[derive(Debug, Default)]
struct Inner {
    ids: Vec<String>,
    hydrated: bool,
}

pub struct FavoritesStore {
    store: Arc<dyn KeyValueStore>,
    inner: RwLock<Inner>,
}

impl FavoritesStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Reads persisted favorites once; later calls are no-ops.
    pub async fn hydrate(&self) {
        let mut inner = self.inner.write().await;
        if inner.hydrated {
            return;
        }
        let state: FavoritesState = storage::load_or_default(self.store.as_ref(), FAVORITES_KEY).await;
        let mut ids = Vec::with_capacity(state.favorites.len());
        for id in state.favorites {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        tracing::debug!(count = ids.len(), "Hydrated favorites");
        inner.ids = ids;
        inner.hydrated = true;
    }

    pub async fn is_hydrated(&self) -> bool {
        self.inner.read().await.hydrated
    }

    pub async fn status(&self, id: &str) -> FavoriteStatus {
        let inner = self.inner.read().await;
        if !inner.hydrated {
            FavoriteStatus::Unknown
        } else if inner.ids.iter().any(|fav| fav == id) {
            FavoriteStatus::Favorite
        } else {
            FavoriteStatus::NotFavorite
        }
    }

    pub async fn ids(&self) -> Vec<String> {
        self.inner.read().await.ids.clone()
    }

    /// Adds or removes `id` and persists the result. Returns true when the car
    /// is a favorite afterwards. The in-memory set only changes once the new
    /// set has been written.
    pub async fn toggle(&self, id: &str) -> Result<bool, StorageError> {
        self.hydrate().await;
        // Held across the write so concurrent toggles apply one at a time
        let mut inner = self.inner.write().await;
        let mut next = inner.ids.clone();
        let now_favorite = match next.iter().position(|fav| fav == id) {
            Some(index) => {
                next.remove(index);
                false
            }
            None => {
                next.push(id.to_string());
                true
            }
        };

        let state = FavoritesState { favorites: next };
        if let Err(e) = storage::save(self.store.as_ref(), FAVORITES_KEY, &state).await {
            tracing::error!(id, error = %e, "Failed to persist favorites, keeping previous set");
            return Err(e);
        }
        inner.ids = state.favorites;
        tracing::info!(id, favorite = now_favorite, "Toggled favorite");
        Ok(now_favorite)
    }
}

/// Fetches every favorite concurrently. One failure fails the whole load.
pub async fn load_favorite_cars(source: &dyn CarSource, ids: &[String]) -> Result<Vec<Car>, ApiError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    try_join_all(ids.iter().map(|id| source.car_by_id(id))).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn status_is_unknown_until_hydrated() {
        let store = Arc::new(MemoryStore::new());
        storage::save(
            store.as_ref(),
            FAVORITES_KEY,
            &FavoritesState { favorites: vec!["car-1".into()] },
        )
        .await
        .unwrap();

        let favorites = FavoritesStore::new(store);
        assert_eq!(favorites.status("car-1").await, FavoriteStatus::Unknown);

        favorites.hydrate().await;
        assert_eq!(favorites.status("car-1").await, FavoriteStatus::Favorite);
        assert_eq!(favorites.status("car-2").await, FavoriteStatus::NotFavorite);
    }

    #[tokio::test]
    async fn toggle_persists_and_preserves_order() {
        let store = Arc::new(MemoryStore::new());
        let favorites = FavoritesStore::new(store.clone());

        assert!(favorites.toggle("a").await.unwrap());
        assert!(favorites.toggle("b").await.unwrap());
        assert!(favorites.toggle("c").await.unwrap());
        assert!(!favorites.toggle("b").await.unwrap());
        assert_eq!(favorites.ids().await, vec!["a", "c"]);

        let reloaded = FavoritesStore::new(store);
        reloaded.hydrate().await;
        assert_eq!(reloaded.ids().await, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn corrupt_storage_hydrates_empty() {
        let store = Arc::new(MemoryStore::new());
        store.write(FAVORITES_KEY, r#"{"state":{"favorites":"oops"}}"#).await.unwrap();

        let favorites = FavoritesStore::new(store);
        favorites.hydrate().await;
        assert!(favorites.is_hydrated().await);
        assert!(favorites.ids().await.is_empty());
    }

    #[tokio::test]
    async fn duplicate_ids_in_storage_collapse() {
        let store = Arc::new(MemoryStore::new());
        store
            .write(FAVORITES_KEY, r#"{"state":{"favorites":["x","y","x"]},"version":0}"#)
            .await
            .unwrap();
        let favorites = FavoritesStore::new(store);
        favorites.hydrate().await;
        assert_eq!(favorites.ids().await, vec!["x", "y"]);
    }

    // Reads fine, refuses every write
    struct ReadOnlyStore;

    #[async_trait::async_trait]
    impl KeyValueStore for ReadOnlyStore {
        async fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        async fn write(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }

        async fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn failed_save_leaves_favorites_unchanged() {
        let favorites = FavoritesStore::new(Arc::new(ReadOnlyStore));

        assert!(favorites.toggle("car-1").await.is_err());
        assert!(favorites.ids().await.is_empty());
        assert_eq!(favorites.status("car-1").await, FavoriteStatus::NotFavorite);
    }
}
