// Local persistence for favorites and last-applied filters.
// Values are wrapped as { "state": ..., "version": 0 } so entries written by
// the browser build can be read back unchanged.

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tokio::fs;

use crate::{error::StorageError, models::FilterCriteria};

pub const FAVORITES_KEY: &str = "favorites-storage";
pub const FILTERS_KEY: &str = "car-filters-storage";

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Persisted<T> {
    pub state: T,
    #[serde(default)]
    pub version: u32,
}

/// Reads and decodes `key`, falling back to `T::default()` when the entry is
/// absent, unreadable or corrupt.
pub async fn load_or_default<T>(store: &dyn KeyValueStore, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match store.read(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read persisted state, using defaults");
            return T::default();
        }
    };
    match serde_json::from_str::<Persisted<T>>(&raw) {
        Ok(persisted) => persisted.state,
        Err(e) => {
            tracing::warn!(key, error = %e, "Corrupt persisted state, using defaults");
            T::default()
        }
    }
}

pub async fn save<T: Serialize + Sync>(store: &dyn KeyValueStore, key: &str, state: &T) -> Result<(), StorageError> {
    let raw = serde_json::to_string(&Persisted { state, version: 0 })?;
    store.write(key, &raw).await
}

// One <key>.json file per entry under a directory. Keys may contain '/' to
// address a subdirectory (see ScopedStore).
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let target = self.path_for(key);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        // Readers only ever see a complete entry
        let tmp = target.with_extension("json.tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &target).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// Namespaces every key under `<scope>/`, giving each client session its own
/// favorites and filters entries inside a shared backing store.
pub struct ScopedStore {
    inner: Arc<dyn KeyValueStore>,
    scope: String,
}

impl ScopedStore {
    /// `scope` must be a plain path segment; callers validate it.
    pub fn new(inner: Arc<dyn KeyValueStore>, scope: impl Into<String>) -> Self {
        Self {
            inner,
            scope: scope.into(),
        }
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}/{}", self.scope, key)
    }
}

#[async_trait]
impl KeyValueStore for ScopedStore {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.read(&self.scoped(key)).await
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.write(&self.scoped(key), value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(&self.scoped(key)).await
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FiltersState {
    #[serde(default)]
    filters: FilterCriteria,
}

/// Last-applied filter criteria, kept only to pre-fill the filter form.
#[derive(Clone)]
pub struct FiltersStore {
    store: Arc<dyn KeyValueStore>,
}

impl FiltersStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self) -> FilterCriteria {
        load_or_default::<FiltersState>(self.store.as_ref(), FILTERS_KEY)
            .await
            .filters
    }

    pub async fn save(&self, criteria: &FilterCriteria) -> Result<(), StorageError> {
        let state = FiltersState {
            filters: criteria.clone(),
        };
        save(self.store.as_ref(), FILTERS_KEY, &state).await
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(FILTERS_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_store_round_trips_filters() {
        let dir = tempfile::tempdir().unwrap();
        let filters = FiltersStore::new(Arc::new(JsonFileStore::new(dir.path())));
        let criteria = FilterCriteria {
            brand: Some("Audi".into()),
            max_mileage: Some("8000".into()),
            ..Default::default()
        };

        filters.save(&criteria).await.unwrap();
        assert_eq!(filters.load().await, criteria);

        let raw = std::fs::read_to_string(dir.path().join("car-filters-storage.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["state"]["filters"]["brand"], "Audi");
        assert_eq!(value["version"], 0);
    }

    #[tokio::test]
    async fn missing_entry_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let filters = FiltersStore::new(Arc::new(JsonFileStore::new(dir.path().join("nested"))));
        assert_eq!(filters.load().await, FilterCriteria::default());
    }

    #[tokio::test]
    async fn corrupt_entry_yields_defaults() {
        let store = Arc::new(MemoryStore::new());
        store.write(FILTERS_KEY, "{not json").await.unwrap();
        assert_eq!(FiltersStore::new(store).load().await, FilterCriteria::default());
    }

    #[tokio::test]
    async fn clear_removes_entry() {
        let store = Arc::new(MemoryStore::new());
        let filters = FiltersStore::new(store.clone());
        filters
            .save(&FilterCriteria { brand: Some("Kia".into()), ..Default::default() })
            .await
            .unwrap();
        filters.clear().await.unwrap();
        assert_eq!(store.read(FILTERS_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn scoped_entries_land_in_a_session_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        let backing: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(dir.path()));
        let alice = FiltersStore::new(Arc::new(ScopedStore::new(backing.clone(), "alice")));
        let bob = FiltersStore::new(Arc::new(ScopedStore::new(backing, "bob")));

        alice
            .save(&FilterCriteria { brand: Some("BMW".into()), ..Default::default() })
            .await
            .unwrap();

        assert!(dir.path().join("alice").join("car-filters-storage.json").exists());
        assert_eq!(alice.load().await.brand.as_deref(), Some("BMW"));
        assert_eq!(bob.load().await, FilterCriteria::default());
    }
}
