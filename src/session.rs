// Per-client state for the HTTP host. Each client session owns its catalog
// controller, favorites and filter pre-fill, so concurrent clients never
// observe each other's criteria or listing.

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    catalog::CatalogController,
    favorites::FavoritesStore,
    rental_api::CarSource,
    storage::{FiltersStore, KeyValueStore, ScopedStore},
};

pub const SESSION_HEADER: &str = "x-session-id";

const MAX_SESSION_ID_LEN: usize = 64;

pub struct ClientSession {
    pub id: String,
    pub catalog: CatalogController,
    pub favorites: FavoritesStore,
    pub filters: FiltersStore,
}

impl ClientSession {
    fn new(id: String, source: Arc<dyn CarSource>, store: Arc<dyn KeyValueStore>) -> Self {
        let scoped: Arc<dyn KeyValueStore> = Arc::new(ScopedStore::new(store, id.clone()));
        let filters = FiltersStore::new(scoped.clone());
        Self {
            catalog: CatalogController::new(source, filters.clone()),
            favorites: FavoritesStore::new(scoped),
            filters,
            id,
        }
    }
}

/// Ids are used as storage path segments, so only `[A-Za-z0-9_-]` is accepted.
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[derive(Default)]
struct Sessions {
    by_id: HashMap<String, Arc<ClientSession>>,
    // Creation order, oldest first
    order: VecDeque<String>,
}

pub struct SessionRegistry {
    source: Arc<dyn CarSource>,
    store: Arc<dyn KeyValueStore>,
    max_sessions: usize,
    sessions: RwLock<Sessions>,
}

impl SessionRegistry {
    pub fn new(source: Arc<dyn CarSource>, store: Arc<dyn KeyValueStore>, max_sessions: usize) -> Self {
        Self {
            source,
            store,
            max_sessions: max_sessions.max(1),
            sessions: RwLock::new(Sessions::default()),
        }
    }

    /// Returns the session named by `requested`, creating it on first use.
    /// A missing or malformed id gets a fresh session. When the registry is
    /// full the oldest in-memory session is dropped; its persisted favorites
    /// and filters stay on disk and come back with the id.
    pub async fn resolve(&self, requested: Option<&str>) -> Arc<ClientSession> {
        let id = match requested {
            Some(id) if is_valid_session_id(id) => id.to_string(),
            Some(id) => {
                tracing::warn!(session = id, "Ignoring malformed session id");
                Uuid::new_v4().to_string()
            }
            None => Uuid::new_v4().to_string(),
        };

        if let Some(session) = self.sessions.read().await.by_id.get(&id) {
            return session.clone();
        }

        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.by_id.get(&id) {
            return session.clone();
        }
        while sessions.by_id.len() >= self.max_sessions {
            let Some(oldest) = sessions.order.pop_front() else {
                break;
            };
            sessions.by_id.remove(&oldest);
            tracing::debug!(session = %oldest, "Evicted client session");
        }

        let session = Arc::new(ClientSession::new(id.clone(), self.source.clone(), self.store.clone()));
        sessions.by_id.insert(id.clone(), session.clone());
        sessions.order.push_back(id);
        tracing::info!(session = %session.id, "Created client session");
        session
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.by_id.len()
    }
}
