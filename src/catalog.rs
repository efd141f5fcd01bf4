//! Catalog controller: paginated car-list state kept consistent with the
//! filter criteria in the URL and with the sequence of load-more actions.
//!
//! [`CatalogState`] is the synchronous state machine. Every fetch it starts is
//! described by a [`PageRequest`] tagged with the criteria epoch that was
//! current at issue time; a result whose epoch no longer matches is discarded.
//! [`CatalogController`] drives the state machine against a [`CarSource`]
//! without holding its lock across a request, so a criteria change can
//! overtake a slow response.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    error::ApiError,
    models::{Car, CarsPage, FilterCriteria, ListingState},
    query,
    refine::apply_refinement_filter,
    rental_api::CarSource,
    storage::FiltersStore,
};

pub const PAGE_SIZE: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Reset,
    LoadMore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub epoch: u64,
    pub kind: RequestKind,
    pub page: u32,
    pub limit: u32,
    pub criteria: FilterCriteria,
}

/// What happened when a fetch result was handed back to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Replaced { count: usize },
    Appended { count: usize },
    Failed { message: String },
    /// Result belonged to an older criteria epoch and was dropped.
    Stale,
}

#[derive(Debug, Default)]
pub struct CatalogState {
    listing: ListingState,
    criteria: Option<FilterCriteria>,
    epoch: u64,
    // Page value at which the scroll sentinel last fired in this epoch
    sentinel_page: Option<u32>,
}

impl CatalogState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listing(&self) -> &ListingState {
        &self.listing
    }

    /// Criteria of the current epoch; `None` before the first mount.
    pub fn criteria(&self) -> Option<&FilterCriteria> {
        self.criteria.as_ref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Starts a new epoch: resets the listing and describes the page-1 fetch.
    pub fn begin_reset(&mut self, criteria: FilterCriteria) -> PageRequest {
        self.epoch += 1;
        self.listing = ListingState {
            loading: true,
            ..ListingState::default()
        };
        self.sentinel_page = None;
        self.criteria = Some(criteria.clone());
        PageRequest {
            epoch: self.epoch,
            kind: RequestKind::Reset,
            page: 1,
            limit: PAGE_SIZE,
            criteria,
        }
    }

    pub fn can_load_more(&self) -> bool {
        self.criteria.is_some() && !self.listing.loading && self.listing.page < self.listing.page_count
    }

    pub fn begin_load_more(&mut self) -> Option<PageRequest> {
        if !self.can_load_more() {
            return None;
        }
        let criteria = self.criteria.clone()?;
        self.listing.loading = true;
        self.listing.error_message = None;
        Some(PageRequest {
            epoch: self.epoch,
            kind: RequestKind::LoadMore,
            page: self.listing.page + 1,
            limit: PAGE_SIZE,
            criteria,
        })
    }

    /// Load-more triggered by the sentinel after the last item becoming
    /// visible. Fires at most once per page value.
    pub fn begin_sentinel_load(&mut self) -> Option<PageRequest> {
        if self.sentinel_page == Some(self.listing.page) {
            return None;
        }
        let request = self.begin_load_more()?;
        self.sentinel_page = Some(self.listing.page);
        Some(request)
    }

    pub fn complete(&mut self, request: &PageRequest, outcome: Result<CarsPage, ApiError>) -> Applied {
        if request.epoch != self.epoch {
            return Applied::Stale;
        }
        self.listing.loading = false;

        let response = match outcome {
            Ok(response) => response,
            Err(err) => {
                let message = err.to_string();
                self.listing.error_message = Some(message.clone());
                return Applied::Failed { message };
            }
        };

        let count = response.cars.len();
        self.listing.total_count = response.total_cars;
        let applied = match request.kind {
            RequestKind::Reset => {
                self.listing.items = response.cars;
                self.listing.page = 1;
                Applied::Replaced { count }
            }
            RequestKind::LoadMore => {
                self.listing.items.extend(response.cars);
                self.listing.page = request.page;
                Applied::Appended { count }
            }
        };
        // page <= page_count holds after every successful fetch, even when
        // the server reports zero pages for an empty result
        self.listing.page_count = response.total_pages.max(self.listing.page);
        applied
    }
}

/// Presentation decision for the catalog page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewStatus {
    /// Fetching with nothing to show yet (skeleton).
    Loading,
    /// Initial load failed; the error panel replaces the list.
    Error,
    /// Nothing left after refinement.
    Empty,
    Ready,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogView {
    pub listing: ListingState,
    pub visible_items: Vec<Car>,
    pub criteria: FilterCriteria,
    pub can_load_more: bool,
    pub status: ViewStatus,
}

pub struct CatalogController {
    source: Arc<dyn CarSource>,
    filters: FiltersStore,
    state: Mutex<CatalogState>,
}

impl CatalogController {
    pub fn new(source: Arc<dyn CarSource>, filters: FiltersStore) -> Self {
        Self {
            source,
            filters,
            state: Mutex::new(CatalogState::new()),
        }
    }

    /// Entry point for URL changes (including mount). Refetches only when the
    /// parsed criteria differ from the ones last observed.
    pub async fn sync_with_url(&self, query_string: &str) -> Option<Applied> {
        let next = query::from_query_string(query_string).normalized();
        {
            let state = self.state.lock().await;
            if state.criteria() == Some(&next) {
                return None;
            }
        }
        Some(self.on_filter_criteria_changed(next).await)
    }

    pub async fn on_filter_criteria_changed(&self, next: FilterCriteria) -> Applied {
        let next = next.normalized();
        if let Err(e) = self.filters.save(&next).await {
            tracing::warn!(error = %e, "Failed to persist filter criteria");
        }

        let request = self.state.lock().await.begin_reset(next);
        tracing::info!(epoch = request.epoch, criteria = ?request.criteria, "Catalog criteria changed, fetching page 1");
        self.fetch_and_apply(request).await
    }

    /// Fetches the next page. `None` when there is nothing more to load or a
    /// fetch is already in flight.
    pub async fn load_more(&self) -> Option<Applied> {
        let request = self.state.lock().await.begin_load_more()?;
        tracing::info!(epoch = request.epoch, page = request.page, "Loading more cars");
        Some(self.fetch_and_apply(request).await)
    }

    /// Called when the sentinel after the last loaded item becomes visible.
    pub async fn on_sentinel_visible(&self) -> Option<Applied> {
        let request = self.state.lock().await.begin_sentinel_load()?;
        tracing::debug!(epoch = request.epoch, page = request.page, "Sentinel visible, loading more cars");
        Some(self.fetch_and_apply(request).await)
    }

    /// Persists `next` for form pre-fill and returns the catalog location to
    /// navigate to. The navigation itself ends up in `sync_with_url`.
    pub async fn apply_filters(&self, next: &FilterCriteria) -> String {
        let next = next.normalized();
        if let Err(e) = self.filters.save(&next).await {
            tracing::warn!(error = %e, "Failed to persist filter criteria");
        }
        query::catalog_location(&next)
    }

    pub async fn snapshot(&self) -> ListingState {
        self.state.lock().await.listing().clone()
    }

    pub async fn criteria(&self) -> Option<FilterCriteria> {
        self.state.lock().await.criteria().cloned()
    }

    /// Loaded items with the refinement filter applied.
    pub async fn visible_items(&self) -> Vec<Car> {
        let state = self.state.lock().await;
        let criteria = state.criteria().cloned().unwrap_or_default();
        apply_refinement_filter(&state.listing().items, &criteria)
    }

    pub async fn view(&self) -> CatalogView {
        let state = self.state.lock().await;
        let listing = state.listing().clone();
        let criteria = state.criteria().cloned().unwrap_or_default();
        let can_load_more = state.can_load_more();
        drop(state);

        let visible_items = apply_refinement_filter(&listing.items, &criteria);
        let status = if listing.loading && listing.items.is_empty() {
            ViewStatus::Loading
        } else if listing.error_message.is_some() && listing.items.is_empty() {
            ViewStatus::Error
        } else if visible_items.is_empty() {
            ViewStatus::Empty
        } else {
            ViewStatus::Ready
        };

        CatalogView {
            listing,
            visible_items,
            criteria,
            can_load_more,
            status,
        }
    }

    async fn fetch_and_apply(&self, request: PageRequest) -> Applied {
        let outcome = self
            .source
            .search_cars(&request.criteria, request.page, request.limit)
            .await;

        let applied = self.state.lock().await.complete(&request, outcome);
        match &applied {
            Applied::Stale => {
                tracing::debug!(epoch = request.epoch, page = request.page, "Discarded stale catalog response")
            }
            Applied::Failed { message } => {
                tracing::error!(epoch = request.epoch, page = request.page, "Catalog fetch failed: {}", message)
            }
            Applied::Replaced { count } | Applied::Appended { count } => {
                tracing::debug!(epoch = request.epoch, page = request.page, count, "Applied catalog page")
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_of(ids: &[&str], total_cars: u32, total_pages: u32) -> CarsPage {
        CarsPage {
            cars: ids
                .iter()
                .map(|id| serde_json::from_value(serde_json::json!({ "id": id })).unwrap())
                .collect(),
            total_cars,
            total_pages,
        }
    }

    fn brand(name: &str) -> FilterCriteria {
        FilterCriteria {
            brand: Some(name.into()),
            ..Default::default()
        }
    }

    #[test]
    fn reset_clears_items_and_marks_loading() {
        let mut state = CatalogState::new();
        let first = state.begin_reset(brand("BMW"));
        state.complete(&first, Ok(page_of(&["a", "b"], 30, 3)));

        let second = state.begin_reset(brand("Audi"));
        assert_eq!(second.page, 1);
        assert_eq!(second.limit, PAGE_SIZE);
        assert!(state.listing().items.is_empty());
        assert!(state.listing().loading);
        assert_eq!(state.listing().error_message, None);
    }

    #[test]
    fn load_more_appends_and_advances_page() {
        let mut state = CatalogState::new();
        let first = state.begin_reset(brand("BMW"));
        state.complete(&first, Ok(page_of(&["a", "b"], 4, 2)));

        let more = state.begin_load_more().unwrap();
        assert_eq!(more.page, 2);
        assert_eq!(more.criteria, brand("BMW"));
        assert_eq!(state.complete(&more, Ok(page_of(&["c", "d"], 4, 2))), Applied::Appended { count: 2 });

        let ids: Vec<_> = state.listing().items.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "d"]);
        assert_eq!(state.listing().page, 2);
        assert!(state.begin_load_more().is_none());
    }

    #[test]
    fn empty_result_keeps_page_within_page_count() {
        let mut state = CatalogState::new();
        let reset = state.begin_reset(brand("Nonexistent"));
        assert_eq!(state.complete(&reset, Ok(page_of(&[], 0, 0))), Applied::Replaced { count: 0 });

        let listing = state.listing();
        assert_eq!(listing.page, 1);
        assert_eq!(listing.page_count, 1);
        assert!(listing.page <= listing.page_count);
        assert!(!state.can_load_more());
    }

    #[test]
    fn load_more_is_noop_while_loading_or_before_mount() {
        let mut state = CatalogState::new();
        assert!(state.begin_load_more().is_none());

        state.begin_reset(FilterCriteria::default());
        assert!(state.begin_load_more().is_none());
    }

    #[test]
    fn load_more_failure_keeps_items_and_page() {
        let mut state = CatalogState::new();
        let first = state.begin_reset(FilterCriteria::default());
        state.complete(&first, Ok(page_of(&["a"], 3, 3)));

        let more = state.begin_load_more().unwrap();
        let applied = state.complete(&more, Err(ApiError::NetworkFailure("timed out".into())));
        assert!(matches!(applied, Applied::Failed { .. }));
        assert_eq!(state.listing().items.len(), 1);
        assert_eq!(state.listing().page, 1);
        assert!(!state.listing().loading);
        assert_eq!(state.listing().error_message.as_deref(), Some("Network failure: timed out"));
    }

    #[test]
    fn stale_reset_result_is_discarded() {
        let mut state = CatalogState::new();
        let r1 = state.begin_reset(brand("BMW"));
        let r2 = state.begin_reset(brand("Audi"));

        assert_eq!(state.complete(&r2, Ok(page_of(&["audi"], 1, 1))), Applied::Replaced { count: 1 });
        assert_eq!(state.complete(&r1, Ok(page_of(&["bmw"], 1, 1))), Applied::Stale);
        assert_eq!(state.listing().items[0].id, "audi");
    }

    #[test]
    fn load_more_from_previous_epoch_is_discarded() {
        let mut state = CatalogState::new();
        let first = state.begin_reset(brand("BMW"));
        state.complete(&first, Ok(page_of(&["a"], 2, 2)));
        let more = state.begin_load_more().unwrap();

        let reset = state.begin_reset(brand("Audi"));
        assert_eq!(state.complete(&more, Ok(page_of(&["b"], 2, 2))), Applied::Stale);
        assert!(state.listing().items.is_empty());
        assert!(state.listing().loading);

        state.complete(&reset, Ok(page_of(&["x"], 1, 1)));
        assert_eq!(state.listing().items.len(), 1);
    }

    #[test]
    fn sentinel_fires_once_per_page_value() {
        let mut state = CatalogState::new();
        let first = state.begin_reset(FilterCriteria::default());
        state.complete(&first, Ok(page_of(&["a"], 3, 3)));

        let more = state.begin_sentinel_load().unwrap();
        state.complete(&more, Err(ApiError::ServerFailure { status: 502, attempts: 4 }));
        // Same page after a failure: the sentinel stays quiet
        assert!(state.begin_sentinel_load().is_none());

        // An explicit load-more still works and advancing re-arms the sentinel
        let explicit = state.begin_load_more().unwrap();
        state.complete(&explicit, Ok(page_of(&["b"], 3, 3)));
        assert!(state.begin_sentinel_load().is_some());
    }
}
