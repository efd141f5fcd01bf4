// Handlers that drive the catalog controller

use axum::{
    extract::{Extension, Json as JsonExtract, RawQuery},
    response::Json,
};
use serde::Serialize;
use std::sync::Arc;

use super::api::CarCard;
use crate::{
    catalog::CatalogView,
    error::AppResult,
    forms::FilterForm,
    models::FilterCriteria,
    query,
    session::ClientSession,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    #[serde(flatten)]
    view: CatalogView,
    cards: Vec<CarCard>,
    /// Another request in the same session changed the criteria before this
    /// one was answered; the view belongs to the newer criteria.
    superseded: bool,
}

#[derive(Serialize)]
pub struct LocationResponse {
    location: String,
    criteria: FilterCriteria,
}

async fn respond(session: &ClientSession, requested: Option<&FilterCriteria>) -> Json<CatalogResponse> {
    session.favorites.hydrate().await;
    let view = session.catalog.view().await;
    let superseded = requested.is_some_and(|criteria| *criteria != view.criteria);
    if superseded {
        tracing::warn!("[HANDLER] session {} - Criteria changed while the request was in flight", session.id);
    }
    let cards = CarCard::build_all(&view.visible_items, &session.favorites).await;
    Json(CatalogResponse { view, cards, superseded })
}

// GET /api/catalog?brand=..&rentalPrice=..&minMileage=..&maxMileage=..
pub async fn get_catalog(
    Extension(session): Extension<Arc<ClientSession>>,
    RawQuery(raw): RawQuery,
) -> Json<CatalogResponse> {
    let raw = raw.unwrap_or_default();
    tracing::info!("[HANDLER] /api/catalog - Session {} requested query: '{}'", session.id, raw);
    if let Some(applied) = session.catalog.sync_with_url(&raw).await {
        tracing::debug!("[HANDLER] /api/catalog - Criteria changed: {:?}", applied);
    }
    let requested = query::from_query_string(&raw).normalized();
    respond(&session, Some(&requested)).await
}

pub async fn load_more(Extension(session): Extension<Arc<ClientSession>>) -> Json<CatalogResponse> {
    match session.catalog.load_more().await {
        Some(applied) => tracing::info!("[HANDLER] /api/catalog/load-more - {:?}", applied),
        None => tracing::debug!("[HANDLER] /api/catalog/load-more - Nothing to load"),
    }
    respond(&session, None).await
}

pub async fn sentinel_visible(Extension(session): Extension<Arc<ClientSession>>) -> Json<CatalogResponse> {
    if let Some(applied) = session.catalog.on_sentinel_visible().await {
        tracing::debug!("[HANDLER] /api/catalog/sentinel - {:?}", applied);
    }
    respond(&session, None).await
}

pub async fn apply_filters(
    Extension(session): Extension<Arc<ClientSession>>,
    JsonExtract(form): JsonExtract<FilterForm>,
) -> AppResult<Json<LocationResponse>> {
    let criteria = form.validate()?;
    let location = session.catalog.apply_filters(&criteria).await;
    tracing::info!("[HANDLER] /api/catalog/filters - Navigating to {}", location);
    Ok(Json(LocationResponse { location, criteria }))
}

// Persisted criteria, used only to pre-fill the filter form
pub async fn get_filters(Extension(session): Extension<Arc<ClientSession>>) -> Json<FilterCriteria> {
    Json(session.filters.load().await)
}
