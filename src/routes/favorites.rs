// Handlers for the favorites page and heart toggles

use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use serde::Serialize;
use std::sync::Arc;

use super::{AppState, api::CarCard};
use crate::{error::AppResult, favorites::load_favorite_cars, session::ClientSession};

#[derive(Serialize)]
pub struct FavoritesResponse {
    ids: Vec<String>,
    cars: Vec<CarCard>,
}

#[derive(Serialize)]
pub struct ToggleResponse {
    id: String,
    favorite: bool,
}

pub async fn get_favorites(
    State(app_state): State<AppState>,
    Extension(session): Extension<Arc<ClientSession>>,
) -> AppResult<Json<FavoritesResponse>> {
    session.favorites.hydrate().await;
    let ids = session.favorites.ids().await;
    tracing::info!("[HANDLER] /api/favorites - Loading {} favorite cars", ids.len());

    let cars = load_favorite_cars(app_state.source.as_ref(), &ids).await?;
    let cards = CarCard::build_all(&cars, &session.favorites).await;
    Ok(Json(FavoritesResponse { ids, cars: cards }))
}

pub async fn toggle_favorite(
    Extension(session): Extension<Arc<ClientSession>>,
    Path(id): Path<String>,
) -> AppResult<Json<ToggleResponse>> {
    let favorite = session.favorites.toggle(&id).await?;
    Ok(Json(ToggleResponse { id, favorite }))
}
