// Route definitions: the catalog controller and friends exposed as a JSON API

use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::{
    config::Settings,
    rental_api::CarSource,
    session::{SESSION_HEADER, SessionRegistry},
    storage::KeyValueStore,
};

mod api;
mod catalog;
mod favorites;

pub use api::{CarCard, CarDetailView};

// Shared state handed to every handler
#[derive(Clone, FromRef)]
pub struct AppState {
    pub source: Arc<dyn CarSource>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(settings: &Settings, source: Arc<dyn CarSource>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            sessions: Arc::new(SessionRegistry::new(source.clone(), store, settings.max_sessions)),
            source,
        }
    }
}

// Resolves the caller's session from the x-session-id header (minting one
// when absent), hands it to the handler and echoes the id back.
async fn attach_session(
    State(sessions): State<Arc<SessionRegistry>>,
    mut request: Request,
    next: Next,
) -> Response {
    let requested = request
        .headers()
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let session = sessions.resolve(requested.as_deref()).await;
    let id = session.id.clone();
    request.extensions_mut().insert(session);

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

pub fn create_router(app_state: AppState) -> Router {
    let session_routes = Router::new()
        .route("/catalog", get(catalog::get_catalog))
        .route("/catalog/load-more", post(catalog::load_more))
        .route("/catalog/sentinel", post(catalog::sentinel_visible))
        .route("/catalog/filters", post(catalog::apply_filters))
        .route("/filters", get(catalog::get_filters))
        .route("/cars/:id", get(api::get_car))
        .route("/favorites", get(favorites::get_favorites))
        .route("/favorites/:id/toggle", post(favorites::toggle_favorite))
        .route_layer(middleware::from_fn_with_state(
            app_state.sessions.clone(),
            attach_session,
        ));

    let api_router = Router::new()
        .route("/brands", get(api::get_brands))
        .route("/cars/:id/booking", post(api::book_car))
        .merge(session_routes)
        .with_state(app_state);

    Router::new()
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
}
