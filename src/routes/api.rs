// Handlers for brands, car details and bookings

use axum::{
    extract::{Extension, Json as JsonExtract, Path, State},
    response::Json,
};
use serde::Serialize;
use std::sync::Arc;

use super::AppState;
use crate::{
    error::{AppError, AppResult},
    favorites::FavoritesStore,
    forms::{Booking, BookingRequest},
    format::{car_title, car_type_label, city_country, format_mileage},
    models::Car,
    session::ClientSession,
};

// --- Response Views ---

// Card shown in the catalog grid and on the favorites page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarCard {
    pub id: String,
    pub title: String,
    pub location: String,
    pub mileage: String,
    pub price: String,
    pub img: String,
    /// null until favorites have been hydrated
    pub favorite: Option<bool>,
}

impl CarCard {
    pub async fn build(car: &Car, favorites: &FavoritesStore) -> Self {
        Self {
            id: car.id.clone(),
            title: car_title(car),
            location: city_country(&car.address),
            mileage: format_mileage(&car.mileage),
            price: format!("${}", car.rental_price),
            img: car.img.clone(),
            favorite: favorites.status(&car.id).await.as_option(),
        }
    }

    pub async fn build_all(cars: &[Car], favorites: &FavoritesStore) -> Vec<Self> {
        let mut cards = Vec::with_capacity(cars.len());
        for car in cars {
            cards.push(Self::build(car, favorites).await);
        }
        cards
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarDetailView {
    pub car: Car,
    pub title: String,
    pub location: String,
    pub mileage: String,
    pub price: String,
    pub car_type: String,
    pub accessories_and_functionalities: Vec<String>,
    pub favorite: Option<bool>,
}

#[derive(Serialize)]
pub struct BookingResponse {
    success: bool,
    message: String,
    booking: Booking,
}

// --- API Handlers ---

pub async fn get_brands(State(app_state): State<AppState>) -> Json<Vec<String>> {
    match app_state.source.brands().await {
        Ok(brands) => {
            tracing::info!("[HANDLER] /api/brands - Returning {} brands.", brands.len());
            Json(brands)
        }
        Err(e) => {
            // The filter form still works without a brand list
            tracing::error!("[HANDLER] /api/brands - Failed to fetch brands: {}", e);
            Json(Vec::new())
        }
    }
}

pub async fn get_car(
    State(app_state): State<AppState>,
    Extension(session): Extension<Arc<ClientSession>>,
    Path(id): Path<String>,
) -> AppResult<Json<CarDetailView>> {
    tracing::info!("[HANDLER] /api/cars/:id - Request received for car: {}", id);

    let car = app_state.source.car_by_id(&id).await.map_err(|e| {
        tracing::warn!("[HANDLER] /api/cars/:id - Failed to fetch car '{}': {}", id, e);
        AppError::NotFound("Car not found".to_string())
    })?;

    session.favorites.hydrate().await;
    let favorite = session.favorites.status(&car.id).await.as_option();
    let accessories_and_functionalities = car
        .accessories
        .iter()
        .chain(car.functionalities.iter())
        .cloned()
        .collect();

    Ok(Json(CarDetailView {
        title: car_title(&car),
        location: city_country(&car.address),
        mileage: format_mileage(&car.mileage),
        price: format!("${}", car.rental_price),
        car_type: car_type_label(&car.car_type),
        accessories_and_functionalities,
        favorite,
        car,
    }))
}

pub async fn book_car(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    JsonExtract(request): JsonExtract<BookingRequest>,
) -> AppResult<Json<BookingResponse>> {
    tracing::info!("[HANDLER] /api/cars/:id/booking - Booking request for car: {}", id);

    let today = chrono::Local::now().date_naive();
    // Validation is local; invalid bookings never reach the listing API
    let booking = request.validate(&id, today).map_err(AppError::Validation)?;

    let car = app_state.source.car_by_id(&id).await.map_err(|e| {
        tracing::warn!("[HANDLER] /api/cars/:id/booking - Car '{}' unavailable: {}", id, e);
        AppError::NotFound("Car not found".to_string())
    })?;

    let message = booking.confirmation_message(&car_title(&car));
    tracing::info!("[HANDLER] /api/cars/:id/booking - Booked car {} for {}", id, booking.email);
    Ok(Json(BookingResponse {
        success: true,
        message,
        booking,
    }))
}
