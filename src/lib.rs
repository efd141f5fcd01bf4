//! Car-rental catalog: listing API client with retries, the paginated
//! catalog controller with URL-state sync, favorites and filter persistence,
//! form validation, and an axum host exposing it all as a JSON API.

pub mod catalog;
pub mod config;
pub mod error;
pub mod favorites;
pub mod format;
pub mod forms;
pub mod models;
pub mod query;
pub mod refine;
pub mod rental_api;
pub mod retry;
pub mod routes;
pub mod session;
pub mod storage;

pub use catalog::{Applied, CatalogController, CatalogState, CatalogView, PAGE_SIZE, ViewStatus};
pub use error::{ApiError, AppError, StorageError, ValidationError};
pub use models::{Car, CarsPage, FilterCriteria, ListingState, LooseNumber};
pub use rental_api::{CarSource, RentalApiClient};
