// Client for the remote car-rental listing API (GET /cars, /cars/{id}, /brands)

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    config::Settings,
    error::ApiError,
    models::{Car, CarsPage, FilterCriteria, FilterField},
    retry::RetryPolicy,
};

const USER_AGENT: &str = concat!("rentalcar_catalog/", env!("CARGO_PKG_VERSION"));

// What the catalog, favorites and detail views need from the listing source.
// Tests substitute scripted fakes.
#[async_trait]
pub trait CarSource: Send + Sync {
    async fn search_cars(
        &self,
        criteria: &FilterCriteria,
        page: u32,
        limit: u32,
    ) -> Result<CarsPage, ApiError>;

    async fn car_by_id(&self, id: &str) -> Result<Car, ApiError>;

    async fn brands(&self) -> Result<Vec<String>, ApiError>;

    async fn total_cars_count(&self) -> Result<u32, ApiError> {
        let page = self.search_cars(&FilterCriteria::default(), 1, 1).await?;
        Ok(page.total_cars)
    }
}

pub struct RentalApiClient {
    http: Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl RentalApiClient {
    pub fn new(http: Client, base_url: &str, retry: RetryPolicy) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("Invalid API base URL '{}'", base_url))?;
        // Url::join replaces the last path segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http,
            base_url,
            retry,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.request_timeout())
            .build()
            .context("Failed to build reqwest client for listing API")?;
        Self::new(http, &settings.api_base_url, settings.retry_policy())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid request path '{}': {}", path, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    // GET with retries: network errors and 5xx are retried, 4xx surface at once
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let label = url.path().to_string();
        self.retry
            .run(&label, |attempt| {
                let url = url.clone();
                async move {
                    tracing::debug!(%url, attempt, "GET");
                    let response = self
                        .http
                        .get(url)
                        .send()
                        .await
                        .map_err(|e| ApiError::NetworkFailure(e.to_string()))?;

                    let status = response.status();
                    if status.is_server_error() {
                        return Err(ApiError::ServerFailure {
                            status: status.as_u16(),
                            attempts: attempt + 1,
                        });
                    }
                    if status.is_client_error() {
                        return Err(ApiError::ClientFailure {
                            status: status.as_u16(),
                            message: client_failure_message(status),
                        });
                    }

                    let bytes = response
                        .bytes()
                        .await
                        .map_err(|e| ApiError::NetworkFailure(e.to_string()))?;
                    serde_json::from_slice::<T>(&bytes)
                        .map_err(|e| ApiError::InvalidResponse(e.to_string()))
                }
            })
            .await
    }
}

fn client_failure_message(status: StatusCode) -> String {
    match status {
        StatusCode::NOT_FOUND => "Car not found".to_string(),
        other => other
            .canonical_reason()
            .unwrap_or("Request rejected")
            .to_string(),
    }
}

/// Query pairs for GET /cars: page and limit first, then the defined filter fields.
pub fn search_query(criteria: &FilterCriteria, page: u32, limit: u32) -> Vec<(&'static str, String)> {
    let mut pairs = vec![("page", page.to_string()), ("limit", limit.to_string())];
    for field in FilterField::ALL {
        if let Some(value) = criteria.get(field).filter(|v| !v.is_empty()) {
            pairs.push((field.query_key(), value.to_string()));
        }
    }
    pairs
}

#[async_trait]
impl CarSource for RentalApiClient {
    async fn search_cars(
        &self,
        criteria: &FilterCriteria,
        page: u32,
        limit: u32,
    ) -> Result<CarsPage, ApiError> {
        let url = self.endpoint("cars", &search_query(criteria, page, limit))?;
        let result: CarsPage = self.get_json(url).await?;
        tracing::debug!(
            page,
            returned = result.cars.len(),
            total = result.total_cars,
            total_pages = result.total_pages,
            "Fetched cars page"
        );
        Ok(result)
    }

    async fn car_by_id(&self, id: &str) -> Result<Car, ApiError> {
        let mut url = self.endpoint("cars", &[])?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidRequest("API base URL cannot carry a path".into()))?
            .push(id);
        self.get_json(url).await
    }

    async fn brands(&self) -> Result<Vec<String>, ApiError> {
        let url = self.endpoint("brands", &[])?;
        self.get_json(url).await
    }
}
