#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use rentalcar_catalog::{ApiError, Car, CarSource, CarsPage, FilterCriteria};
use tokio::sync::{mpsc, oneshot};

pub fn car(id: &str, brand: &str, mileage: i64, price: &str) -> Car {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "year": 2019,
        "brand": brand,
        "model": "Test",
        "type": "SUV",
        "img": format!("https://img.example/{}.jpg", id),
        "rentalPrice": price,
        "address": "1 Main Street, Kyiv, Ukraine",
        "mileage": mileage,
    }))
    .unwrap()
}

pub fn fleet(count: usize, brand: &str) -> Vec<Car> {
    (0..count)
        .map(|i| car(&format!("{}-{}", brand.to_lowercase(), i), brand, 1000 + i as i64 * 100, "40"))
        .collect()
}

pub fn brand(name: &str) -> FilterCriteria {
    FilterCriteria {
        brand: Some(name.to_string()),
        ..Default::default()
    }
}

pub fn ids(cars: &[Car]) -> Vec<String> {
    cars.iter().map(|c| c.id.clone()).collect()
}

/// In-memory listing API: filters by brand server-side and pages the result.
pub struct FleetSource {
    cars: Vec<Car>,
    fail_pages: HashSet<u32>,
    fail_brands: bool,
    search_calls: AtomicU32,
    by_id_calls: AtomicU32,
    last_search: Mutex<Option<(FilterCriteria, u32, u32)>>,
}

impl FleetSource {
    pub fn new(cars: Vec<Car>) -> Self {
        Self {
            cars,
            fail_pages: HashSet::new(),
            fail_brands: false,
            search_calls: AtomicU32::new(0),
            by_id_calls: AtomicU32::new(0),
            last_search: Mutex::new(None),
        }
    }

    pub fn failing_on(mut self, page: u32) -> Self {
        self.fail_pages.insert(page);
        self
    }

    pub fn failing_brands(mut self) -> Self {
        self.fail_brands = true;
        self
    }

    pub fn search_calls(&self) -> u32 {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn by_id_calls(&self) -> u32 {
        self.by_id_calls.load(Ordering::SeqCst)
    }

    pub fn last_search(&self) -> Option<(FilterCriteria, u32, u32)> {
        self.last_search.lock().unwrap().clone()
    }
}

#[async_trait]
impl CarSource for FleetSource {
    async fn search_cars(&self, criteria: &FilterCriteria, page: u32, limit: u32) -> Result<CarsPage, ApiError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_search.lock().unwrap() = Some((criteria.clone(), page, limit));
        if self.fail_pages.contains(&page) {
            return Err(ApiError::ServerFailure { status: 503, attempts: 4 });
        }

        let matching: Vec<Car> = self
            .cars
            .iter()
            .filter(|c| criteria.brand.as_deref().is_none_or(|b| c.brand == b))
            .cloned()
            .collect();
        let total_cars = matching.len() as u32;
        let total_pages = total_cars.div_ceil(limit);
        let start = ((page - 1) * limit) as usize;
        let cars = matching.into_iter().skip(start).take(limit as usize).collect();
        Ok(CarsPage { cars, total_cars, total_pages })
    }

    async fn car_by_id(&self, id: &str) -> Result<Car, ApiError> {
        self.by_id_calls.fetch_add(1, Ordering::SeqCst);
        self.cars
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| ApiError::ClientFailure { status: 404, message: "Car not found".into() })
    }

    async fn brands(&self) -> Result<Vec<String>, ApiError> {
        if self.fail_brands {
            return Err(ApiError::ServerFailure { status: 502, attempts: 4 });
        }
        let mut brands: Vec<String> = Vec::new();
        for car in &self.cars {
            if !brands.contains(&car.brand) {
                brands.push(car.brand.clone());
            }
        }
        Ok(brands)
    }
}

/// A search the test resolves by hand, in whatever order it likes.
pub struct PendingSearch {
    pub criteria: FilterCriteria,
    pub page: u32,
    pub respond: oneshot::Sender<Result<CarsPage, ApiError>>,
}

pub struct GatedSource {
    calls: mpsc::UnboundedSender<PendingSearch>,
}

impl GatedSource {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PendingSearch>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { calls: tx }, rx)
    }
}

#[async_trait]
impl CarSource for GatedSource {
    async fn search_cars(&self, criteria: &FilterCriteria, page: u32, _limit: u32) -> Result<CarsPage, ApiError> {
        let (respond, response) = oneshot::channel();
        self.calls
            .send(PendingSearch { criteria: criteria.clone(), page, respond })
            .map_err(|_| ApiError::NetworkFailure("test harness gone".into()))?;
        response
            .await
            .unwrap_or_else(|_| Err(ApiError::NetworkFailure("response dropped".into())))
    }

    async fn car_by_id(&self, _id: &str) -> Result<Car, ApiError> {
        Err(ApiError::ClientFailure { status: 404, message: "Car not found".into() })
    }

    async fn brands(&self) -> Result<Vec<String>, ApiError> {
        Ok(Vec::new())
    }
}

pub fn page_of(cars: Vec<Car>, total_cars: u32, total_pages: u32) -> CarsPage {
    CarsPage { cars, total_cars, total_pages }
}
