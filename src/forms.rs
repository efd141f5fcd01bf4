// Filter-form and booking-form validation; resolved locally, never sent upstream

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{error::ValidationError, models::FilterCriteria};

pub const PRICE_BUCKETS: [&str; 6] = ["30", "40", "50", "60", "70", "80"];

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 50;
const COMMENT_MAX_CHARS: usize = 500;

// Raw filter form fields as submitted
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterForm {
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub rental_price: String,
    #[serde(default)]
    pub min_mileage: String,
    #[serde(default)]
    pub max_mileage: String,
}

impl FilterForm {
    /// Pre-fills the form from persisted criteria.
    pub fn from_criteria(criteria: &FilterCriteria) -> Self {
        Self {
            brand: criteria.brand.clone().unwrap_or_default(),
            rental_price: criteria.rental_price.clone().unwrap_or_default(),
            min_mileage: criteria.min_mileage.clone().unwrap_or_default(),
            max_mileage: criteria.max_mileage.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<FilterCriteria, ValidationError> {
        let min = parse_mileage(&self.min_mileage, "minMileage")?;
        let max = parse_mileage(&self.max_mileage, "maxMileage")?;
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(ValidationError::MileageRange { min, max });
            }
        }

        let rental_price = self.rental_price.trim();
        if !rental_price.is_empty() && !PRICE_BUCKETS.contains(&rental_price) {
            return Err(ValidationError::UnknownPriceBucket(rental_price.to_string()));
        }

        Ok(FilterCriteria {
            brand: non_empty(&self.brand),
            rental_price: non_empty(rental_price),
            min_mileage: min.map(|v| v.to_string()),
            max_mileage: max.map(|v| v.to_string()),
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_mileage(value: &str, field: &'static str) -> Result<Option<u64>, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| ValidationError::InvalidNumber { field })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub car_id: String,
    pub name: String,
    pub email: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub comment: Option<String>,
}

impl Booking {
    pub fn confirmation_message(&self, car_name: &str) -> String {
        format!(
            "Successfully booked {} from {} to {}! We'll contact you at {}",
            car_name,
            self.start_date.format("%d/%m/%Y"),
            self.end_date.format("%d/%m/%Y"),
            self.email
        )
    }
}

impl BookingRequest {
    /// Validates every field against `today` and reports all problems at once.
    pub fn validate(&self, car_id: &str, today: NaiveDate) -> Result<Booking, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let field = |field, message| ValidationError::Field { field, message };

        let name = self.name.trim();
        let name_len = name.chars().count();
        if name.is_empty() {
            errors.push(field("name", "Name is required"));
        } else if name_len < NAME_MIN_CHARS {
            errors.push(field("name", "Minimum 2 characters"));
        } else if name_len > NAME_MAX_CHARS {
            errors.push(field("name", "Maximum 50 characters"));
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.push(field("email", "Email is required"));
        } else if !looks_like_email(email) {
            errors.push(field("email", "Invalid email format"));
        }

        match self.start_date {
            None => errors.push(field("startDate", "Start date is required")),
            Some(start) if start < today => {
                errors.push(field("startDate", "Start date must be today or in the future"))
            }
            Some(_) => {}
        }

        match (self.start_date, self.end_date) {
            (_, None) => errors.push(field("endDate", "End date is required")),
            (Some(start), Some(end)) if end < start => {
                errors.push(field("endDate", "End date must be after start date"))
            }
            (None, Some(_)) => errors.push(field("endDate", "End date must be after start date")),
            _ => {}
        }

        let comment = self
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        if comment.is_some_and(|c| c.chars().count() > COMMENT_MAX_CHARS) {
            errors.push(field("comment", "Maximum 500 characters"));
        }

        match (self.start_date, self.end_date) {
            (Some(start_date), Some(end_date)) if errors.is_empty() => Ok(Booking {
                car_id: car_id.to_string(),
                name: name.to_string(),
                email: email.to_string(),
                start_date,
                end_date,
                comment: comment.map(str::to_string),
            }),
            _ => Err(errors),
        }
    }
}

fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}
