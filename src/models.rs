// Data structures shared by the API client, the catalog controller and the host

use serde::{Deserialize, Serialize};
use std::fmt;

// A value the listing API sends either as a JSON number or as a numeric string
// (mileage, rentalPrice).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

impl LooseNumber {
    /// Integer form of the value. Strings use leading-integer parsing, so
    /// `"1200 km"` yields 1200 and `"n/a"` yields `None`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            LooseNumber::Int(i) => Some(*i),
            LooseNumber::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            LooseNumber::Float(_) => None,
            LooseNumber::Text(s) => parse_leading_int(s),
        }
    }
}

impl Default for LooseNumber {
    fn default() -> Self {
        LooseNumber::Int(0)
    }
}

impl fmt::Display for LooseNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LooseNumber::Int(i) => write!(f, "{}", i),
            LooseNumber::Float(v) => write!(f, "{}", v),
            LooseNumber::Text(s) => f.write_str(s),
        }
    }
}

/// Parses an optional sign followed by digits after leading whitespace;
/// anything after the digits is ignored.
pub fn parse_leading_int(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    let value: i64 = rest[..digits_end].parse().ok()?;
    Some(if negative { -value } else { value })
}

// A rental car as returned by GET /cars and GET /cars/{id}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: String,
    #[serde(default)]
    pub year: u16,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    #[serde(rename = "type", default)]
    pub car_type: String,
    #[serde(default)]
    pub img: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fuel_consumption: String,
    #[serde(default)]
    pub engine_size: String,
    #[serde(default)]
    pub accessories: Vec<String>,
    #[serde(default)]
    pub functionalities: Vec<String>,
    #[serde(default)]
    pub rental_price: LooseNumber,
    #[serde(default)]
    pub rental_company: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub rental_conditions: Vec<String>,
    #[serde(default)]
    pub mileage: LooseNumber,
}

// Body of GET /cars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarsPage {
    #[serde(default)]
    pub cars: Vec<Car>,
    #[serde(default)]
    pub total_cars: u32,
    #[serde(default)]
    pub total_pages: u32,
}

/// The four catalog filter fields, in their fixed query-string order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Brand,
    RentalPrice,
    MinMileage,
    MaxMileage,
}

impl FilterField {
    pub const ALL: [FilterField; 4] = [
        FilterField::Brand,
        FilterField::RentalPrice,
        FilterField::MinMileage,
        FilterField::MaxMileage,
    ];

    pub fn query_key(self) -> &'static str {
        match self {
            FilterField::Brand => "brand",
            FilterField::RentalPrice => "rentalPrice",
            FilterField::MinMileage => "minMileage",
            FilterField::MaxMileage => "maxMileage",
        }
    }

    pub fn from_query_key(key: &str) -> Option<Self> {
        FilterField::ALL.into_iter().find(|f| f.query_key() == key)
    }
}

// Brand/price/mileage constraints, sourced from the catalog URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rental_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_mileage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_mileage: Option<String>,
}

impl FilterCriteria {
    pub fn get(&self, field: FilterField) -> Option<&str> {
        match field {
            FilterField::Brand => self.brand.as_deref(),
            FilterField::RentalPrice => self.rental_price.as_deref(),
            FilterField::MinMileage => self.min_mileage.as_deref(),
            FilterField::MaxMileage => self.max_mileage.as_deref(),
        }
    }

    /// Sets one field; an empty value clears it.
    pub fn set(&mut self, field: FilterField, value: &str) {
        let value = (!value.trim().is_empty()).then(|| value.to_string());
        let slot = match field {
            FilterField::Brand => &mut self.brand,
            FilterField::RentalPrice => &mut self.rental_price,
            FilterField::MinMileage => &mut self.min_mileage,
            FilterField::MaxMileage => &mut self.max_mileage,
        };
        *slot = value;
    }

    pub fn clear(&mut self) {
        *self = FilterCriteria::default();
    }

    /// Copy with empty or whitespace-only fields treated as absent.
    pub fn normalized(&self) -> FilterCriteria {
        let mut out = FilterCriteria::default();
        for field in FilterField::ALL {
            if let Some(value) = self.get(field) {
                out.set(field, value);
            }
        }
        out
    }

    pub fn has_active_filters(&self) -> bool {
        FilterField::ALL
            .into_iter()
            .any(|f| self.get(f).is_some_and(|v| !v.is_empty()))
    }
}

// Paginated car-list state owned by the catalog controller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingState {
    pub items: Vec<Car>,
    pub total_count: u32,
    /// 1-based, last successfully loaded page.
    pub page: u32,
    pub page_count: u32,
    pub loading: bool,
    pub error_message: Option<String>,
}

impl Default for ListingState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            page: 1,
            page_count: 1,
            loading: false,
            error_message: None,
        }
    }
}
