// URL query contract for the catalog page: FilterCriteria <-> query string.
// The URL is the single source of truth for the active criteria.

use url::form_urlencoded;

use crate::models::{FilterCriteria, FilterField};

pub const CATALOG_PATH: &str = "/catalog";

/// Serializes the defined fields in the fixed order
/// brand, rentalPrice, minMileage, maxMileage.
pub fn to_query_string(criteria: &FilterCriteria) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for field in FilterField::ALL {
        if let Some(value) = criteria.get(field).filter(|v| !v.is_empty()) {
            serializer.append_pair(field.query_key(), value);
        }
    }
    serializer.finish()
}

/// Parses a query string (leading `?` optional). Unknown keys are ignored,
/// empty values mean "no constraint", and the first occurrence of a key wins.
pub fn from_query_string(query: &str) -> FilterCriteria {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut criteria = FilterCriteria::default();
    let mut seen = Vec::with_capacity(FilterField::ALL.len());

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let Some(field) = FilterField::from_query_key(&key) else {
            continue;
        };
        if seen.contains(&field) {
            continue;
        }
        seen.push(field);
        criteria.set(field, &value);
    }
    criteria
}

/// Navigation target for the catalog with the given criteria applied.
pub fn catalog_location(criteria: &FilterCriteria) -> String {
    let query = to_query_string(criteria);
    if query.is_empty() {
        CATALOG_PATH.to_string()
    } else {
        format!("{}?{}", CATALOG_PATH, query)
    }
}
