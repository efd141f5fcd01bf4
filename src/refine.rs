// Local-only narrowing of already-loaded cars (no network call)

use crate::models::{Car, FilterCriteria, LooseNumber, parse_leading_int};

/// How the rentalPrice criterion matches a car's price.
/// Only exact matching is supported: the price is picked from discrete buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PricePolicy {
    #[default]
    Exact,
}

impl PricePolicy {
    pub fn matches(self, price: &LooseNumber, wanted: &str) -> bool {
        match self {
            PricePolicy::Exact => match (price.as_int(), parse_leading_int(wanted)) {
                (Some(have), Some(want)) => have == want,
                _ => price.to_string().trim() == wanted.trim(),
            },
        }
    }
}

/// Returns the cars that satisfy `criteria`, keeping their relative order.
/// A bound that does not parse as an integer constrains nothing, and a car
/// whose mileage has no integer form is never dropped by a bound.
pub fn apply_refinement_filter(items: &[Car], criteria: &FilterCriteria) -> Vec<Car> {
    let criteria = criteria.normalized();
    let policy = PricePolicy::default();
    let min = criteria.min_mileage.as_deref().and_then(parse_leading_int);
    let max = criteria.max_mileage.as_deref().and_then(parse_leading_int);

    items
        .iter()
        .filter(|car| {
            if let Some(wanted) = criteria.rental_price.as_deref() {
                if !policy.matches(&car.rental_price, wanted) {
                    return false;
                }
            }
            let mileage = car.mileage.as_int();
            if let (Some(min), Some(km)) = (min, mileage) {
                if km < min {
                    return false;
                }
            }
            if let (Some(max), Some(km)) = (max, mileage) {
                if km > max {
                    return false;
                }
            }
            true
        })
        .cloned()
        .collect()
}
