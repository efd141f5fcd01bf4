// Display helpers for car cards and the detail view

use crate::models::{Car, LooseNumber};

/// `5858` -> `"5 858 km"`. Values without a numeric form are returned as-is.
pub fn format_mileage(value: &LooseNumber) -> String {
    let number = match value {
        LooseNumber::Int(i) => Some(*i),
        LooseNumber::Float(f) if f.is_finite() => Some(f.round() as i64),
        LooseNumber::Float(_) => None,
        LooseNumber::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.round() as i64),
    };
    match number {
        Some(n) => format!("{} km", group_thousands(n)),
        None => value.to_string(),
    }
}

fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}

/// Last two comma-separated parts of an address ("Kiev, Ukraine").
pub fn city_country(address: &str) -> String {
    let parts: Vec<&str> = address.split(',').map(str::trim).collect();
    if parts.len() >= 2 {
        parts[parts.len() - 2..].join(", ")
    } else {
        address.to_string()
    }
}

pub fn car_title(car: &Car) -> String {
    format!("{} {}, {}", car.brand, car.model, car.year)
}

pub fn car_type_label(car_type: &str) -> String {
    let mut chars = car_type.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}
