use serde::Deserialize;
use std::str::FromStr;

use crate::store::{CatalogFilter, FuelType, Transmission};

/// Raw query-string filters. Everything arrives as text and is parsed
/// leniently: blank or malformed values impose no constraint instead of
/// failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub min_year: Option<String>,
    pub max_year: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub transmission: Option<String>,
    pub fuel_type: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

fn parse_lenient<T: FromStr>(value: Option<String>) -> Option<T> {
    non_blank(value).and_then(|v| v.parse().ok())
}

fn parse_transmission(value: Option<String>) -> Option<Transmission> {
    match non_blank(value).as_deref() {
        Some("manual") => Some(Transmission::Manual),
        Some("automatic") => Some(Transmission::Automatic),
        _ => None,
    }
}

fn parse_fuel_type(value: Option<String>) -> Option<FuelType> {
    match non_blank(value).as_deref() {
        Some("gasoline") => Some(FuelType::Gasoline),
        Some("diesel") => Some(FuelType::Diesel),
        Some("electric") => Some(FuelType::Electric),
        Some("hybrid") => Some(FuelType::Hybrid),
        _ => None,
    }
}

impl SearchQuery {
    pub fn into_filter(self) -> CatalogFilter {
        CatalogFilter {
            brand: non_blank(self.brand),
            model: non_blank(self.model),
            min_year: parse_lenient(self.min_year),
            max_year: parse_lenient(self.max_year),
            min_price: parse_lenient(self.min_price),
            max_price: parse_lenient(self.max_price),
            transmission: parse_transmission(self.transmission),
            fuel_type: parse_fuel_type(self.fuel_type),
        }
    }
}

#[cfg(test)]
mod search_query_tests {
    use super::*;

    #[test]
    fn blank_and_malformed_values_impose_no_constraint() {
        let query = SearchQuery {
            brand: Some("  ".into()),
            min_year: Some("not-a-number".into()),
            max_price: Some("".into()),
            transmission: Some("flux-capacitor".into()),
            ..Default::default()
        };
        let filter = query.into_filter();
        assert!(filter.brand.is_none());
        assert!(filter.min_year.is_none());
        assert!(filter.max_price.is_none());
        assert!(filter.transmission.is_none());
    }

    #[test]
    fn well_formed_values_are_kept() {
        let query = SearchQuery {
            brand: Some("Toyota".into()),
            min_year: Some("2019".into()),
            max_year: Some("2021".into()),
            fuel_type: Some("hybrid".into()),
            ..Default::default()
        };
        let filter = query.into_filter();
        assert_eq!(filter.brand.as_deref(), Some("Toyota"));
        assert_eq!(filter.min_year, Some(2019));
        assert_eq!(filter.max_year, Some(2021));
        assert_eq!(filter.fuel_type, Some(FuelType::Hybrid));
    }
}
