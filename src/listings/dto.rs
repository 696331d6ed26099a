use serde::Deserialize;

use crate::images::ImageUpload;
use crate::store::{FuelType, ListingAttributes, Transmission};

#[derive(Debug, Deserialize)]
pub struct CreateListingRequest {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: i64,
    pub description: String,
    pub mileage: i32,
    pub transmission: Transmission,
    pub fuel_type: FuelType,
    #[serde(default)]
    pub images: Vec<ImageUpload>,
}

impl CreateListingRequest {
    pub fn into_parts(self) -> (ListingAttributes, Vec<ImageUpload>) {
        (
            ListingAttributes {
                brand: self.brand,
                model: self.model,
                year: self.year,
                price: self.price,
                description: self.description,
                mileage: self.mileage,
                transmission: self.transmission,
                fuel_type: self.fuel_type,
            },
            self.images,
        )
    }
}

/// Partial update; fields left out of the body keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateListingRequest {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub price: Option<i64>,
    pub description: Option<String>,
    pub mileage: Option<i32>,
    pub transmission: Option<Transmission>,
    pub fuel_type: Option<FuelType>,
    pub images: Option<Vec<ImageUpload>>,
}
