use serde::Deserialize;

use crate::images::ImageUpload;
use crate::store::{FuelType, ListingAttributes, Transmission};

#[derive(Debug, Deserialize)]
pub struct CreateDraftRequest {
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
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

impl CreateDraftRequest {
    pub fn attributes(&self) -> ListingAttributes {
        ListingAttributes {
            brand: self.brand.clone(),
            model: self.model.clone(),
            year: self.year,
            price: self.price,
            description: self.description.clone(),
            mileage: self.mileage,
            transmission: self.transmission,
            fuel_type: self.fuel_type,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateDraftRequest {
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
