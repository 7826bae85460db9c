use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, FromFormField, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Car,
    Van,
    Tuktuk,
    Bus,
    Suv,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Car => "car",
            VehicleType::Van => "van",
            VehicleType::Tuktuk => "tuktuk",
            VehicleType::Bus => "bus",
            VehicleType::Suv => "suv",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Amenity {
    Ac,
    Wifi,
    ChargingPorts,
    EnglishSpeakingDriver,
    ChildSeats,
    Cooler,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Vehicle {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user: ObjectId,
    pub vehicle_type: VehicleType,
    pub vehicle_model: String,
    pub vehicle_year: i32,
    /// Stored upper-case. Unique across vehicles.
    pub license_plate: String,
    pub capacity: i32,
    pub amenities: Vec<Amenity>,
    pub hourly_rate: f64,
    pub daily_rate: f64,
    pub driver_name: String,
    pub driver_phone: String,
    pub locations: Vec<String>,
    pub is_verified: bool,
    pub is_available: bool,
    /// Written only by the rating aggregator.
    pub rating: f64,
    pub total_reviews: i32,
    pub created_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RegisterVehicleDto {
    pub vehicle_type: VehicleType,
    pub vehicle_model: String,
    pub vehicle_year: i32,
    pub license_plate: String,
    pub capacity: i32,
    pub amenities: Option<Vec<Amenity>>,
    pub hourly_rate: f64,
    pub daily_rate: f64,
    pub driver_name: String,
    pub driver_phone: String,
    pub locations: Option<Vec<String>>,
}
