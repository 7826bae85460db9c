use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Guide {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user: ObjectId,
    /// Government-issued guide registration number. Unique across guides.
    pub guide_id: String,
    pub experience: i32,
    pub languages: Vec<String>,
    pub specialties: Vec<String>,
    pub bio: Option<String>,
    pub hourly_rate: f64,
    pub daily_rate: f64,
    pub locations: Vec<String>,
    pub is_verified: bool,
    pub is_available: bool,
    /// Written only by the rating aggregator.
    pub rating: f64,
    pub total_reviews: i32,
    pub created_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RegisterGuideDto {
    pub guide_id: String,
    pub experience: i32,
    pub languages: Vec<String>,
    pub specialties: Option<Vec<String>>,
    pub bio: Option<String>,
    pub hourly_rate: f64,
    pub daily_rate: f64,
    pub locations: Option<Vec<String>>,
}
