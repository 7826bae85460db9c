use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

/// Strength tags a tourist may pick when reviewing a guide.
pub const GUIDE_STRENGTHS: &[&str] = &[
    "knowledge",
    "communication",
    "punctuality",
    "friendliness",
    "professionalism",
];

/// Strength tags for vehicle reviews.
pub const VEHICLE_STRENGTHS: &[&str] = &[
    "vehicle-condition",
    "driving-skills",
    "punctuality",
    "professionalism",
];

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Unique: at most one review per booking.
    pub booking: ObjectId,
    pub author: ObjectId,
    pub target_type: super::TargetType,
    pub target_id: ObjectId,
    pub rating: i32, // 1-5
    pub title: String,
    pub comment: String,
    pub would_recommend: bool,
    pub strengths: Vec<String>,
    pub is_public: bool,
    /// Set only by the owner of the reviewed guide/vehicle.
    pub owner_reply: Option<String>,
    pub service_date: DateTime,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Review {
    pub fn target_ref(&self) -> super::ServiceRef {
        super::ServiceRef {
            service_type: self.target_type,
            service_id: self.target_id,
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateReviewDto {
    pub booking_id: String,
    pub target_type: super::TargetType,
    pub target_id: String,
    pub rating: i32,
    pub title: Option<String>,
    pub comment: String,
    pub would_recommend: Option<bool>,
    pub strengths: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct UpdateReviewDto {
    pub rating: Option<i32>,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub would_recommend: Option<bool>,
    pub is_public: Option<bool>,
    pub owner_reply: Option<String>,
}
