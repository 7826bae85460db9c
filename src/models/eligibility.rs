use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Time-boxed grant recorded when a booking completes. Supports "can I
/// review this?" lookups; the authoritative rule remains the booking status
/// plus the absence of an existing review.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReviewEligibility {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub booking: ObjectId,
    pub tourist: ObjectId,
    pub service_type: super::TargetType,
    pub service_id: ObjectId,
    pub eligible: bool,
    pub review_submitted: bool,
    pub expires_at: DateTime,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}
