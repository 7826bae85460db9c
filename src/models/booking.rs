use std::fmt;

use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Guide,
    Vehicle,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Guide => "guide",
            TargetType::Vehicle => "vehicle",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "guide" => Some(TargetType::Guide),
            "vehicle" => Some(TargetType::Vehicle),
            _ => None,
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to the booked service: a guide or a vehicle, by type and id.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceRef {
    pub service_type: TargetType,
    pub service_id: ObjectId,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// The booking state machine: pending -> {confirmed, cancelled},
    /// confirmed -> {completed, cancelled}. Terminal states have no edges.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Completed)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Booking {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub tourist: ObjectId,
    pub service_type: TargetType,
    pub service_id: ObjectId,
    pub start_date: DateTime,
    pub end_date: DateTime,
    pub party_size: i32,
    pub contact_phone: String,
    pub special_requests: Option<String>,
    /// Computed by the booking intent upstream, never derived here.
    pub total_price: f64,
    pub status: BookingStatus,
    pub reviewed: bool,
    pub completed_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Booking {
    pub fn service_ref(&self) -> ServiceRef {
        ServiceRef {
            service_type: self.service_type,
            service_id: self.service_id,
        }
    }

    pub fn can_be_reviewed(&self) -> bool {
        self.status == BookingStatus::Completed && !self.reviewed
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateBookingDto {
    pub service_type: TargetType,
    pub service_id: String,
    pub start_date: chrono::DateTime<chrono::Utc>,
    pub end_date: chrono::DateTime<chrono::Utc>,
    pub party_size: i32,
    pub contact_phone: String,
    pub special_requests: Option<String>,
    pub total_price: f64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateBookingStatusDto {
    pub status: BookingStatus,
}
