use mongodb::bson::oid::ObjectId;

use crate::db::Store;
use crate::models::{Booking, BookingStatus};
use crate::services::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EligibilityStatus {
    Eligible,
    NotCompleted,
    AlreadyReviewed,
}

impl EligibilityStatus {
    pub fn is_eligible(&self) -> bool {
        matches!(self, EligibilityStatus::Eligible)
    }

    pub fn reason(&self) -> Option<&'static str> {
        match self {
            EligibilityStatus::Eligible => None,
            EligibilityStatus::NotCompleted => Some("Can only review completed bookings"),
            EligibilityStatus::AlreadyReviewed => Some("You have already reviewed this booking"),
        }
    }
}

/// Whether a booking may receive a new review from the requesting user.
/// The grant records written at completion time are advisory only; this
/// check reads the booking and review records directly, and is re-run
/// inside review creation rather than trusted from an earlier call.
pub async fn check(
    store: &dyn Store,
    booking_id: ObjectId,
    requesting_user: ObjectId,
) -> ServiceResult<(Booking, EligibilityStatus)> {
    let booking = store
        .find_booking(booking_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Booking not found".to_string()))?;

    if booking.tourist != requesting_user {
        return Err(ServiceError::Authorization(
            "Not authorized to review this booking".to_string(),
        ));
    }
    if booking.status != BookingStatus::Completed {
        return Ok((booking, EligibilityStatus::NotCompleted));
    }
    if store.find_review_by_booking(booking_id).await?.is_some() {
        return Ok((booking, EligibilityStatus::AlreadyReviewed));
    }
    Ok((booking, EligibilityStatus::Eligible))
}
