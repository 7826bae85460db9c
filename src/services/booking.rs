use chrono::Utc;
use log::error;
use mongodb::bson::{oid::ObjectId, DateTime};

use crate::db::Store;
use crate::models::{
    Booking, BookingStatus, Identity, ReviewEligibility, Role, ServiceRef, TargetType,
};
use crate::services::error::{ServiceError, ServiceResult};
use crate::utils::validate_phone;

pub const MIN_PARTY_SIZE: i32 = 1;
pub const MAX_PARTY_SIZE: i32 = 40;

/// Validated input for a new booking. The price is computed by the booking
/// intent upstream and passed through.
pub struct NewBooking {
    pub service: ServiceRef,
    pub start_date: chrono::DateTime<Utc>,
    pub end_date: chrono::DateTime<Utc>,
    pub party_size: i32,
    pub contact_phone: String,
    pub special_requests: Option<String>,
    pub total_price: f64,
}

pub async fn create(
    store: &dyn Store,
    identity: &Identity,
    new: NewBooking,
) -> ServiceResult<Booking> {
    if new.end_date <= new.start_date {
        return Err(ServiceError::Validation(
            "End date must be after start date".to_string(),
        ));
    }
    if new.start_date < Utc::now() {
        return Err(ServiceError::Validation(
            "Start date cannot be in the past".to_string(),
        ));
    }
    if !(MIN_PARTY_SIZE..=MAX_PARTY_SIZE).contains(&new.party_size) {
        return Err(ServiceError::Validation(format!(
            "Party size must be between {} and {}",
            MIN_PARTY_SIZE, MAX_PARTY_SIZE
        )));
    }
    let contact_phone = new.contact_phone.trim();
    if contact_phone.is_empty() {
        return Err(ServiceError::Validation(
            "Contact phone is required".to_string(),
        ));
    }
    if !validate_phone(contact_phone) {
        return Err(ServiceError::Validation(
            "Contact phone is not a valid phone number".to_string(),
        ));
    }
    if new.total_price < 0.0 {
        return Err(ServiceError::Validation(
            "Total price cannot be negative".to_string(),
        ));
    }
    if let Some(ref requests) = new.special_requests {
        if requests.len() > 500 {
            return Err(ServiceError::Validation(
                "Special requests cannot exceed 500 characters".to_string(),
            ));
        }
    }
    ensure_target_exists(store, &new.service).await?;

    let now = DateTime::now();
    let mut booking = Booking {
        id: None,
        tourist: identity.user_id,
        service_type: new.service.service_type,
        service_id: new.service.service_id,
        start_date: DateTime::from_millis(new.start_date.timestamp_millis()),
        end_date: DateTime::from_millis(new.end_date.timestamp_millis()),
        party_size: new.party_size,
        contact_phone: contact_phone.to_string(),
        special_requests: new.special_requests,
        total_price: new.total_price,
        status: BookingStatus::Pending,
        reviewed: false,
        completed_at: None,
        created_at: now,
        updated_at: now,
    };
    let id = store.insert_booking(&booking).await?;
    booking.id = Some(id);
    Ok(booking)
}

pub async fn get(
    store: &dyn Store,
    identity: &Identity,
    booking_id: ObjectId,
) -> ServiceResult<Booking> {
    let booking = store
        .find_booking(booking_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Booking not found".to_string()))?;

    let visible = booking.tourist == identity.user_id
        || identity.role == Role::Admin
        || is_target_owner(store, identity, &booking).await?;
    if !visible {
        return Err(ServiceError::Authorization(
            "Not authorized to view this booking".to_string(),
        ));
    }
    Ok(booking)
}

pub async fn list_for_tourist(store: &dyn Store, identity: &Identity) -> ServiceResult<Vec<Booking>> {
    Ok(store.bookings_for_tourist(identity.user_id).await?)
}

/// Moves a booking along the state machine. Transition legality is checked
/// before actor permission so an illegal edge reports as such regardless of
/// who asks.
pub async fn transition(
    store: &dyn Store,
    identity: &Identity,
    booking_id: ObjectId,
    new_status: BookingStatus,
) -> ServiceResult<Booking> {
    let mut booking = store
        .find_booking(booking_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Booking not found".to_string()))?;

    if !booking.status.can_transition_to(new_status) {
        return Err(ServiceError::InvalidTransition {
            from: booking.status,
            to: new_status,
        });
    }
    authorize_transition(identity, &booking, new_status)?;

    let completed_at = match new_status {
        BookingStatus::Completed => Some(DateTime::now()),
        _ => None,
    };
    store
        .update_booking_status(booking_id, new_status, completed_at)
        .await?;
    booking.status = new_status;
    booking.completed_at = completed_at;
    Ok(booking)
}

pub async fn cancel(
    store: &dyn Store,
    identity: &Identity,
    booking_id: ObjectId,
) -> ServiceResult<Booking> {
    transition(store, identity, booking_id, BookingStatus::Cancelled).await
}

/// Completes a booking and issues the time-boxed review-eligibility grant.
/// Repeating the call on an already-completed booking is an error, not a
/// no-op. If the grant fails to persist the status change is rolled back so
/// the operation never half-applies.
pub async fn complete(
    store: &dyn Store,
    identity: &Identity,
    booking_id: ObjectId,
    review_window_days: i64,
) -> ServiceResult<(Booking, ReviewEligibility)> {
    let mut booking = store
        .find_booking(booking_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Booking not found".to_string()))?;

    if booking.status == BookingStatus::Completed {
        return Err(ServiceError::AlreadyCompleted);
    }
    if !booking.status.can_transition_to(BookingStatus::Completed) {
        return Err(ServiceError::InvalidTransition {
            from: booking.status,
            to: BookingStatus::Completed,
        });
    }
    authorize_transition(identity, &booking, BookingStatus::Completed)?;

    let previous_status = booking.status;
    let completed_at = DateTime::now();
    store
        .update_booking_status(booking_id, BookingStatus::Completed, Some(completed_at))
        .await?;

    let mut grant = ReviewEligibility {
        id: None,
        booking: booking_id,
        tourist: booking.tourist,
        service_type: booking.service_type,
        service_id: booking.service_id,
        eligible: true,
        review_submitted: false,
        expires_at: DateTime::from_millis(
            completed_at.timestamp_millis() + review_window_days * 24 * 60 * 60 * 1000,
        ),
        created_at: completed_at,
        updated_at: completed_at,
    };
    match store.insert_eligibility(&grant).await {
        Ok(id) => grant.id = Some(id),
        Err(e) => {
            if let Err(rollback) = store
                .update_booking_status(booking_id, previous_status, None)
                .await
            {
                error!(
                    "failed to roll back booking {} after eligibility write failure: {}",
                    booking_id, rollback
                );
            }
            return Err(e.into());
        }
    }

    booking.status = BookingStatus::Completed;
    booking.completed_at = Some(completed_at);
    Ok((booking, grant))
}

fn authorize_transition(
    identity: &Identity,
    booking: &Booking,
    next: BookingStatus,
) -> ServiceResult<()> {
    let is_staff = identity.role.is_provider() || identity.role == Role::Admin;
    match next {
        BookingStatus::Confirmed | BookingStatus::Completed => {
            if is_staff {
                Ok(())
            } else {
                Err(ServiceError::Authorization(format!(
                    "Only a service provider or admin can mark bookings {}",
                    next
                )))
            }
        }
        BookingStatus::Cancelled => {
            if booking.tourist == identity.user_id || is_staff {
                Ok(())
            } else {
                Err(ServiceError::Authorization(
                    "Not authorized to cancel this booking".to_string(),
                ))
            }
        }
        // No edge re-enters pending; the transition check rejects it first.
        BookingStatus::Pending => Ok(()),
    }
}

async fn ensure_target_exists(store: &dyn Store, service: &ServiceRef) -> ServiceResult<()> {
    let exists = match service.service_type {
        TargetType::Guide => store.find_guide(service.service_id).await?.is_some(),
        TargetType::Vehicle => store.find_vehicle(service.service_id).await?.is_some(),
    };
    if exists {
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!(
            "{} not found",
            match service.service_type {
                TargetType::Guide => "Guide",
                TargetType::Vehicle => "Vehicle",
            }
        )))
    }
}

async fn is_target_owner(
    store: &dyn Store,
    identity: &Identity,
    booking: &Booking,
) -> ServiceResult<bool> {
    Ok(match booking.service_type {
        TargetType::Guide => store
            .find_guide(booking.service_id)
            .await?
            .is_some_and(|g| g.user == identity.user_id),
        TargetType::Vehicle => store
            .find_vehicle(booking.service_id)
            .await?
            .is_some_and(|v| v.user == identity.user_id),
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::models::Guide;

    fn tourist() -> Identity {
        Identity {
            user_id: ObjectId::new(),
            role: Role::Tourist,
        }
    }

    fn provider() -> Identity {
        Identity {
            user_id: ObjectId::new(),
            role: Role::Guide,
        }
    }

    async fn seeded_guide(store: &MemoryStore) -> ObjectId {
        let guide = Guide {
            id: None,
            user: ObjectId::new(),
            guide_id: ObjectId::new().to_hex(),
            experience: 4,
            languages: vec!["English".to_string()],
            specialties: vec!["hiking".to_string()],
            bio: None,
            hourly_rate: 30.0,
            daily_rate: 180.0,
            locations: vec!["Kandy".to_string()],
            is_verified: true,
            is_available: true,
            rating: 0.0,
            total_reviews: 0,
            created_at: DateTime::now(),
        };
        store.insert_guide(&guide).await.unwrap()
    }

    fn new_booking(guide_id: ObjectId) -> NewBooking {
        let start = Utc::now() + Duration::days(7);
        NewBooking {
            service: ServiceRef {
                service_type: TargetType::Guide,
                service_id: guide_id,
            },
            start_date: start,
            end_date: start + Duration::days(2),
            party_size: 2,
            contact_phone: "+94771234567".to_string(),
            special_requests: None,
            total_price: 360.0,
        }
    }

    async fn seeded_booking(store: &MemoryStore, actor: &Identity, status: BookingStatus) -> ObjectId {
        let guide_id = seeded_guide(store).await;
        let booking = create(store, actor, new_booking(guide_id)).await.unwrap();
        let id = booking.id.unwrap();
        if status != BookingStatus::Pending {
            store
                .update_booking_status(id, status, None)
                .await
                .unwrap();
        }
        id
    }

    #[tokio::test]
    async fn create_starts_pending() {
        let store = MemoryStore::new();
        let guide_id = seeded_guide(&store).await;
        let booking = create(&store, &tourist(), new_booking(guide_id)).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert!(!booking.reviewed);
    }

    #[tokio::test]
    async fn create_rejects_inverted_window() {
        let store = MemoryStore::new();
        let guide_id = seeded_guide(&store).await;
        let mut new = new_booking(guide_id);
        new.end_date = new.start_date - Duration::hours(1);
        let err = create(&store, &tourist(), new).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn create_rejects_past_start_date() {
        let store = MemoryStore::new();
        let guide_id = seeded_guide(&store).await;
        let mut new = new_booking(guide_id);
        new.start_date = Utc::now() - Duration::days(1);
        let err = create(&store, &tourist(), new).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn create_rejects_party_size_out_of_bounds() {
        let store = MemoryStore::new();
        let guide_id = seeded_guide(&store).await;
        let mut new = new_booking(guide_id);
        new.party_size = 0;
        assert!(matches!(
            create(&store, &tourist(), new).await.unwrap_err(),
            ServiceError::Validation(_)
        ));

        let mut new = new_booking(guide_id);
        new.party_size = MAX_PARTY_SIZE + 1;
        assert!(matches!(
            create(&store, &tourist(), new).await.unwrap_err(),
            ServiceError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn create_rejects_empty_contact_phone() {
        let store = MemoryStore::new();
        let guide_id = seeded_guide(&store).await;
        let mut new = new_booking(guide_id);
        new.contact_phone = "   ".to_string();
        let err = create(&store, &tourist(), new).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn create_rejects_unknown_target() {
        let store = MemoryStore::new();
        let err = create(&store, &tourist(), new_booking(ObjectId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn provider_confirms_pending_booking() {
        let store = MemoryStore::new();
        let owner = tourist();
        let id = seeded_booking(&store, &owner, BookingStatus::Pending).await;
        let booking = transition(&store, &provider(), id, BookingStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn tourist_cannot_confirm() {
        let store = MemoryStore::new();
        let owner = tourist();
        let id = seeded_booking(&store, &owner, BookingStatus::Pending).await;
        let err = transition(&store, &owner, id, BookingStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Authorization(_)));
    }

    #[tokio::test]
    async fn pending_cannot_complete() {
        let store = MemoryStore::new();
        let owner = tourist();
        let id = seeded_booking(&store, &owner, BookingStatus::Pending).await;
        let err = transition(&store, &provider(), id, BookingStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidTransition {
                from: BookingStatus::Pending,
                to: BookingStatus::Completed,
            }
        ));
    }

    #[tokio::test]
    async fn terminal_states_reject_all_edges() {
        let store = MemoryStore::new();
        let owner = tourist();
        for terminal in [BookingStatus::Completed, BookingStatus::Cancelled] {
            let id = seeded_booking(&store, &owner, terminal).await;
            for next in [
                BookingStatus::Pending,
                BookingStatus::Confirmed,
                BookingStatus::Completed,
                BookingStatus::Cancelled,
            ] {
                let err = transition(&store, &provider(), id, next).await.unwrap_err();
                assert!(matches!(err, ServiceError::InvalidTransition { .. }));
            }
        }
    }

    #[tokio::test]
    async fn owning_tourist_cancels_pending_booking() {
        let store = MemoryStore::new();
        let owner = tourist();
        let id = seeded_booking(&store, &owner, BookingStatus::Pending).await;
        let booking = cancel(&store, &owner, id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn other_tourist_cannot_cancel() {
        let store = MemoryStore::new();
        let owner = tourist();
        let id = seeded_booking(&store, &owner, BookingStatus::Confirmed).await;
        let err = cancel(&store, &tourist(), id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Authorization(_)));
    }

    #[tokio::test]
    async fn transition_missing_booking_is_not_found() {
        let store = MemoryStore::new();
        let err = transition(&store, &provider(), ObjectId::new(), BookingStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn complete_grants_eligibility_and_rejects_repeat() {
        let store = MemoryStore::new();
        let owner = tourist();
        let id = seeded_booking(&store, &owner, BookingStatus::Confirmed).await;

        let (booking, grant) = complete(&store, &provider(), id, 30).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Completed);
        assert!(booking.completed_at.is_some());
        assert_eq!(grant.booking, id);
        assert_eq!(grant.tourist, owner.user_id);
        assert!(grant.eligible);
        assert!(grant.expires_at > grant.created_at);

        let err = complete(&store, &provider(), id, 30).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyCompleted));
    }

    #[tokio::test]
    async fn complete_from_pending_is_invalid() {
        let store = MemoryStore::new();
        let owner = tourist();
        let id = seeded_booking(&store, &owner, BookingStatus::Pending).await;
        let err = complete(&store, &provider(), id, 30).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn list_for_tourist_only_returns_own_bookings() {
        let store = MemoryStore::new();
        let owner = tourist();
        let other = tourist();
        seeded_booking(&store, &owner, BookingStatus::Pending).await;
        seeded_booking(&store, &other, BookingStatus::Pending).await;

        let bookings = list_for_tourist(&store, &owner).await.unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].tourist, owner.user_id);
    }
}
