use log::error;
use mongodb::bson::{oid::ObjectId, DateTime};
use serde::Serialize;
use rocket_okapi::okapi::schemars::JsonSchema;

use crate::db::{Store, StoreError};
use crate::models::{
    Booking, Identity, Review, Role, ServiceRef, TargetType, GUIDE_STRENGTHS, VEHICLE_STRENGTHS,
};
use crate::services::eligibility::{self, EligibilityStatus};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::rating::{RatingService, ReviewStatistics};

pub const MIN_COMMENT_LEN: usize = 10;
pub const MAX_COMMENT_LEN: usize = 500;

/// Validated input for a new review, resolved from the wire DTO.
pub struct NewReview {
    pub booking_id: ObjectId,
    pub target: ServiceRef,
    pub rating: i32,
    pub title: Option<String>,
    pub comment: String,
    pub would_recommend: bool,
    pub strengths: Vec<String>,
}

/// Partial update. Content fields belong to the review author; the reply
/// field belongs to the owner of the reviewed service.
#[derive(Default)]
pub struct ReviewPatch {
    pub rating: Option<i32>,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub would_recommend: Option<bool>,
    pub is_public: Option<bool>,
    pub owner_reply: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

pub struct ReviewListing {
    pub reviews: Vec<Review>,
    pub pagination: Pagination,
    pub statistics: ReviewStatistics,
}

pub async fn create(
    store: &dyn Store,
    ratings: &RatingService,
    identity: &Identity,
    new: NewReview,
) -> ServiceResult<Review> {
    validate_rating(new.rating)?;
    let comment = validate_comment(&new.comment)?;
    validate_strengths(new.target.service_type, &new.strengths)?;

    // Authoritative eligibility check, re-run here rather than trusted from
    // an earlier call.
    let (booking, status) = eligibility::check(store, new.booking_id, identity.user_id).await?;
    match status {
        EligibilityStatus::Eligible => {}
        EligibilityStatus::NotCompleted => {
            return Err(ServiceError::Validation(
                "Can only review completed bookings".to_string(),
            ));
        }
        EligibilityStatus::AlreadyReviewed => {
            return Err(ServiceError::DuplicateReview(
                "You have already reviewed this booking".to_string(),
            ));
        }
    }

    ensure_target_matches(store, &booking, &new.target).await?;

    let now = DateTime::now();
    let mut review = Review {
        id: None,
        booking: new.booking_id,
        author: identity.user_id,
        target_type: new.target.service_type,
        target_id: new.target.service_id,
        rating: new.rating,
        title: new
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("Review for {}", new.target.service_type)),
        comment,
        would_recommend: new.would_recommend,
        strengths: new.strengths,
        is_public: true,
        owner_reply: None,
        service_date: booking.start_date,
        created_at: now,
        updated_at: now,
    };
    let id = match store.insert_review(&review).await {
        Ok(id) => id,
        // The unique index closes the race between the eligibility check
        // and the insert.
        Err(StoreError::Duplicate(_)) => {
            return Err(ServiceError::DuplicateReview(
                "You have already reviewed this booking".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };
    review.id = Some(id);

    // A failed recompute undoes the insert so the mutation never
    // half-applies.
    if let Err(e) = ratings.recompute(store, new.target).await {
        if let Err(cleanup) = store.delete_review(id).await {
            error!(
                "failed to remove review {} after aggregate recompute failure: {}",
                id, cleanup
            );
        }
        return Err(e);
    }

    store.set_booking_reviewed(new.booking_id, true).await?;
    store.set_eligibility_submitted(new.booking_id, true).await?;
    Ok(review)
}

pub async fn update(
    store: &dyn Store,
    ratings: &RatingService,
    identity: &Identity,
    review_id: ObjectId,
    patch: ReviewPatch,
) -> ServiceResult<Review> {
    let mut review = store
        .find_review(review_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Review not found".to_string()))?;

    let edits_content = patch.rating.is_some()
        || patch.title.is_some()
        || patch.comment.is_some()
        || patch.would_recommend.is_some()
        || patch.is_public.is_some();
    let edits_reply = patch.owner_reply.is_some();
    if !edits_content && !edits_reply {
        return Err(ServiceError::Validation("Nothing to update".to_string()));
    }

    if edits_content && review.author != identity.user_id {
        return Err(ServiceError::Authorization(
            "Not authorized to update this review".to_string(),
        ));
    }
    if edits_reply {
        let owns_target = target_owner(store, &review)
            .await?
            .is_some_and(|owner| owner == identity.user_id);
        if !owns_target {
            return Err(ServiceError::Authorization(
                "Only the service owner can reply to a review".to_string(),
            ));
        }
    }

    let aggregate_changed = patch.rating.is_some() || patch.is_public.is_some();

    if let Some(rating) = patch.rating {
        validate_rating(rating)?;
        review.rating = rating;
    }
    if let Some(title) = patch.title {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(ServiceError::Validation("Title cannot be empty".to_string()));
        }
        review.title = title;
    }
    if let Some(ref comment) = patch.comment {
        review.comment = validate_comment(comment)?;
    }
    if let Some(would_recommend) = patch.would_recommend {
        review.would_recommend = would_recommend;
    }
    if let Some(is_public) = patch.is_public {
        review.is_public = is_public;
    }
    if let Some(reply) = patch.owner_reply {
        let reply = reply.trim().to_string();
        if reply.is_empty() || reply.len() > MAX_COMMENT_LEN {
            return Err(ServiceError::Validation(format!(
                "Reply must be between 1 and {} characters",
                MAX_COMMENT_LEN
            )));
        }
        review.owner_reply = Some(reply);
    }
    review.updated_at = DateTime::now();
    store.save_review(&review).await?;

    if aggregate_changed {
        ratings.recompute(store, review.target_ref()).await?;
    }
    Ok(review)
}

pub async fn delete(
    store: &dyn Store,
    ratings: &RatingService,
    identity: &Identity,
    review_id: ObjectId,
) -> ServiceResult<()> {
    let review = store
        .find_review(review_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Review not found".to_string()))?;

    if review.author != identity.user_id && identity.role != Role::Admin {
        return Err(ServiceError::Authorization(
            "Not authorized to delete this review".to_string(),
        ));
    }

    let target = review.target_ref();
    store.delete_review(review_id).await?;
    store.set_booking_reviewed(review.booking, false).await?;
    store.set_eligibility_submitted(review.booking, false).await?;
    ratings.recompute(store, target).await?;
    Ok(())
}

/// Public reviews for a guide or vehicle, one page at a time, plus the
/// statistics computed over the full public set so paginated views never
/// see a stale aggregate.
pub async fn list_for_target(
    store: &dyn Store,
    target: ServiceRef,
    page: i64,
    limit: i64,
) -> ServiceResult<ReviewListing> {
    let page = page.max(1);
    let limit = limit.clamp(1, 100);
    let skip = ((page - 1) * limit) as u64;

    let reviews = store.reviews_page_for_target(&target, skip, limit).await?;
    let all = store.reviews_for_target(&target, true).await?;
    let total = all.len() as i64;
    let statistics = RatingService::statistics(&all);

    Ok(ReviewListing {
        reviews,
        pagination: Pagination {
            page,
            limit,
            total,
            pages: (total + limit - 1) / limit,
        },
        statistics,
    })
}

pub async fn list_for_author(store: &dyn Store, identity: &Identity) -> ServiceResult<Vec<Review>> {
    Ok(store.reviews_for_author(identity.user_id).await?)
}

/// Reviews received by the caller's own guide or vehicle profile, private
/// ones included. Callers with no service profile get an empty list.
pub async fn list_for_service_owner(
    store: &dyn Store,
    identity: &Identity,
) -> ServiceResult<Vec<Review>> {
    if let Some(guide) = store.find_guide_by_user(identity.user_id).await? {
        if let Some(id) = guide.id {
            let target = ServiceRef {
                service_type: TargetType::Guide,
                service_id: id,
            };
            return Ok(store.reviews_for_target(&target, false).await?);
        }
    }
    if let Some(vehicle) = store.find_vehicle_by_user(identity.user_id).await? {
        if let Some(id) = vehicle.id {
            let target = ServiceRef {
                service_type: TargetType::Vehicle,
                service_id: id,
            };
            return Ok(store.reviews_for_target(&target, false).await?);
        }
    }
    Ok(Vec::new())
}

fn validate_rating(rating: i32) -> ServiceResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(ServiceError::Validation(
            "Rating must be between 1 and 5".to_string(),
        ));
    }
    Ok(())
}

fn validate_comment(comment: &str) -> ServiceResult<String> {
    let comment = comment.trim();
    if comment.len() < MIN_COMMENT_LEN {
        return Err(ServiceError::Validation(format!(
            "Review comment must be at least {} characters",
            MIN_COMMENT_LEN
        )));
    }
    if comment.len() > MAX_COMMENT_LEN {
        return Err(ServiceError::Validation(format!(
            "Review comment cannot exceed {} characters",
            MAX_COMMENT_LEN
        )));
    }
    Ok(comment.to_string())
}

fn validate_strengths(target_type: TargetType, strengths: &[String]) -> ServiceResult<()> {
    let allowed = match target_type {
        TargetType::Guide => GUIDE_STRENGTHS,
        TargetType::Vehicle => VEHICLE_STRENGTHS,
    };
    for strength in strengths {
        if !allowed.contains(&strength.as_str()) {
            return Err(ServiceError::Validation(format!(
                "Unknown strength tag: {}",
                strength
            )));
        }
    }
    Ok(())
}

async fn ensure_target_matches(
    store: &dyn Store,
    booking: &Booking,
    target: &ServiceRef,
) -> ServiceResult<()> {
    let label = match target.service_type {
        TargetType::Guide => "Guide",
        TargetType::Vehicle => "Vehicle",
    };
    let exists = match target.service_type {
        TargetType::Guide => store.find_guide(target.service_id).await?.is_some(),
        TargetType::Vehicle => store.find_vehicle(target.service_id).await?.is_some(),
    };
    if !exists
        || booking.service_type != target.service_type
        || booking.service_id != target.service_id
    {
        return Err(ServiceError::Mismatch(format!(
            "{} not part of this booking",
            label
        )));
    }
    Ok(())
}

async fn target_owner(store: &dyn Store, review: &Review) -> ServiceResult<Option<ObjectId>> {
    Ok(match review.target_type {
        TargetType::Guide => store.find_guide(review.target_id).await?.map(|g| g.user),
        TargetType::Vehicle => store.find_vehicle(review.target_id).await?.map(|v| v.user),
    })
}
