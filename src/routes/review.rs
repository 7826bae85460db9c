use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::oid::ObjectId;

use crate::db::SharedStore;
use crate::guards::AuthGuard;
use crate::models::{CreateReviewDto, ServiceRef, TargetType, UpdateReviewDto};
use crate::services::eligibility;
use crate::services::review::{self, NewReview, ReviewPatch};
use crate::services::RatingService;
use crate::utils::{ApiError, ApiResponse};

#[openapi(tag = "Review")]
#[get("/reviews/eligibility/<booking_id>")]
pub async fn check_eligibility(
    store: &State<SharedStore>,
    auth: AuthGuard,
    booking_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let object_id = ObjectId::parse_str(&booking_id)
        .map_err(|_| ApiError::bad_request("Invalid booking ID"))?;
    let (booking, status) = eligibility::check(store, object_id, auth.identity.user_id).await?;

    let data = match status.reason() {
        None => serde_json::json!({
            "eligible": true,
            "booking": {
                "id": object_id.to_hex(),
                "service_type": booking.service_type,
                "service_id": booking.service_id.to_hex(),
                "start_date": booking.start_date,
            },
        }),
        Some(reason) => serde_json::json!({
            "eligible": false,
            "reason": reason,
        }),
    };
    Ok(Json(ApiResponse::success(data)))
}

#[openapi(tag = "Review")]
#[post("/reviews", data = "<dto>")]
pub async fn create_review(
    store: &State<SharedStore>,
    ratings: &State<RatingService>,
    auth: AuthGuard,
    dto: Json<CreateReviewDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let booking_id = ObjectId::parse_str(&dto.booking_id)
        .map_err(|_| ApiError::bad_request("Invalid booking ID"))?;
    let target_id = ObjectId::parse_str(&dto.target_id)
        .map_err(|_| ApiError::bad_request("Invalid target ID"))?;
    let new = NewReview {
        booking_id,
        target: ServiceRef {
            service_type: dto.target_type,
            service_id: target_id,
        },
        rating: dto.rating,
        title: dto.title.clone(),
        comment: dto.comment.clone(),
        would_recommend: dto.would_recommend.unwrap_or(true),
        strengths: dto.strengths.clone().unwrap_or_default(),
    };

    let review = review::create(store, ratings, &auth.identity, new).await?;

    Ok(Json(ApiResponse::success_with_message(
        "Review submitted successfully".to_string(),
        serde_json::json!(review),
    )))
}

#[openapi(tag = "Review")]
#[put("/reviews/<review_id>", data = "<dto>")]
pub async fn update_review(
    store: &State<SharedStore>,
    ratings: &State<RatingService>,
    auth: AuthGuard,
    review_id: String,
    dto: Json<UpdateReviewDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let object_id = ObjectId::parse_str(&review_id)
        .map_err(|_| ApiError::bad_request("Invalid review ID"))?;
    let patch = ReviewPatch {
        rating: dto.rating,
        title: dto.title.clone(),
        comment: dto.comment.clone(),
        would_recommend: dto.would_recommend,
        is_public: dto.is_public,
        owner_reply: dto.owner_reply.clone(),
    };

    let review = review::update(store, ratings, &auth.identity, object_id, patch).await?;

    Ok(Json(ApiResponse::success_with_message(
        "Review updated successfully".to_string(),
        serde_json::json!(review),
    )))
}

#[openapi(tag = "Review")]
#[delete("/reviews/<review_id>")]
pub async fn delete_review(
    store: &State<SharedStore>,
    ratings: &State<RatingService>,
    auth: AuthGuard,
    review_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let object_id = ObjectId::parse_str(&review_id)
        .map_err(|_| ApiError::bad_request("Invalid review ID"))?;
    review::delete(store, ratings, &auth.identity, object_id).await?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Review deleted successfully"
    }))))
}

#[derive(FromForm, serde::Deserialize, rocket_okapi::okapi::schemars::JsonSchema)]
pub struct ReviewsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[openapi(tag = "Review")]
#[get("/reviews/<target_type>/<target_id>?<query..>")]
pub async fn get_reviews(
    store: &State<SharedStore>,
    target_type: String,
    target_id: String,
    query: ReviewsQuery,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let target_type = TargetType::parse(&target_type)
        .ok_or_else(|| ApiError::bad_request("Invalid target type"))?;
    let target_id = ObjectId::parse_str(&target_id)
        .map_err(|_| ApiError::bad_request("Invalid target ID"))?;
    let target = ServiceRef {
        service_type: target_type,
        service_id: target_id,
    };

    let listing = review::list_for_target(
        store,
        target,
        query.page.unwrap_or(1),
        query.limit.unwrap_or(10),
    )
    .await?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "reviews": listing.reviews,
        "pagination": listing.pagination,
        "statistics": listing.statistics,
    }))))
}

#[openapi(tag = "Review")]
#[get("/reviews/my-reviews")]
pub async fn get_my_reviews(
    store: &State<SharedStore>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let reviews = review::list_for_author(store, &auth.identity).await?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "count": reviews.len(),
        "reviews": reviews,
    }))))
}

#[openapi(tag = "Review")]
#[get("/reviews/my-services")]
pub async fn get_my_service_reviews(
    store: &State<SharedStore>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let reviews = review::list_for_service_owner(store, &auth.identity).await?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "count": reviews.len(),
        "reviews": reviews,
    }))))
}
