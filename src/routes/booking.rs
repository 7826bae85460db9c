use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::oid::ObjectId;

use crate::config::Config;
use crate::db::SharedStore;
use crate::guards::AuthGuard;
use crate::models::{CreateBookingDto, ServiceRef, UpdateBookingStatusDto};
use crate::services::booking::{self, NewBooking};
use crate::utils::{ApiError, ApiResponse};

#[openapi(tag = "Booking")]
#[post("/bookings", data = "<dto>")]
pub async fn create_booking(
    store: &State<SharedStore>,
    auth: AuthGuard,
    dto: Json<CreateBookingDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let service_id = ObjectId::parse_str(&dto.service_id)
        .map_err(|_| ApiError::bad_request("Invalid service ID"))?;
    let new = NewBooking {
        service: ServiceRef {
            service_type: dto.service_type,
            service_id,
        },
        start_date: dto.start_date,
        end_date: dto.end_date,
        party_size: dto.party_size,
        contact_phone: dto.contact_phone.clone(),
        special_requests: dto.special_requests.clone(),
        total_price: dto.total_price,
    };

    let booking = booking::create(store, &auth.identity, new).await?;

    Ok(Json(ApiResponse::success_with_message(
        "Booking created successfully".to_string(),
        serde_json::json!(booking),
    )))
}

#[openapi(tag = "Booking")]
#[get("/bookings/my")]
pub async fn get_my_bookings(
    store: &State<SharedStore>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let bookings = booking::list_for_tourist(store, &auth.identity).await?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "count": bookings.len(),
        "bookings": bookings,
    }))))
}

#[openapi(tag = "Booking")]
#[get("/bookings/<booking_id>")]
pub async fn get_booking(
    store: &State<SharedStore>,
    auth: AuthGuard,
    booking_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let object_id = ObjectId::parse_str(&booking_id)
        .map_err(|_| ApiError::bad_request("Invalid booking ID"))?;
    let booking = booking::get(store, &auth.identity, object_id).await?;

    Ok(Json(ApiResponse::success(serde_json::json!(booking))))
}

#[openapi(tag = "Booking")]
#[put("/bookings/<booking_id>/status", data = "<dto>")]
pub async fn update_booking_status(
    store: &State<SharedStore>,
    auth: AuthGuard,
    booking_id: String,
    dto: Json<UpdateBookingStatusDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let object_id = ObjectId::parse_str(&booking_id)
        .map_err(|_| ApiError::bad_request("Invalid booking ID"))?;
    let booking = booking::transition(store, &auth.identity, object_id, dto.status).await?;

    Ok(Json(ApiResponse::success_with_message(
        "Booking status updated successfully".to_string(),
        serde_json::json!(booking),
    )))
}

#[openapi(tag = "Booking")]
#[put("/bookings/<booking_id>/cancel")]
pub async fn cancel_booking(
    store: &State<SharedStore>,
    auth: AuthGuard,
    booking_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let object_id = ObjectId::parse_str(&booking_id)
        .map_err(|_| ApiError::bad_request("Invalid booking ID"))?;
    let booking = booking::cancel(store, &auth.identity, object_id).await?;

    Ok(Json(ApiResponse::success_with_message(
        "Booking cancelled successfully".to_string(),
        serde_json::json!(booking),
    )))
}

#[openapi(tag = "Booking")]
#[put("/bookings/<booking_id>/complete")]
pub async fn complete_booking(
    store: &State<SharedStore>,
    auth: AuthGuard,
    booking_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let object_id = ObjectId::parse_str(&booking_id)
        .map_err(|_| ApiError::bad_request("Invalid booking ID"))?;
    let (booking, grant) = booking::complete(
        store,
        &auth.identity,
        object_id,
        Config::review_window_days(),
    )
    .await?;

    Ok(Json(ApiResponse::success_with_message(
        "Booking completed successfully".to_string(),
        serde_json::json!({
            "booking": booking,
            "review_eligibility": {
                "booking": grant.booking.to_hex(),
                "eligible": grant.eligible,
                "expires_at": grant.expires_at,
            },
        }),
    )))
}
