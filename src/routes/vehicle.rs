use chrono::Datelike;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{oid::ObjectId, DateTime};

use crate::db::{SharedStore, Store, StoreError};
use crate::guards::AuthGuard;
use crate::models::{RegisterVehicleDto, Role, Vehicle};
use crate::services::catalog::{self, VehicleFilter};
use crate::utils::{validate_phone, ApiError, ApiResponse};

const MIN_VEHICLE_YEAR: i32 = 1990;

#[openapi(tag = "Vehicle")]
#[post("/vehicles/register", data = "<dto>")]
pub async fn register_vehicle(
    store: &State<SharedStore>,
    auth: AuthGuard,
    dto: Json<RegisterVehicleDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let license_plate = dto.license_plate.trim().to_uppercase();
    if license_plate.is_empty() {
        return Err(ApiError::bad_request("License plate is required"));
    }
    if dto.vehicle_model.trim().is_empty() {
        return Err(ApiError::bad_request("Vehicle model is required"));
    }
    let max_year = chrono::Utc::now().year() + 1;
    if dto.vehicle_year < MIN_VEHICLE_YEAR || dto.vehicle_year > max_year {
        return Err(ApiError::bad_request(format!(
            "Vehicle year must be between {} and {}",
            MIN_VEHICLE_YEAR, max_year
        )));
    }
    if dto.capacity < 1 {
        return Err(ApiError::bad_request("Capacity must be at least 1"));
    }
    if dto.hourly_rate < 0.0 || dto.daily_rate < 0.0 {
        return Err(ApiError::bad_request("Rates cannot be negative"));
    }
    if dto.driver_name.trim().is_empty() {
        return Err(ApiError::bad_request("Driver name is required"));
    }
    if !validate_phone(dto.driver_phone.trim()) {
        return Err(ApiError::bad_request("Invalid driver phone number"));
    }

    if store.find_vehicle_by_plate(&license_plate).await?.is_some() {
        return Err(ApiError::bad_request(
            "Vehicle with this license plate already registered",
        ));
    }
    // One service profile per user, across both profile kinds.
    if store
        .find_vehicle_by_user(auth.identity.user_id)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request("You already have a vehicle profile"));
    }
    if store
        .find_guide_by_user(auth.identity.user_id)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request("You already have a guide profile"));
    }

    let vehicle = Vehicle {
        id: None,
        user: auth.identity.user_id,
        vehicle_type: dto.vehicle_type,
        vehicle_model: dto.vehicle_model.trim().to_string(),
        vehicle_year: dto.vehicle_year,
        license_plate,
        capacity: dto.capacity,
        amenities: dto.amenities.clone().unwrap_or_default(),
        hourly_rate: dto.hourly_rate,
        daily_rate: dto.daily_rate,
        driver_name: dto.driver_name.trim().to_string(),
        driver_phone: dto.driver_phone.trim().to_string(),
        locations: dto.locations.clone().unwrap_or_default(),
        is_verified: false,
        is_available: true,
        rating: 0.0,
        total_reviews: 0,
        created_at: DateTime::now(),
    };
    let vehicle_id = match store.insert_vehicle(&vehicle).await {
        Ok(id) => id,
        Err(StoreError::Duplicate(_)) => {
            return Err(ApiError::bad_request(
                "Vehicle with this license plate already registered",
            ));
        }
        Err(e) => return Err(e.into()),
    };

    store
        .set_user_role(auth.identity.user_id, Role::VehicleOwner)
        .await?;

    Ok(Json(ApiResponse::success_with_message(
        "Vehicle registered successfully".to_string(),
        serde_json::json!({
            "vehicle_id": vehicle_id.to_hex()
        }),
    )))
}

#[openapi(tag = "Vehicle")]
#[get("/vehicles?<filter..>")]
pub async fn get_vehicles(
    store: &State<SharedStore>,
    filter: VehicleFilter,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let listed = store.list_available_vehicles().await?;
    let facets = catalog::vehicle_facets(&listed);
    let vehicles = catalog::filter_vehicles(listed, &filter);

    Ok(Json(ApiResponse::success(serde_json::json!({
        "count": vehicles.len(),
        "vehicles": vehicles,
        "facets": facets,
    }))))
}

#[openapi(tag = "Vehicle")]
#[get("/vehicles/me")]
pub async fn get_my_vehicle_profile(
    store: &State<SharedStore>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let vehicle = store
        .find_vehicle_by_user(auth.identity.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No vehicle profile found"))?;

    Ok(Json(ApiResponse::success(serde_json::json!(vehicle))))
}

#[openapi(tag = "Vehicle")]
#[get("/vehicles/<vehicle_id>")]
pub async fn get_vehicle(
    store: &State<SharedStore>,
    vehicle_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let object_id = ObjectId::parse_str(&vehicle_id)
        .map_err(|_| ApiError::bad_request("Invalid vehicle ID"))?;
    let vehicle = store
        .find_vehicle(object_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Vehicle not found"))?;

    Ok(Json(ApiResponse::success(serde_json::json!(vehicle))))
}
