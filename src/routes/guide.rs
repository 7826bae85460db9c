use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{oid::ObjectId, DateTime};

use crate::db::{SharedStore, Store, StoreError};
use crate::guards::AuthGuard;
use crate::models::{Guide, RegisterGuideDto, Role};
use crate::services::catalog::{self, GuideFilter};
use crate::utils::{ApiError, ApiResponse};

#[openapi(tag = "Guide")]
#[post("/guides/register", data = "<dto>")]
pub async fn register_guide(
    store: &State<SharedStore>,
    auth: AuthGuard,
    dto: Json<RegisterGuideDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let registration = dto.guide_id.trim().to_string();
    if registration.is_empty() {
        return Err(ApiError::bad_request("Guide ID is required"));
    }
    if dto.experience < 0 {
        return Err(ApiError::bad_request("Experience cannot be negative"));
    }
    if dto.languages.is_empty() {
        return Err(ApiError::bad_request("At least one language is required"));
    }
    if dto.hourly_rate < 0.0 || dto.daily_rate < 0.0 {
        return Err(ApiError::bad_request("Rates cannot be negative"));
    }
    if let Some(ref bio) = dto.bio {
        if bio.len() > 500 {
            return Err(ApiError::bad_request("Bio cannot exceed 500 characters"));
        }
    }

    if store
        .find_guide_by_registration(&registration)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request("Guide ID already registered"));
    }
    // One service profile per user, across both profile kinds.
    if store
        .find_guide_by_user(auth.identity.user_id)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request("You already have a guide profile"));
    }
    if store
        .find_vehicle_by_user(auth.identity.user_id)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request("You already have a vehicle profile"));
    }

    let guide = Guide {
        id: None,
        user: auth.identity.user_id,
        guide_id: registration,
        experience: dto.experience,
        languages: dto.languages.clone(),
        specialties: dto.specialties.clone().unwrap_or_default(),
        bio: dto.bio.clone(),
        hourly_rate: dto.hourly_rate,
        daily_rate: dto.daily_rate,
        locations: dto.locations.clone().unwrap_or_default(),
        is_verified: false,
        is_available: true,
        rating: 0.0,
        total_reviews: 0,
        created_at: DateTime::now(),
    };
    let guide_id = match store.insert_guide(&guide).await {
        Ok(id) => id,
        Err(StoreError::Duplicate(_)) => {
            return Err(ApiError::bad_request("Guide ID already registered"));
        }
        Err(e) => return Err(e.into()),
    };

    store
        .set_user_role(auth.identity.user_id, Role::Guide)
        .await?;

    Ok(Json(ApiResponse::success_with_message(
        "Guide profile created successfully".to_string(),
        serde_json::json!({
            "guide_id": guide_id.to_hex()
        }),
    )))
}

#[openapi(tag = "Guide")]
#[get("/guides?<filter..>")]
pub async fn get_guides(
    store: &State<SharedStore>,
    filter: GuideFilter,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let listed = store.list_available_guides().await?;
    let facets = catalog::guide_facets(&listed);
    let guides = catalog::filter_guides(listed, &filter);

    Ok(Json(ApiResponse::success(serde_json::json!({
        "count": guides.len(),
        "guides": guides,
        "facets": facets,
    }))))
}

#[openapi(tag = "Guide")]
#[get("/guides/me")]
pub async fn get_my_guide_profile(
    store: &State<SharedStore>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let guide = store
        .find_guide_by_user(auth.identity.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No guide profile found"))?;

    Ok(Json(ApiResponse::success(serde_json::json!(guide))))
}

#[openapi(tag = "Guide")]
#[get("/guides/<guide_id>")]
pub async fn get_guide(
    store: &State<SharedStore>,
    guide_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let object_id = ObjectId::parse_str(&guide_id)
        .map_err(|_| ApiError::bad_request("Invalid guide ID"))?;
    let guide = store
        .find_guide(object_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Guide not found"))?;

    Ok(Json(ApiResponse::success(serde_json::json!(guide))))
}
