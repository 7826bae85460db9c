use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::{oid::ObjectId, DateTime};

use crate::db::{SharedStore, Store, StoreError};
use crate::guards::AuthGuard;
use crate::models::{LoginDto, RefreshTokenDto, RegisterDto, Role, User, UserResponse};
use crate::services::JwtService;
use crate::utils::{validate_email, validate_phone, ApiError, ApiResponse};

const MIN_PASSWORD_LEN: usize = 8;

#[openapi(tag = "Auth")]
#[post("/auth/register", data = "<dto>")]
pub async fn register(
    store: &State<SharedStore>,
    dto: Json<RegisterDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let name = dto.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    let email = dto.email.trim().to_lowercase();
    if !validate_email(&email) {
        return Err(ApiError::bad_request("Invalid email address"));
    }
    if dto.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if let Some(ref phone) = dto.phone {
        if !validate_phone(phone.trim()) {
            return Err(ApiError::bad_request("Invalid phone number"));
        }
    }

    if store.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::bad_request("Email already registered"));
    }

    let password_hash = bcrypt::hash(&dto.password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::internal_error(format!("Failed to hash password: {}", e)))?;

    let now = DateTime::now();
    let user = User {
        id: None,
        name: name.to_string(),
        email: email.clone(),
        password_hash,
        phone: dto.phone.as_deref().map(|p| p.trim().to_string()),
        role: Role::Tourist,
        created_at: now,
        updated_at: now,
    };
    let user_id = match store.insert_user(&user).await {
        Ok(id) => id,
        Err(StoreError::Duplicate(_)) => {
            return Err(ApiError::bad_request("Email already registered"));
        }
        Err(e) => return Err(e.into()),
    };

    let access_token = JwtService::generate_access_token(&user_id, &email)
        .map_err(|e| ApiError::internal_error(format!("Failed to issue token: {}", e)))?;
    let refresh_token = JwtService::generate_refresh_token(&user_id, &email)
        .map_err(|e| ApiError::internal_error(format!("Failed to issue token: {}", e)))?;

    Ok(Json(ApiResponse::success_with_message(
        "Account created successfully".to_string(),
        serde_json::json!({
            "user": {
                "id": user_id.to_hex(),
                "name": name,
                "email": email,
                "role": Role::Tourist.as_str(),
            },
            "access_token": access_token,
            "refresh_token": refresh_token,
        }),
    )))
}

#[openapi(tag = "Auth")]
#[post("/auth/login", data = "<dto>")]
pub async fn login(
    store: &State<SharedStore>,
    dto: Json<LoginDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let email = dto.email.trim().to_lowercase();
    let user = store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    let verified = bcrypt::verify(&dto.password, &user.password_hash)
        .map_err(|e| ApiError::internal_error(format!("Failed to verify password: {}", e)))?;
    if !verified {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let user_id = user
        .id
        .ok_or_else(|| ApiError::internal_error("User record has no id"))?;
    let access_token = JwtService::generate_access_token(&user_id, &user.email)
        .map_err(|e| ApiError::internal_error(format!("Failed to issue token: {}", e)))?;
    let refresh_token = JwtService::generate_refresh_token(&user_id, &user.email)
        .map_err(|e| ApiError::internal_error(format!("Failed to issue token: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "user": UserResponse::from(user),
        "access_token": access_token,
        "refresh_token": refresh_token,
    }))))
}

#[openapi(tag = "Auth")]
#[post("/auth/refresh", data = "<dto>")]
pub async fn refresh_token(
    store: &State<SharedStore>,
    dto: Json<RefreshTokenDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let claims = JwtService::verify_token(&dto.refresh_token, true)
        .map_err(|_| ApiError::unauthorized("Invalid refresh token"))?;
    let user_id = ObjectId::parse_str(&claims.sub)
        .map_err(|_| ApiError::unauthorized("Invalid refresh token"))?;

    let user = store
        .find_user(user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid refresh token"))?;

    let access_token = JwtService::generate_access_token(&user_id, &user.email)
        .map_err(|e| ApiError::internal_error(format!("Failed to issue token: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "access_token": access_token,
    }))))
}

#[openapi(tag = "Auth")]
#[get("/auth/me")]
pub async fn get_me(
    store: &State<SharedStore>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let store = store.inner().as_ref();

    let user = store
        .find_user(auth.identity.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(ApiResponse::success(serde_json::json!(
        UserResponse::from(user)
    ))))
}
