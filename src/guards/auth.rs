use rocket::request::{self, FromRequest, Request, Outcome};
use rocket::http::Status;
use rocket::State;
use mongodb::bson::oid::ObjectId;

// === OpenAPI (compatible with rocket_okapi 0.8.0 / 0.8.1) ===
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use rocket_okapi::r#gen::OpenApiGenerator;

use crate::db::{SharedStore, Store};
use crate::models::Identity;

/// JWT-based authentication guard. The role is read from the user record
/// rather than the token so a registration that flips tourist -> provider
/// takes effect immediately.
pub struct AuthGuard {
    pub identity: Identity,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthGuard {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let token = match req.headers().get_one("Authorization") {
            Some(token) => token.trim_start_matches("Bearer "),
            None => return Outcome::Error((Status::Unauthorized, ())),
        };

        let claims = match crate::services::JwtService::verify_token(token, false) {
            Ok(claims) => claims,
            Err(_) => return Outcome::Error((Status::Unauthorized, ())),
        };
        let user_id = match ObjectId::parse_str(&claims.sub) {
            Ok(user_id) => user_id,
            Err(_) => return Outcome::Error((Status::Unauthorized, ())),
        };

        let store = match req.guard::<&State<SharedStore>>().await {
            Outcome::Success(store) => store,
            _ => return Outcome::Error((Status::InternalServerError, ())),
        };

        match store.find_user(user_id).await {
            Ok(Some(user)) => Outcome::Success(AuthGuard {
                identity: Identity {
                    user_id,
                    role: user.role,
                },
            }),
            _ => Outcome::Error((Status::Unauthorized, ())),
        }
    }
}

/// === OpenAPI Integration ===
/// The guard doesn't contribute any special header/parameter for docs.
impl<'a> OpenApiFromRequest<'a> for AuthGuard {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(RequestHeaderInput::None)
    }
}
