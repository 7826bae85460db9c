use mongodb::bson::{oid::ObjectId, DateTime};
use thiserror::Error;

use crate::models::{
    Booking, BookingStatus, Guide, Review, ReviewEligibility, Role, ServiceRef, User, Vehicle,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("duplicate value for unique field: {0}")]
    Duplicate(&'static str),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract the services depend on. Implemented by `MongoStore`
/// for the real database and by an in-memory store for tests.
#[rocket::async_trait]
pub trait Store: Send + Sync {
    // Users
    async fn insert_user(&self, user: &User) -> StoreResult<ObjectId>;
    async fn find_user(&self, id: ObjectId) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn set_user_role(&self, id: ObjectId, role: Role) -> StoreResult<()>;

    // Guides
    async fn insert_guide(&self, guide: &Guide) -> StoreResult<ObjectId>;
    async fn find_guide(&self, id: ObjectId) -> StoreResult<Option<Guide>>;
    async fn find_guide_by_user(&self, user_id: ObjectId) -> StoreResult<Option<Guide>>;
    async fn find_guide_by_registration(&self, guide_id: &str) -> StoreResult<Option<Guide>>;
    async fn list_available_guides(&self) -> StoreResult<Vec<Guide>>;

    // Vehicles
    async fn insert_vehicle(&self, vehicle: &Vehicle) -> StoreResult<ObjectId>;
    async fn find_vehicle(&self, id: ObjectId) -> StoreResult<Option<Vehicle>>;
    async fn find_vehicle_by_user(&self, user_id: ObjectId) -> StoreResult<Option<Vehicle>>;
    async fn find_vehicle_by_plate(&self, plate: &str) -> StoreResult<Option<Vehicle>>;
    async fn list_available_vehicles(&self) -> StoreResult<Vec<Vehicle>>;

    /// Writes the derived rating fields on a guide or vehicle. The rating
    /// aggregator is the only caller.
    async fn set_target_rating(
        &self,
        target: &ServiceRef,
        rating: f64,
        total_reviews: i32,
    ) -> StoreResult<()>;

    // Bookings
    async fn insert_booking(&self, booking: &Booking) -> StoreResult<ObjectId>;
    async fn find_booking(&self, id: ObjectId) -> StoreResult<Option<Booking>>;
    async fn update_booking_status(
        &self,
        id: ObjectId,
        status: BookingStatus,
        completed_at: Option<DateTime>,
    ) -> StoreResult<()>;
    async fn set_booking_reviewed(&self, id: ObjectId, reviewed: bool) -> StoreResult<()>;
    async fn bookings_for_tourist(&self, tourist: ObjectId) -> StoreResult<Vec<Booking>>;

    // Reviews
    async fn insert_review(&self, review: &Review) -> StoreResult<ObjectId>;
    async fn find_review(&self, id: ObjectId) -> StoreResult<Option<Review>>;
    async fn find_review_by_booking(&self, booking: ObjectId) -> StoreResult<Option<Review>>;
    async fn save_review(&self, review: &Review) -> StoreResult<()>;
    async fn delete_review(&self, id: ObjectId) -> StoreResult<()>;
    /// All reviews for a target, newest first.
    async fn reviews_for_target(
        &self,
        target: &ServiceRef,
        public_only: bool,
    ) -> StoreResult<Vec<Review>>;
    /// One page of public reviews for a target, newest first.
    async fn reviews_page_for_target(
        &self,
        target: &ServiceRef,
        skip: u64,
        limit: i64,
    ) -> StoreResult<Vec<Review>>;
    async fn reviews_for_author(&self, author: ObjectId) -> StoreResult<Vec<Review>>;

    // Review eligibility grants
    async fn insert_eligibility(&self, grant: &ReviewEligibility) -> StoreResult<ObjectId>;
    async fn find_eligibility_by_booking(
        &self,
        booking: ObjectId,
    ) -> StoreResult<Option<ReviewEligibility>>;
    async fn set_eligibility_submitted(
        &self,
        booking: ObjectId,
        submitted: bool,
    ) -> StoreResult<()>;
}
