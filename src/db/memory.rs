use std::collections::HashMap;
use std::sync::Mutex;

use mongodb::bson::{oid::ObjectId, DateTime};

use crate::db::store::{Store, StoreError, StoreResult};
use crate::models::{
    Booking, BookingStatus, Guide, Review, ReviewEligibility, Role, ServiceRef, User, Vehicle,
};

/// In-memory store backing the service tests. Mirrors the unique-index
/// behavior of `MongoStore`.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<ObjectId, User>,
    guides: HashMap<ObjectId, Guide>,
    vehicles: HashMap<ObjectId, Vehicle>,
    bookings: HashMap<ObjectId, Booking>,
    reviews: HashMap<ObjectId, Review>,
    eligibilities: HashMap<ObjectId, ReviewEligibility>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T, F: Fn(&T) -> DateTime>(mut items: Vec<T>, created_at: F) -> Vec<T> {
    items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    items
}

#[rocket::async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: &User) -> StoreResult<ObjectId> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("users.email"));
        }
        let id = ObjectId::new();
        let mut user = user.clone();
        user.id = Some(id);
        inner.users.insert(id, user);
        Ok(id)
    }

    async fn find_user(&self, id: ObjectId) -> StoreResult<Option<User>> {
        Ok(self.inner.lock().unwrap().users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn set_user_role(&self, id: ObjectId, role: Role) -> StoreResult<()> {
        if let Some(user) = self.inner.lock().unwrap().users.get_mut(&id) {
            user.role = role;
            user.updated_at = DateTime::now();
        }
        Ok(())
    }

    async fn insert_guide(&self, guide: &Guide) -> StoreResult<ObjectId> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .guides
            .values()
            .any(|g| g.guide_id == guide.guide_id || g.user == guide.user)
        {
            return Err(StoreError::Duplicate("guides"));
        }
        let id = ObjectId::new();
        let mut guide = guide.clone();
        guide.id = Some(id);
        inner.guides.insert(id, guide);
        Ok(id)
    }

    async fn find_guide(&self, id: ObjectId) -> StoreResult<Option<Guide>> {
        Ok(self.inner.lock().unwrap().guides.get(&id).cloned())
    }

    async fn find_guide_by_user(&self, user_id: ObjectId) -> StoreResult<Option<Guide>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .guides
            .values()
            .find(|g| g.user == user_id)
            .cloned())
    }

    async fn find_guide_by_registration(&self, guide_id: &str) -> StoreResult<Option<Guide>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .guides
            .values()
            .find(|g| g.guide_id == guide_id)
            .cloned())
    }

    async fn list_available_guides(&self) -> StoreResult<Vec<Guide>> {
        let guides: Vec<Guide> = self
            .inner
            .lock()
            .unwrap()
            .guides
            .values()
            .filter(|g| g.is_available)
            .cloned()
            .collect();
        Ok(newest_first(guides, |g| g.created_at))
    }

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> StoreResult<ObjectId> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .vehicles
            .values()
            .any(|v| v.license_plate == vehicle.license_plate || v.user == vehicle.user)
        {
            return Err(StoreError::Duplicate("vehicles"));
        }
        let id = ObjectId::new();
        let mut vehicle = vehicle.clone();
        vehicle.id = Some(id);
        inner.vehicles.insert(id, vehicle);
        Ok(id)
    }

    async fn find_vehicle(&self, id: ObjectId) -> StoreResult<Option<Vehicle>> {
        Ok(self.inner.lock().unwrap().vehicles.get(&id).cloned())
    }

    async fn find_vehicle_by_user(&self, user_id: ObjectId) -> StoreResult<Option<Vehicle>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .vehicles
            .values()
            .find(|v| v.user == user_id)
            .cloned())
    }

    async fn find_vehicle_by_plate(&self, plate: &str) -> StoreResult<Option<Vehicle>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .vehicles
            .values()
            .find(|v| v.license_plate == plate)
            .cloned())
    }

    async fn list_available_vehicles(&self) -> StoreResult<Vec<Vehicle>> {
        let vehicles: Vec<Vehicle> = self
            .inner
            .lock()
            .unwrap()
            .vehicles
            .values()
            .filter(|v| v.is_available)
            .cloned()
            .collect();
        Ok(newest_first(vehicles, |v| v.created_at))
    }

    async fn set_target_rating(
        &self,
        target: &ServiceRef,
        rating: f64,
        total_reviews: i32,
    ) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        match target.service_type {
            crate::models::TargetType::Guide => {
                if let Some(guide) = inner.guides.get_mut(&target.service_id) {
                    guide.rating = rating;
                    guide.total_reviews = total_reviews;
                }
            }
            crate::models::TargetType::Vehicle => {
                if let Some(vehicle) = inner.vehicles.get_mut(&target.service_id) {
                    vehicle.rating = rating;
                    vehicle.total_reviews = total_reviews;
                }
            }
        }
        Ok(())
    }

    async fn insert_booking(&self, booking: &Booking) -> StoreResult<ObjectId> {
        let mut inner = self.inner.lock().unwrap();
        let id = ObjectId::new();
        let mut booking = booking.clone();
        booking.id = Some(id);
        inner.bookings.insert(id, booking);
        Ok(id)
    }

    async fn find_booking(&self, id: ObjectId) -> StoreResult<Option<Booking>> {
        Ok(self.inner.lock().unwrap().bookings.get(&id).cloned())
    }

    async fn update_booking_status(
        &self,
        id: ObjectId,
        status: BookingStatus,
        completed_at: Option<DateTime>,
    ) -> StoreResult<()> {
        if let Some(booking) = self.inner.lock().unwrap().bookings.get_mut(&id) {
            booking.status = status;
            booking.completed_at = completed_at;
            booking.updated_at = DateTime::now();
        }
        Ok(())
    }

    async fn set_booking_reviewed(&self, id: ObjectId, reviewed: bool) -> StoreResult<()> {
        if let Some(booking) = self.inner.lock().unwrap().bookings.get_mut(&id) {
            booking.reviewed = reviewed;
            booking.updated_at = DateTime::now();
        }
        Ok(())
    }

    async fn bookings_for_tourist(&self, tourist: ObjectId) -> StoreResult<Vec<Booking>> {
        let bookings: Vec<Booking> = self
            .inner
            .lock()
            .unwrap()
            .bookings
            .values()
            .filter(|b| b.tourist == tourist)
            .cloned()
            .collect();
        Ok(newest_first(bookings, |b| b.created_at))
    }

    async fn insert_review(&self, review: &Review) -> StoreResult<ObjectId> {
        let mut inner = self.inner.lock().unwrap();
        if inner.reviews.values().any(|r| r.booking == review.booking) {
            return Err(StoreError::Duplicate("reviews.booking"));
        }
        let id = ObjectId::new();
        let mut review = review.clone();
        review.id = Some(id);
        inner.reviews.insert(id, review);
        Ok(id)
    }

    async fn find_review(&self, id: ObjectId) -> StoreResult<Option<Review>> {
        Ok(self.inner.lock().unwrap().reviews.get(&id).cloned())
    }

    async fn find_review_by_booking(&self, booking: ObjectId) -> StoreResult<Option<Review>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .reviews
            .values()
            .find(|r| r.booking == booking)
            .cloned())
    }

    async fn save_review(&self, review: &Review) -> StoreResult<()> {
        if let Some(id) = review.id {
            self.inner.lock().unwrap().reviews.insert(id, review.clone());
        }
        Ok(())
    }

    async fn delete_review(&self, id: ObjectId) -> StoreResult<()> {
        self.inner.lock().unwrap().reviews.remove(&id);
        Ok(())
    }

    async fn reviews_for_target(
        &self,
        target: &ServiceRef,
        public_only: bool,
    ) -> StoreResult<Vec<Review>> {
        let reviews: Vec<Review> = self
            .inner
            .lock()
            .unwrap()
            .reviews
            .values()
            .filter(|r| {
                r.target_type == target.service_type
                    && r.target_id == target.service_id
                    && (!public_only || r.is_public)
            })
            .cloned()
            .collect();
        Ok(newest_first(reviews, |r| r.created_at))
    }

    async fn reviews_page_for_target(
        &self,
        target: &ServiceRef,
        skip: u64,
        limit: i64,
    ) -> StoreResult<Vec<Review>> {
        let all = self.reviews_for_target(target, true).await?;
        Ok(all
            .into_iter()
            .skip(skip as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn reviews_for_author(&self, author: ObjectId) -> StoreResult<Vec<Review>> {
        let reviews: Vec<Review> = self
            .inner
            .lock()
            .unwrap()
            .reviews
            .values()
            .filter(|r| r.author == author)
            .cloned()
            .collect();
        Ok(newest_first(reviews, |r| r.created_at))
    }

    async fn insert_eligibility(&self, grant: &ReviewEligibility) -> StoreResult<ObjectId> {
        let mut inner = self.inner.lock().unwrap();
        let id = ObjectId::new();
        let mut grant = grant.clone();
        grant.id = Some(id);
        inner.eligibilities.insert(id, grant);
        Ok(id)
    }

    async fn find_eligibility_by_booking(
        &self,
        booking: ObjectId,
    ) -> StoreResult<Option<ReviewEligibility>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .eligibilities
            .values()
            .find(|e| e.booking == booking)
            .cloned())
    }

    async fn set_eligibility_submitted(
        &self,
        booking: ObjectId,
        submitted: bool,
    ) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(grant) = inner.eligibilities.values_mut().find(|e| e.booking == booking) {
            grant.review_submitted = submitted;
            grant.updated_at = DateTime::now();
        }
        Ok(())
    }
}
