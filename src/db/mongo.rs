use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{Collection, Database, IndexModel};
use rocket::futures::TryStreamExt;

use crate::db::store::{Store, StoreError, StoreResult};
use crate::models::{
    Booking, BookingStatus, Guide, Review, ReviewEligibility, Role, ServiceRef, TargetType, User,
    Vehicle,
};

pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        MongoStore { db }
    }

    fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    fn guides(&self) -> Collection<Guide> {
        self.db.collection("guides")
    }

    fn vehicles(&self) -> Collection<Vehicle> {
        self.db.collection("vehicles")
    }

    fn bookings(&self) -> Collection<Booking> {
        self.db.collection("bookings")
    }

    fn reviews(&self) -> Collection<Review> {
        self.db.collection("reviews")
    }

    fn eligibilities(&self) -> Collection<ReviewEligibility> {
        self.db.collection("review_eligibilities")
    }

    /// Unique indexes backing the one-review-per-booking and
    /// one-profile-per-user rules even under concurrent inserts.
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        self.create_unique_index("users", doc! { "email": 1 }).await?;
        self.create_unique_index("guides", doc! { "guide_id": 1 }).await?;
        self.create_unique_index("guides", doc! { "user": 1 }).await?;
        self.create_unique_index("vehicles", doc! { "license_plate": 1 }).await?;
        self.create_unique_index("vehicles", doc! { "user": 1 }).await?;
        self.create_unique_index("reviews", doc! { "booking": 1 }).await?;
        Ok(())
    }

    async fn create_unique_index(&self, collection: &str, keys: Document) -> StoreResult<()> {
        let model = IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.db
            .collection::<Document>(collection)
            .create_index(model, None)
            .await?;
        Ok(())
    }

    fn target_filter(target: &ServiceRef, public_only: bool) -> Document {
        let mut filter = doc! {
            "target_type": target.service_type.as_str(),
            "target_id": target.service_id,
        };
        if public_only {
            filter.insert("is_public", true);
        }
        filter
    }
}

fn newest_first() -> FindOptions {
    FindOptions::builder().sort(doc! { "created_at": -1 }).build()
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_err)) if write_err.code == 11000
    )
}

fn inserted_id(result: mongodb::results::InsertOneResult) -> StoreResult<ObjectId> {
    result.inserted_id.as_object_id().ok_or_else(|| {
        StoreError::Database(mongodb::error::Error::custom("inserted id is not an ObjectId"))
    })
}

#[rocket::async_trait]
impl Store for MongoStore {
    async fn insert_user(&self, user: &User) -> StoreResult<ObjectId> {
        match self.users().insert_one(user, None).await {
            Ok(result) => inserted_id(result),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate("users.email")),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user(&self, id: ObjectId) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "email": email }, None).await?)
    }

    async fn set_user_role(&self, id: ObjectId, role: Role) -> StoreResult<()> {
        self.users()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "role": role.as_str(), "updated_at": DateTime::now() } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn insert_guide(&self, guide: &Guide) -> StoreResult<ObjectId> {
        match self.guides().insert_one(guide, None).await {
            Ok(result) => inserted_id(result),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate("guides")),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_guide(&self, id: ObjectId) -> StoreResult<Option<Guide>> {
        Ok(self.guides().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_guide_by_user(&self, user_id: ObjectId) -> StoreResult<Option<Guide>> {
        Ok(self.guides().find_one(doc! { "user": user_id }, None).await?)
    }

    async fn find_guide_by_registration(&self, guide_id: &str) -> StoreResult<Option<Guide>> {
        Ok(self
            .guides()
            .find_one(doc! { "guide_id": guide_id }, None)
            .await?)
    }

    async fn list_available_guides(&self) -> StoreResult<Vec<Guide>> {
        Ok(self
            .guides()
            .find(doc! { "is_available": true }, newest_first())
            .await?
            .try_collect()
            .await?)
    }

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> StoreResult<ObjectId> {
        match self.vehicles().insert_one(vehicle, None).await {
            Ok(result) => inserted_id(result),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate("vehicles")),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_vehicle(&self, id: ObjectId) -> StoreResult<Option<Vehicle>> {
        Ok(self.vehicles().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_vehicle_by_user(&self, user_id: ObjectId) -> StoreResult<Option<Vehicle>> {
        Ok(self
            .vehicles()
            .find_one(doc! { "user": user_id }, None)
            .await?)
    }

    async fn find_vehicle_by_plate(&self, plate: &str) -> StoreResult<Option<Vehicle>> {
        Ok(self
            .vehicles()
            .find_one(doc! { "license_plate": plate }, None)
            .await?)
    }

    async fn list_available_vehicles(&self) -> StoreResult<Vec<Vehicle>> {
        Ok(self
            .vehicles()
            .find(doc! { "is_available": true }, newest_first())
            .await?
            .try_collect()
            .await?)
    }

    async fn set_target_rating(
        &self,
        target: &ServiceRef,
        rating: f64,
        total_reviews: i32,
    ) -> StoreResult<()> {
        let filter = doc! { "_id": target.service_id };
        let update = doc! { "$set": { "rating": rating, "total_reviews": total_reviews } };
        match target.service_type {
            TargetType::Guide => {
                self.guides().update_one(filter, update, None).await?;
            }
            TargetType::Vehicle => {
                self.vehicles().update_one(filter, update, None).await?;
            }
        }
        Ok(())
    }

    async fn insert_booking(&self, booking: &Booking) -> StoreResult<ObjectId> {
        let result = self.bookings().insert_one(booking, None).await?;
        inserted_id(result)
    }

    async fn find_booking(&self, id: ObjectId) -> StoreResult<Option<Booking>> {
        Ok(self.bookings().find_one(doc! { "_id": id }, None).await?)
    }

    async fn update_booking_status(
        &self,
        id: ObjectId,
        status: BookingStatus,
        completed_at: Option<DateTime>,
    ) -> StoreResult<()> {
        let mut set = doc! { "status": status.as_str(), "updated_at": DateTime::now() };
        let mut update = doc! {};
        match completed_at {
            Some(ts) => {
                set.insert("completed_at", ts);
            }
            None => {
                update.insert("$unset", doc! { "completed_at": "" });
            }
        }
        update.insert("$set", set);
        self.bookings()
            .update_one(doc! { "_id": id }, update, None)
            .await?;
        Ok(())
    }

    async fn set_booking_reviewed(&self, id: ObjectId, reviewed: bool) -> StoreResult<()> {
        self.bookings()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "reviewed": reviewed, "updated_at": DateTime::now() } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn bookings_for_tourist(&self, tourist: ObjectId) -> StoreResult<Vec<Booking>> {
        Ok(self
            .bookings()
            .find(doc! { "tourist": tourist }, newest_first())
            .await?
            .try_collect()
            .await?)
    }

    async fn insert_review(&self, review: &Review) -> StoreResult<ObjectId> {
        match self.reviews().insert_one(review, None).await {
            Ok(result) => inserted_id(result),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate("reviews.booking")),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_review(&self, id: ObjectId) -> StoreResult<Option<Review>> {
        Ok(self.reviews().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_review_by_booking(&self, booking: ObjectId) -> StoreResult<Option<Review>> {
        Ok(self
            .reviews()
            .find_one(doc! { "booking": booking }, None)
            .await?)
    }

    async fn save_review(&self, review: &Review) -> StoreResult<()> {
        let id = match review.id {
            Some(id) => id,
            None => return Ok(()),
        };
        self.reviews()
            .replace_one(doc! { "_id": id }, review, None)
            .await?;
        Ok(())
    }

    async fn delete_review(&self, id: ObjectId) -> StoreResult<()> {
        self.reviews().delete_one(doc! { "_id": id }, None).await?;
        Ok(())
    }

    async fn reviews_for_target(
        &self,
        target: &ServiceRef,
        public_only: bool,
    ) -> StoreResult<Vec<Review>> {
        Ok(self
            .reviews()
            .find(Self::target_filter(target, public_only), newest_first())
            .await?
            .try_collect()
            .await?)
    }

    async fn reviews_page_for_target(
        &self,
        target: &ServiceRef,
        skip: u64,
        limit: i64,
    ) -> StoreResult<Vec<Review>> {
        let options = FindOptions::builder()
            .skip(skip)
            .limit(limit)
            .sort(doc! { "created_at": -1 })
            .build();
        Ok(self
            .reviews()
            .find(Self::target_filter(target, true), options)
            .await?
            .try_collect()
            .await?)
    }

    async fn reviews_for_author(&self, author: ObjectId) -> StoreResult<Vec<Review>> {
        Ok(self
            .reviews()
            .find(doc! { "author": author }, newest_first())
            .await?
            .try_collect()
            .await?)
    }

    async fn insert_eligibility(&self, grant: &ReviewEligibility) -> StoreResult<ObjectId> {
        let result = self.eligibilities().insert_one(grant, None).await?;
        inserted_id(result)
    }

    async fn find_eligibility_by_booking(
        &self,
        booking: ObjectId,
    ) -> StoreResult<Option<ReviewEligibility>> {
        Ok(self
            .eligibilities()
            .find_one(doc! { "booking": booking }, None)
            .await?)
    }

    async fn set_eligibility_submitted(
        &self,
        booking: ObjectId,
        submitted: bool,
    ) -> StoreResult<()> {
        self.eligibilities()
            .update_one(
                doc! { "booking": booking },
                doc! { "$set": { "review_submitted": submitted, "updated_at": DateTime::now() } },
                None,
            )
            .await?;
        Ok(())
    }
}
