use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use rocket_okapi::okapi::schemars::JsonSchema;
use tokio::sync::Mutex as AsyncMutex;

use crate::db::Store;
use crate::models::{Review, ServiceRef};
use crate::services::error::ServiceResult;

#[derive(Debug, Clone, Copy, Serialize, JsonSchema)]
pub struct RatingSummary {
    pub average: f64,
    pub count: i32,
}

#[derive(Debug, Default, Serialize, JsonSchema)]
pub struct RatingDistribution {
    #[serde(rename = "5")]
    pub five: i32,
    #[serde(rename = "4")]
    pub four: i32,
    #[serde(rename = "3")]
    pub three: i32,
    #[serde(rename = "2")]
    pub two: i32,
    #[serde(rename = "1")]
    pub one: i32,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ReviewStatistics {
    pub average_rating: f64,
    pub total_reviews: i32,
    pub rating_distribution: RatingDistribution,
    /// Percentage of reviewers who would recommend the service.
    pub recommendation_rate: i32,
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Recomputes the derived `rating`/`total_reviews` fields on guides and
/// vehicles. Sole writer of those fields.
#[derive(Default)]
pub struct RatingService {
    locks: Mutex<HashMap<ServiceRef, Arc<AsyncMutex<()>>>>,
}

impl RatingService {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, target: ServiceRef) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks
            .entry(target)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Reads the target's public reviews and writes the fresh aggregate back
    /// onto the target record. Serialized per target so two concurrent
    /// review mutations cannot interleave the read-aggregate-write.
    pub async fn recompute(
        &self,
        store: &dyn Store,
        target: ServiceRef,
    ) -> ServiceResult<RatingSummary> {
        let lock = self.lock_for(target);
        let _guard = lock.lock().await;

        let reviews = store.reviews_for_target(&target, true).await?;
        let summary = Self::summarize(&reviews);
        store
            .set_target_rating(&target, summary.average, summary.count)
            .await?;
        Ok(summary)
    }

    /// Average rating (one decimal place) and count over a review set.
    pub fn summarize(reviews: &[Review]) -> RatingSummary {
        let count = reviews.len() as i32;
        if count == 0 {
            return RatingSummary {
                average: 0.0,
                count: 0,
            };
        }
        let sum: i32 = reviews.iter().map(|r| r.rating).sum();
        RatingSummary {
            average: round_to_tenth(f64::from(sum) / f64::from(count)),
            count,
        }
    }

    /// Read-path statistics for paginated review listings, computed over the
    /// same filtered set as the listing rather than read from the target
    /// record.
    pub fn statistics(reviews: &[Review]) -> ReviewStatistics {
        let summary = Self::summarize(reviews);
        let mut distribution = RatingDistribution::default();
        let mut recommended = 0usize;
        for review in reviews {
            match review.rating {
                5 => distribution.five += 1,
                4 => distribution.four += 1,
                3 => distribution.three += 1,
                2 => distribution.two += 1,
                _ => distribution.one += 1,
            }
            if review.would_recommend {
                recommended += 1;
            }
        }
        let recommendation_rate = if reviews.is_empty() {
            0
        } else {
            (recommended as f64 / reviews.len() as f64 * 100.0).round() as i32
        };
        ReviewStatistics {
            average_rating: summary.average,
            total_reviews: summary.count,
            rating_distribution: distribution,
            recommendation_rate,
        }
    }
}
