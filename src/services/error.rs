use thiserror::Error;

use crate::db::StoreError;
use crate::models::BookingStatus;

/// Domain errors surfaced by the booking, review, and rating services. All
/// are recoverable at the request boundary; the HTTP layer maps each kind to
/// a response status in `utils::response`.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Authorization(String),

    #[error("cannot change booking status from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("booking is already completed")]
    AlreadyCompleted,

    #[error("{0}")]
    DuplicateReview(String),

    #[error("{0}")]
    Mismatch(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
