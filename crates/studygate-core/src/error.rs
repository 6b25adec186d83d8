//! Quota evaluation errors.
//!
//! A denial is not an error. Errors here are collaborator failures, passed
//! through with their original error as the source.

use std::error::Error as StdError;

use thiserror::Error;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result type for quota operations.
pub type QuotaResult<T> = Result<T, QuotaError>;

#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("User id must not be empty")]
    InvalidUser,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// Record store query failure.
#[derive(Debug, Error)]
#[error("Record store query failed: {0}")]
pub struct StoreError(#[source] BoxError);

impl StoreError {
    pub fn new(err: impl Into<BoxError>) -> Self {
        Self(err.into())
    }

    /// The underlying store error, if it is a `T`.
    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl From<studygate_firestore::FirestoreError> for StoreError {
    fn from(err: studygate_firestore::FirestoreError) -> Self {
        Self::new(err)
    }
}

/// Plan resolution failure.
#[derive(Debug, Error)]
#[error("Plan resolution failed: {0}")]
pub struct PlanError(#[source] BoxError);

impl PlanError {
    pub fn new(err: impl Into<BoxError>) -> Self {
        Self(err.into())
    }

    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}
