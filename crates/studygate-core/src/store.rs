//! Record store seam.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use studygate_models::RecordKind;

use crate::error::StoreError;

/// Count request: records of one kind owned by a user, optionally on or after `since`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountQuery {
    pub record: RecordKind,
    pub user_id: String,
    pub since: Option<DateTime<Utc>>,
}

impl CountQuery {
    pub fn new(record: RecordKind, user_id: impl Into<String>, since: Option<DateTime<Utc>>) -> Self {
        Self {
            record,
            user_id: user_id.into(),
            since,
        }
    }
}

/// Queryable store of usage records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Number of records matching `query`.
    async fn count(&self, query: &CountQuery) -> Result<u64, StoreError>;
}
