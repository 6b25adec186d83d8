//! In-process record store.
//!
//! Applies the same filters as the Firestore store; used for tests and local runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use studygate_models::RecordKind;

use crate::error::StoreError;
use crate::store::{CountQuery, RecordStore};

#[derive(Debug, Clone)]
struct StoredRecord {
    record: RecordKind,
    user_id: String,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<Vec<StoredRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record.
    pub async fn insert(&self, record: RecordKind, user_id: &str, timestamp: DateTime<Utc>) {
        self.records.write().await.push(StoredRecord {
            record,
            user_id: user_id.to_string(),
            timestamp,
        });
    }

    /// Add `n` records sharing a timestamp.
    pub async fn insert_many(
        &self,
        record: RecordKind,
        user_id: &str,
        timestamp: DateTime<Utc>,
        n: usize,
    ) {
        let mut records = self.records.write().await;
        for _ in 0..n {
            records.push(StoredRecord {
                record,
                user_id: user_id.to_string(),
                timestamp,
            });
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn count(&self, query: &CountQuery) -> Result<u64, StoreError> {
        let records = self.records.read().await;
        let count = records
            .iter()
            .filter(|r| r.record == query.record && r.user_id == query.user_id)
            .filter(|r| query.since.map_or(true, |since| r.timestamp >= since))
            .count();
        Ok(count as u64)
    }
}
