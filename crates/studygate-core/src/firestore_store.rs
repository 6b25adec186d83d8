//! Firestore-backed record store.

use async_trait::async_trait;
use tracing::debug;

use studygate_firestore::{
    FieldOp, Filter, FirestoreClient, StructuredQuery, ToFirestoreValue,
};

use crate::error::StoreError;
use crate::store::{CountQuery, RecordStore};

/// Counts usage records with Firestore `COUNT` aggregation queries.
///
/// Records live in top-level collections and carry the owner's id in a field.
#[derive(Clone)]
pub struct FirestoreRecordStore {
    client: FirestoreClient,
}

impl FirestoreRecordStore {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Structured query selecting the records `query` counts.
    pub fn structured_query(query: &CountQuery) -> StructuredQuery {
        let mut filters = vec![Filter::field(
            query.record.user_field(),
            FieldOp::Equal,
            query.user_id.as_str().to_firestore_value(),
        )];
        if let Some(since) = query.since {
            filters.push(Filter::field(
                query.record.timestamp_field(),
                FieldOp::GreaterThanOrEqual,
                since.to_firestore_value(),
            ));
        }

        StructuredQuery::collection(query.record.collection()).with_filter(Filter::and(filters))
    }
}

#[async_trait]
impl RecordStore for FirestoreRecordStore {
    async fn count(&self, query: &CountQuery) -> Result<u64, StoreError> {
        let count = self.client.count(None, Self::structured_query(query)).await?;
        debug!(
            collection = query.record.collection(),
            user_id = %query.user_id,
            since = ?query.since,
            count,
            "Counted usage records"
        );
        Ok(count)
    }
}
