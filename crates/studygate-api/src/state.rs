//! Application state.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use studygate_core::{FirestoreRecordStore, FixedPlanResolver, QuotaEvaluator};
use studygate_firestore::FirestoreClient;

use crate::auth::JwksCache;
use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub quota: Arc<QuotaEvaluator>,
    /// Present when records are counted in Firestore; used by readiness checks.
    pub firestore: Option<Arc<FirestoreClient>>,
    pub jwks: Arc<JwksCache>,
}

impl AppState {
    /// Create state backed by Firestore, with every user on the free plan.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let firestore = FirestoreClient::from_env()
            .await
            .context("Failed to create Firestore client")?;
        let project_id = firestore.config().project_id.clone();

        let jwks = JwksCache::new(project_id.as_str())
            .await
            .context("Failed to load Firebase signing keys")?;

        let quota = QuotaEvaluator::new(
            Arc::new(FirestoreRecordStore::new(firestore.clone())),
            Arc::new(FixedPlanResolver::free()),
        )
        .with_calendar(config.quota_calendar);

        info!(project_id = %project_id, calendar = ?config.quota_calendar, "Quota evaluator ready");

        Ok(Self {
            config,
            quota: Arc::new(quota),
            firestore: Some(Arc::new(firestore)),
            jwks: Arc::new(jwks),
        })
    }

    /// Create state around an existing evaluator.
    pub fn with_evaluator(config: ApiConfig, quota: QuotaEvaluator, jwks: JwksCache) -> Self {
        Self {
            config,
            quota: Arc::new(quota),
            firestore: None,
            jwks: Arc::new(jwks),
        }
    }
}
