//! Firestore REST API client.
//!
//! Read-only client used by the usage gate:
//! - Token caching with refresh margin, or the local emulator
//! - HTTP client tuning (pooling, timeouts)
//! - One re-authentication when an access token has expired
//! - Observability (tracing spans, metrics)
//!
//! Failed requests are never retried; the error goes straight to the caller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, info_span, Instrument};

use crate::error::{FirestoreError, FirestoreResult};
use crate::metrics::{record_request, record_token_refresh};
use crate::token_cache::{TokenCache, TokenSource};
use crate::types::{
    AggregationResult, Document, FromFirestoreValue, RunAggregationQueryRequest,
    RunAggregationQueryResponse, StructuredAggregationQuery, StructuredQuery,
};

/// Alias used for single-count aggregation queries.
const COUNT_ALIAS: &str = "count";

// =============================================================================
// Configuration
// =============================================================================

/// Firestore client configuration.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// GCP project ID
    pub project_id: String,
    /// Database ID (usually "(default)")
    pub database_id: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Emulator `host:port`; when set, requests go over plain HTTP without credentials
    pub emulator_host: Option<String>,
}

impl FirestoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> FirestoreResult<Self> {
        let project_id = std::env::var("GCP_PROJECT_ID")
            .or_else(|_| std::env::var("FIREBASE_PROJECT_ID"))
            .map_err(|_| {
                FirestoreError::auth_error(
                    "GCP_PROJECT_ID or FIREBASE_PROJECT_ID must be set to access Firestore",
                )
            })?;

        if project_id.trim().is_empty() {
            return Err(FirestoreError::auth_error(
                "GCP_PROJECT_ID or FIREBASE_PROJECT_ID cannot be empty",
            ));
        }

        Ok(Self {
            project_id,
            database_id: std::env::var("FIRESTORE_DATABASE_ID")
                .unwrap_or_else(|_| "(default)".to_string()),
            timeout: Duration::from_secs(env_secs("FIRESTORE_TIMEOUT_SECS", 30)),
            connect_timeout: Duration::from_secs(env_secs("FIRESTORE_CONNECT_TIMEOUT_SECS", 5)),
            emulator_host: std::env::var("FIRESTORE_EMULATOR_HOST")
                .ok()
                .filter(|h| !h.trim().is_empty()),
        })
    }

    /// Base URL for document resources.
    pub fn documents_url(&self) -> String {
        let root = match &self.emulator_host {
            Some(host) => format!("http://{}", host),
            None => "https://firestore.googleapis.com".to_string(),
        };
        format!(
            "{}/v1/projects/{}/databases/{}/documents",
            root, self.project_id, self.database_id
        )
    }
}

fn env_secs(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

// =============================================================================
// Client
// =============================================================================

/// Firestore REST API client.
#[derive(Clone)]
pub struct FirestoreClient {
    http: Client,
    config: FirestoreConfig,
    base_url: String,
    tokens: TokenSource,
}

impl FirestoreClient {
    /// Create a new Firestore client.
    pub async fn new(config: FirestoreConfig) -> FirestoreResult<Self> {
        let tokens = match config.emulator_host {
            Some(ref host) => {
                debug!(emulator_host = %host, "Using Firestore emulator");
                TokenSource::Emulator
            }
            None => TokenSource::ServiceAccount(Arc::new(TokenCache::new(
                Self::create_auth_provider()?,
            ))),
        };

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("studygate-firestore/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FirestoreError::Network)?;

        Ok(Self {
            http,
            base_url: config.documents_url(),
            config,
            tokens,
        })
    }

    fn create_auth_provider() -> FirestoreResult<Arc<dyn TokenProvider>> {
        let service_account = CustomServiceAccount::from_env().map_err(|e| {
            FirestoreError::auth_error(format!("Failed to load service account: {}", e))
        })?;

        match service_account {
            Some(sa) => Ok(Arc::new(sa)),
            None => Err(FirestoreError::auth_error(
                "GOOGLE_APPLICATION_CREDENTIALS not set. \
                 Set it to the path of your service account JSON file.",
            )),
        }
    }

    /// Create from environment variables.
    pub async fn from_env() -> FirestoreResult<Self> {
        let config = FirestoreConfig::from_env()?;
        Self::new(config).await
    }

    pub fn config(&self) -> &FirestoreConfig {
        &self.config
    }

    fn is_access_token_expired(body: &str) -> bool {
        body.contains("ACCESS_TOKEN_EXPIRED") || body.contains("\"UNAUTHENTICATED\"")
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get a document, or `None` if it does not exist.
    pub async fn get_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> FirestoreResult<Option<Document>> {
        let url = format!(
            "{}/{}/{}",
            self.base_url,
            collection,
            urlencoding::encode(doc_id)
        );

        self.execute_request("get_document", collection, async {
            let response = self
                .send_authorized(&url, |token| self.http.get(&url).bearer_auth(token))
                .await?;
            let status = response.status();

            match status {
                StatusCode::OK => Ok(Some(response.json().await?)),
                StatusCode::NOT_FOUND => Ok(None),
                _ => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Run an aggregation query.
    ///
    /// `parent_path` is the document containing the queried collection,
    /// or `None` for a top-level collection.
    pub async fn run_aggregation_query(
        &self,
        parent_path: Option<&str>,
        query: StructuredAggregationQuery,
    ) -> FirestoreResult<Vec<AggregationResult>> {
        let url = match parent_path {
            Some(parent) => format!("{}/{}:runAggregationQuery", self.base_url, parent),
            None => format!("{}:runAggregationQuery", self.base_url),
        };
        let collection = query
            .structured_query
            .from
            .first()
            .map(|c| c.collection_id.clone())
            .unwrap_or_default();
        let request = RunAggregationQueryRequest {
            structured_aggregation_query: query,
        };

        self.execute_request("run_aggregation_query", &collection, async {
            let response = self
                .send_authorized(&url, |token| {
                    self.http.post(&url).bearer_auth(token).json(&request)
                })
                .await?;
            let status = response.status();

            if status != StatusCode::OK {
                return Err(Self::handle_error_response(status, &url, response).await);
            }

            let body = response.text().await?;
            // runAggregationQuery streams a JSON array of partial responses
            let responses: Vec<RunAggregationQueryResponse> =
                serde_json::from_str(&body).map_err(|e| {
                    FirestoreError::invalid_response(format!(
                        "Failed to parse runAggregationQuery response: {} (body prefix: {})",
                        e,
                        body.chars().take(200).collect::<String>()
                    ))
                })?;

            Ok(responses.into_iter().filter_map(|r| r.result).collect())
        })
        .await
    }

    /// Count documents matching `query`.
    pub async fn count(
        &self,
        parent_path: Option<&str>,
        query: StructuredQuery,
    ) -> FirestoreResult<u64> {
        let results = self
            .run_aggregation_query(
                parent_path,
                StructuredAggregationQuery::count(query, COUNT_ALIAS),
            )
            .await?;

        results
            .iter()
            .find_map(|r| r.aggregate_fields.get(COUNT_ALIAS))
            .and_then(u64::from_firestore_value)
            .ok_or_else(|| {
                FirestoreError::invalid_response("Aggregation result missing count field")
            })
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Send a request with a bearer token, re-authenticating once on an expired token.
    async fn send_authorized<F>(&self, url: &str, build: F) -> FirestoreResult<Response>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let token = self.tokens.token().await?;
        let response = build(&token).send().await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if !Self::is_access_token_expired(&body) {
            return Err(FirestoreError::from_http_status(
                StatusCode::UNAUTHORIZED.as_u16(),
                format!("{} failed: {}", url, body),
            ));
        }

        debug!("Firestore access token expired, refreshing");
        record_token_refresh();
        self.tokens.invalidate().await;
        let token = self.tokens.token().await?;
        Ok(build(&token).send().await?)
    }

    /// Execute a request with tracing and metrics.
    async fn execute_request<T, F>(
        &self,
        operation: &str,
        collection: &str,
        fut: F,
    ) -> FirestoreResult<T>
    where
        F: std::future::Future<Output = FirestoreResult<T>>,
    {
        let span = info_span!("firestore_request", operation = %operation, collection = %collection);

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn handle_error_response(status: StatusCode, url: &str, response: Response) -> FirestoreError {
        let body = response.text().await.unwrap_or_default();
        FirestoreError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }
}
