//! Firebase ID token authentication.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::Context;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Google JWKS URL for Firebase Auth.
const GOOGLE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const FIREBASE_ISSUER_PREFIX: &str = "https://securetoken.google.com/";

const JWKS_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Minimum gap between fetch attempts, successful or not.
const JWKS_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Decoded Firebase ID token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseClaims {
    /// User ID
    pub sub: String,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub iss: String,
    /// Firebase project ID
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated user extracted from request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
}

impl From<FirebaseClaims> for AuthUser {
    fn from(claims: FirebaseClaims) -> Self {
        Self {
            uid: claims.sub,
            email: claims.email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<JwkKey>,
}

#[derive(Debug, Clone, Deserialize)]
struct JwkKey {
    kid: String,
    n: String,
    e: String,
}

/// Cached Google signing keys.
pub struct JwksCache {
    http: Client,
    jwks_url: String,
    keys: RwLock<HashMap<String, DecodingKey>>,
    last_refresh: RwLock<Option<Instant>>,
    last_attempt: RwLock<Option<Instant>>,
    project_id: String,
}

impl JwksCache {
    /// Create a cache and fetch the current keys.
    pub async fn new(project_id: impl Into<String>) -> anyhow::Result<Self> {
        let cache = Self::empty(project_id)?;
        cache.refresh_keys().await?;
        Ok(cache)
    }

    /// Create a cache with no keys; they are fetched on first use.
    pub fn empty(project_id: impl Into<String>) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build JWKS HTTP client")?;

        Ok(Self {
            http,
            jwks_url: GOOGLE_JWKS_URL.to_string(),
            keys: RwLock::new(HashMap::new()),
            last_refresh: RwLock::new(None),
            last_attempt: RwLock::new(None),
            project_id: project_id.into(),
        })
    }

    /// Fetch keys from a different endpoint.
    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = url.into();
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    async fn refresh_keys(&self) -> anyhow::Result<()> {
        debug!("Refreshing JWKS keys");
        *self.last_attempt.write().await = Some(Instant::now());

        let jwks: JwksResponse = self
            .http
            .get(&self.jwks_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut keys = HashMap::new();
        for jwk in jwks.keys {
            let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
                .with_context(|| format!("Invalid JWK '{}'", jwk.kid))?;
            keys.insert(jwk.kid, key);
        }

        let key_count = keys.len();
        *self.keys.write().await = keys;
        *self.last_refresh.write().await = Some(Instant::now());

        debug!("Refreshed {} JWKS keys", key_count);
        Ok(())
    }

    async fn within(stamp: &RwLock<Option<Instant>>, interval: Duration) -> bool {
        stamp
            .read()
            .await
            .is_some_and(|last| last.elapsed() < interval)
    }

    /// Refresh unless an attempt was made in the last minute.
    async fn try_refresh(&self) {
        if Self::within(&self.last_attempt, JWKS_MIN_REFRESH_INTERVAL).await {
            return;
        }
        if let Err(e) = self.refresh_keys().await {
            warn!("Failed to refresh JWKS keys: {:#}", e);
        }
    }

    async fn get_key(&self, kid: &str) -> Option<DecodingKey> {
        if !Self::within(&self.last_refresh, JWKS_CACHE_TTL).await {
            self.try_refresh().await;
        }

        if let Some(key) = self.keys.read().await.get(kid).cloned() {
            return Some(key);
        }

        // Keys may have rotated since the last fetch
        self.try_refresh().await;
        self.keys.read().await.get(kid).cloned()
    }

    /// Verify a Firebase ID token.
    pub async fn verify_token(&self, token: &str) -> Result<FirebaseClaims, ApiError> {
        let header = decode_header(token)
            .map_err(|e| ApiError::unauthorized(format!("Invalid token header: {}", e)))?;

        let kid = header
            .kid
            .ok_or_else(|| ApiError::unauthorized("Token missing key ID"))?;

        let key = self
            .get_key(&kid)
            .await
            .ok_or_else(|| ApiError::unauthorized("Unknown key ID"))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[format!("{}{}", FIREBASE_ISSUER_PREFIX, self.project_id)]);
        validation.set_audience(&[&self.project_id]);

        let token_data = decode::<FirebaseClaims>(token, &key, &validation)
            .map_err(|e| ApiError::unauthorized(format!("Token validation failed: {}", e)))?;

        Ok(token_data.claims)
    }
}

/// Bearer token from an `Authorization` header value.
fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header format"))
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.jwks.verify_token(token).await?;
        Ok(AuthUser::from(claims))
    }
}
