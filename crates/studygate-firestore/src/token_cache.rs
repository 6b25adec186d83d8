//! Access tokens for Firestore requests.
//!
//! Service-account tokens are cached and refreshed a minute before expiry.
//! Concurrent callers share one refresh; if a refresh fails while the cached
//! token is still valid, the cached token is handed out instead.
//! The emulator accepts a fixed `owner` token.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use gcp_auth::TokenProvider;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{FirestoreError, FirestoreResult};

/// Refresh this long before the token expires.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// TTL assumed when the provider's expiry cannot be converted.
const TOKEN_DEFAULT_TTL: Duration = Duration::from_secs(50 * 60);

/// OAuth scope for Firestore/Datastore access.
pub const FIRESTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Bearer token the Firestore emulator accepts for admin access.
pub const EMULATOR_TOKEN: &str = "owner";

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now + TOKEN_REFRESH_MARGIN < self.expires_at
    }

    fn is_usable(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Where request tokens come from.
#[derive(Clone)]
pub enum TokenSource {
    /// Local emulator, no real credentials.
    Emulator,
    /// Service account tokens behind a cache.
    ServiceAccount(Arc<TokenCache>),
}

impl TokenSource {
    /// Current bearer token.
    pub async fn token(&self) -> FirestoreResult<String> {
        match self {
            TokenSource::Emulator => Ok(EMULATOR_TOKEN.to_string()),
            TokenSource::ServiceAccount(cache) => cache.get_token().await,
        }
    }

    /// Drop any cached token so the next call fetches a new one.
    pub async fn invalidate(&self) {
        if let TokenSource::ServiceAccount(cache) = self {
            cache.invalidate().await;
        }
    }
}

/// Service-account token cache with single-flight refresh.
pub struct TokenCache {
    auth: Arc<dyn TokenProvider>,
    cache: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(auth: Arc<dyn TokenProvider>) -> Self {
        Self {
            auth,
            cache: RwLock::new(None),
        }
    }

    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    /// Get a valid access token, refreshing if necessary.
    pub async fn get_token(&self) -> FirestoreResult<String> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            if cached.is_fresh(Instant::now()) {
                return Ok(cached.access_token.clone());
            }
        }

        let mut cache = self.cache.write().await;

        // Another task may have refreshed while we waited for the lock
        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh(Instant::now()) {
                return Ok(cached.access_token.clone());
            }
        }

        match self.auth.token(&[FIRESTORE_SCOPE]).await {
            Ok(token) => {
                let access_token = token.as_str().to_string();
                *cache = Some(CachedToken {
                    access_token: access_token.clone(),
                    expires_at: expiry_instant(token.expires_at(), Utc::now(), Instant::now()),
                });
                debug!("Refreshed Firestore access token");
                Ok(access_token)
            }
            Err(e) => match cache.as_ref() {
                Some(cached) if cached.is_usable(Instant::now()) => {
                    warn!(error = %e, "Token refresh failed, reusing cached token");
                    Ok(cached.access_token.clone())
                }
                _ => Err(FirestoreError::auth_error(format!(
                    "Failed to obtain auth token: {}",
                    e
                ))),
            },
        }
    }
}

/// Convert a wall-clock expiry into a monotonic deadline.
fn expiry_instant(expires_at: DateTime<Utc>, now: DateTime<Utc>, now_instant: Instant) -> Instant {
    if expires_at <= now {
        // Already expired: force a refresh on next use
        return now_instant;
    }
    match (expires_at - now).to_std() {
        Ok(ttl) => now_instant + ttl,
        Err(_) => now_instant + TOKEN_DEFAULT_TTL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_in_future() {
        let now = Utc::now();
        let start = Instant::now();
        let deadline = expiry_instant(now + chrono::TimeDelta::seconds(600), now, start);
        assert_eq!(deadline, start + Duration::from_secs(600));
    }

    #[test]
    fn test_expiry_in_past_is_immediate() {
        let now = Utc::now();
        let start = Instant::now();
        let deadline = expiry_instant(now - chrono::TimeDelta::seconds(5), now, start);
        assert_eq!(deadline, start);
    }

    #[test]
    fn test_cached_token_freshness_uses_margin() {
        let now = Instant::now();
        let token = CachedToken {
            access_token: "t".to_string(),
            expires_at: now + Duration::from_secs(30),
        };
        assert!(!token.is_fresh(now));
        assert!(token.is_usable(now));
    }

    #[tokio::test]
    async fn test_emulator_source_returns_owner() {
        let source = TokenSource::Emulator;
        assert_eq!(source.token().await.unwrap(), EMULATOR_TOKEN);
        source.invalidate().await;
        assert_eq!(source.token().await.unwrap(), EMULATOR_TOKEN);
    }

    #[test]
    fn test_firestore_scope() {
        assert!(FIRESTORE_SCOPE.contains("datastore"));
    }
}
