//! Axum HTTP API server.
//!
//! This crate provides:
//! - Quota check and usage stats endpoints
//! - Firebase ID token verification
//! - Request id, logging, CORS, and body-limit middleware
//! - Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
