//! Firestore REST API client.
//!
//! This crate provides:
//! - Structured and aggregation (`COUNT`) queries
//! - Service account authentication via gcp_auth, or the local emulator
//! - Token caching with refresh margin
//! - Request tracing spans and metrics

pub mod client;
pub mod error;
pub mod metrics;
pub mod token_cache;
pub mod types;


pub use client::{FirestoreClient, FirestoreConfig};
pub use error::{FirestoreError, FirestoreResult};
pub use types::{
    Filter, FieldOp, FromFirestoreValue, StructuredQuery, ToFirestoreValue, Value,
};
