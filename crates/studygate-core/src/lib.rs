//! Free-tier usage gate.
//!
//! This crate provides:
//! - The quota evaluator consulted before gated actions
//! - One parameterised window counter shared by every gated action
//! - The usage stats aggregator
//! - Seams for the record store, plan resolution, and the clock
//!
//! Counts are read fresh on every call. Two concurrent actions by the same
//! user can both pass a check before either writes its record, so the true
//! count may exceed a limit by the number of racing requests.

pub mod clock;
pub mod counter;
pub mod error;
pub mod evaluator;
pub mod firestore_store;
pub mod memory_store;
pub mod plan;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use counter::{WindowCounter, MATERIAL_COUNTER, QUIZ_COUNTER, WRITING_COUNTER};
pub use error::{PlanError, QuotaError, QuotaResult, StoreError};
pub use evaluator::QuotaEvaluator;
pub use firestore_store::FirestoreRecordStore;
pub use memory_store::MemoryRecordStore;
pub use plan::{FixedPlanResolver, PlanResolver};
pub use store::{CountQuery, RecordStore};
