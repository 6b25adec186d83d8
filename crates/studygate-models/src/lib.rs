//! Shared data models for the StudyGate usage gate.
//!
//! This crate provides Serde-serializable types for:
//! - Plans and gated action kinds
//! - Static free-tier quotas
//! - Usage windows and calendar boundaries
//! - Quota decisions and usage stats

pub mod action;
pub mod decision;
pub mod plan;
pub mod quota;
pub mod record;
pub mod window;

// Re-export common types
pub use action::ActionKind;
pub use decision::{Decision, UsageStats, UsageSummary};
pub use plan::Plan;
pub use quota::QuotaDefinition;
pub use record::RecordKind;
pub use window::{Calendar, CalendarParseError, UsageWindow};
