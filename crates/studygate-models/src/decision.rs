//! Quota decisions and usage stats.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Allow/deny result for a single action, with usage metadata.
///
/// Metadata is only present when a count was taken: allowed decisions for
/// paid plans or ungated actions carry `allowed` alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    /// Whether the action may proceed.
    pub allowed: bool,
    /// Why the action was denied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Call to action shown alongside a denial.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrade_message: Option<String>,
    /// Records counted in the current window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<u64>,
    /// Maximum records allowed in the window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Actions left before the limit is reached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u64>,
}

impl Decision {
    /// Allowed without counting.
    pub fn unmetered() -> Self {
        Self {
            allowed: true,
            reason: None,
            upgrade_message: None,
            current: None,
            limit: None,
            remaining: None,
        }
    }

    /// Counted and below the limit.
    pub fn within_limit(current: u64, limit: u64) -> Self {
        Self {
            allowed: true,
            reason: None,
            upgrade_message: None,
            current: Some(current),
            limit: Some(limit),
            remaining: Some(limit.saturating_sub(current)),
        }
    }

    /// Counted and at or over the limit.
    pub fn limit_reached(
        current: u64,
        limit: u64,
        reason: impl Into<String>,
        upgrade_message: impl Into<String>,
    ) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            upgrade_message: Some(upgrade_message.into()),
            current: Some(current),
            limit: Some(limit),
            remaining: None,
        }
    }

    /// Whether a count was taken for this decision.
    pub fn is_metered(&self) -> bool {
        self.current.is_some()
    }
}

/// Usage of one category against its quota.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UsageSummary {
    pub used: u64,
    pub limit: u64,
    pub remaining: u64,
}

impl UsageSummary {
    /// Summarise a counted decision; remaining is zero once the limit is reached.
    pub fn from_decision(decision: &Decision) -> Self {
        Self {
            used: decision.current.unwrap_or(0),
            limit: decision.limit.unwrap_or(0),
            remaining: if decision.allowed {
                decision.remaining.unwrap_or(0)
            } else {
                0
            },
        }
    }
}

/// Usage across all gated categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UsageStats {
    pub materials: UsageSummary,
    pub quizzes: UsageSummary,
    pub writings: UsageSummary,
}
