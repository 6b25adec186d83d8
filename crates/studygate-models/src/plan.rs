//! Subscription plans.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Plan tier enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Starter,
    Pro,
}

impl Plan {
    /// All known plans.
    pub const ALL: [Plan; 3] = [Plan::Free, Plan::Starter, Plan::Pro];

    /// Parse from string (case-insensitive). Unknown names resolve to `Free`.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "starter" => Plan::Starter,
            "pro" => Plan::Pro,
            _ => Plan::Free,
        }
    }

    /// Whether this plan is subject to free-tier quotas.
    pub fn is_free(&self) -> bool {
        matches!(self, Plan::Free)
    }

    /// Get the plan name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Starter => "starter",
            Plan::Pro => "pro",
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
