//! Plan resolution seam.
//!
//! Billing is not wired in yet, so production uses [`FixedPlanResolver::free`].
//! A billing-backed resolver implements [`PlanResolver`] and is injected into
//! the evaluator in its place.

use async_trait::async_trait;

use studygate_models::Plan;

use crate::error::PlanError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlanResolver: Send + Sync {
    async fn resolve_plan(&self, user_id: &str) -> Result<Plan, PlanError>;
}

/// Resolves every user to the same plan.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPlanResolver {
    plan: Plan,
}

impl FixedPlanResolver {
    pub fn new(plan: Plan) -> Self {
        Self { plan }
    }

    /// Every user is on the free plan.
    pub fn free() -> Self {
        Self::new(Plan::Free)
    }
}

#[async_trait]
impl PlanResolver for FixedPlanResolver {
    async fn resolve_plan(&self, _user_id: &str) -> Result<Plan, PlanError> {
        Ok(self.plan)
    }
}
