//! Quota evaluator.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, instrument};

use studygate_models::{ActionKind, Calendar, Decision, UsageStats, UsageSummary};

use crate::clock::{Clock, SystemClock};
use crate::counter::{WindowCounter, MATERIAL_COUNTER, QUIZ_COUNTER, WRITING_COUNTER};
use crate::error::{QuotaError, QuotaResult};
use crate::plan::PlanResolver;
use crate::store::RecordStore;

/// Decisions made, labelled by action and outcome.
pub const DECISIONS_TOTAL: &str = "studygate_quota_decisions_total";

/// Decides whether a user may take an action, and reports their usage.
#[derive(Clone)]
pub struct QuotaEvaluator {
    store: Arc<dyn RecordStore>,
    plans: Arc<dyn PlanResolver>,
    clock: Arc<dyn Clock>,
    calendar: Calendar,
}

impl QuotaEvaluator {
    /// Evaluator on the system clock and local calendar.
    pub fn new(store: Arc<dyn RecordStore>, plans: Arc<dyn PlanResolver>) -> Self {
        Self {
            store,
            plans,
            clock: Arc::new(SystemClock),
            calendar: Calendar::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Calendar in which month and day windows open.
    pub fn with_calendar(mut self, calendar: Calendar) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    /// Decide whether `user_id` may take `action` now.
    ///
    /// Only free-plan users are counted. Store and plan failures are returned
    /// as errors, never turned into a decision.
    #[instrument(skip(self))]
    pub async fn evaluate(&self, user_id: &str, action: ActionKind) -> QuotaResult<Decision> {
        validate_user(user_id)?;

        let plan = self.plans.resolve_plan(user_id).await?;
        let decision = if !plan.is_free() {
            Decision::unmetered()
        } else {
            match Self::counter_for(action) {
                Some(counter) => {
                    counter
                        .check(self.store.as_ref(), user_id, self.clock.now(), self.calendar)
                        .await?
                }
                None => Decision::unmetered(),
            }
        };

        debug!(
            plan = %plan,
            allowed = decision.allowed,
            current = ?decision.current,
            limit = ?decision.limit,
            "Quota decision"
        );
        counter!(
            DECISIONS_TOTAL,
            "action" => action.as_str(),
            "allowed" => if decision.allowed { "true" } else { "false" }
        )
        .increment(1);

        Ok(decision)
    }

    /// Usage of every gated category, regardless of plan.
    ///
    /// All three counts share one `now` and run concurrently; the first
    /// failure is returned.
    #[instrument(skip(self))]
    pub async fn usage_stats(&self, user_id: &str) -> QuotaResult<UsageStats> {
        validate_user(user_id)?;
        let now = self.clock.now();
        let store = self.store.as_ref();

        let (materials, quizzes, writings) = tokio::try_join!(
            MATERIAL_COUNTER.check(store, user_id, now, self.calendar),
            QUIZ_COUNTER.check(store, user_id, now, self.calendar),
            WRITING_COUNTER.check(store, user_id, now, self.calendar),
        )?;

        Ok(UsageStats {
            materials: UsageSummary::from_decision(&materials),
            quizzes: UsageSummary::from_decision(&quizzes),
            writings: UsageSummary::from_decision(&writings),
        })
    }

    /// Counter gating `action`, if any.
    ///
    /// `GenerateQuestions` has a defined cap but is limited where questions
    /// are created, not here.
    fn counter_for(action: ActionKind) -> Option<&'static WindowCounter> {
        match action {
            ActionKind::UploadMaterial => Some(&MATERIAL_COUNTER),
            ActionKind::TakeQuiz => Some(&QUIZ_COUNTER),
            ActionKind::AiWriting => Some(&WRITING_COUNTER),
            ActionKind::GenerateQuestions | ActionKind::Other => None,
        }
    }
}

fn validate_user(user_id: &str) -> QuotaResult<()> {
    if user_id.trim().is_empty() {
        return Err(QuotaError::InvalidUser);
    }
    Ok(())
}
