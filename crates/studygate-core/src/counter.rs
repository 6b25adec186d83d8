//! Window-scoped usage counters.
//!
//! Every gated action follows the same shape: count the user's records of one
//! kind since the window start, then compare against a static limit.

use chrono::{DateTime, Utc};
use tracing::debug;

use studygate_models::{Calendar, Decision, QuotaDefinition, RecordKind, UsageWindow};

use crate::error::StoreError;
use crate::store::{CountQuery, RecordStore};

/// Shown with every denial.
pub const UPGRADE_MESSAGE: &str = "Upgrade to Starter or Pro for unlimited access.";

/// A record kind counted over a window against a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCounter {
    pub record: RecordKind,
    pub window: UsageWindow,
    pub limit: u64,
    /// What the limit counts, used in the denial reason.
    pub noun: &'static str,
}

/// Study materials ever created.
pub const MATERIAL_COUNTER: WindowCounter = WindowCounter {
    record: RecordKind::StudyMaterial,
    window: UsageWindow::AllTime,
    limit: QuotaDefinition::MATERIALS,
    noun: "study materials",
};

/// Quizzes completed this calendar month.
pub const QUIZ_COUNTER: WindowCounter = WindowCounter {
    record: RecordKind::QuizResult,
    window: UsageWindow::CalendarMonth,
    limit: QuotaDefinition::QUIZZES_PER_MONTH,
    noun: "quizzes per month",
};

/// AI writings submitted today.
pub const WRITING_COUNTER: WindowCounter = WindowCounter {
    record: RecordKind::AiWriting,
    window: UsageWindow::CalendarDay,
    limit: QuotaDefinition::AI_WRITINGS_PER_DAY,
    noun: "AI writing submissions per day",
};

impl WindowCounter {
    /// Count request for `user_id` in the window containing `now`.
    pub fn query(&self, user_id: &str, now: DateTime<Utc>, calendar: Calendar) -> CountQuery {
        CountQuery::new(self.record, user_id, self.window.start(now, calendar))
    }

    /// Compare an existing record count against the limit.
    ///
    /// Reaching the limit exactly denies the next action.
    pub fn decide(&self, count: u64) -> Decision {
        if count >= self.limit {
            Decision::limit_reached(count, self.limit, self.reason(), UPGRADE_MESSAGE)
        } else {
            Decision::within_limit(count, self.limit)
        }
    }

    pub fn reason(&self) -> String {
        format!("Free plan limit reached: {} {}", self.limit, self.noun)
    }

    /// Count the user's records and decide.
    pub async fn check(
        &self,
        store: &dyn RecordStore,
        user_id: &str,
        now: DateTime<Utc>,
        calendar: Calendar,
    ) -> Result<Decision, StoreError> {
        let query = self.query(user_id, now, calendar);
        let count = store.count(&query).await?;
        debug!(
            collection = self.record.collection(),
            window = self.window.as_str(),
            count,
            limit = self.limit,
            "Window count"
        );
        Ok(self.decide(count))
    }
}
