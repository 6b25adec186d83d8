//! Free-tier quota definition.
//!
//! Limits are fixed at build time and apply only to the free plan.

use crate::action::ActionKind;

/// Static free-tier quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaDefinition;

impl QuotaDefinition {
    /// Maximum study materials a free user may own (all time).
    pub const MATERIALS: u64 = 3;

    /// Maximum quizzes a free user may take per calendar month.
    pub const QUIZZES_PER_MONTH: u64 = 5;

    /// Maximum AI writing submissions per calendar day.
    pub const AI_WRITINGS_PER_DAY: u64 = 1;

    /// Maximum generated questions per study material.
    ///
    /// Not gated by the evaluator; callers that generate questions apply it.
    pub const QUESTIONS_PER_MATERIAL: u64 = 5;

    /// Limit attached to an action kind, if one is defined.
    pub fn limit_for(action: ActionKind) -> Option<u64> {
        match action {
            ActionKind::UploadMaterial => Some(Self::MATERIALS),
            ActionKind::TakeQuiz => Some(Self::QUIZZES_PER_MONTH),
            ActionKind::AiWriting => Some(Self::AI_WRITINGS_PER_DAY),
            ActionKind::GenerateQuestions => Some(Self::QUESTIONS_PER_MATERIAL),
            ActionKind::Other => None,
        }
    }
}
