//! Usage record collections.
//!
//! Records are written by the rest of the application; the gate only counts them.

use serde::{Deserialize, Serialize};

/// Kind of usage record counted by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    StudyMaterial,
    QuizResult,
    AiWriting,
}

impl RecordKind {
    /// Firestore collection holding this record kind.
    pub fn collection(&self) -> &'static str {
        match self {
            RecordKind::StudyMaterial => "studyMaterials",
            RecordKind::QuizResult => "quizResults",
            RecordKind::AiWriting => "aiWritings",
        }
    }

    /// Field holding the owning user's id.
    pub fn user_field(&self) -> &'static str {
        "userId"
    }

    /// Timestamp field used for windowed counts.
    pub fn timestamp_field(&self) -> &'static str {
        match self {
            RecordKind::StudyMaterial => "createdAt",
            RecordKind::QuizResult => "completedAt",
            RecordKind::AiWriting => "createdAt",
        }
    }
}
