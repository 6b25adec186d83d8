//! User actions consulted against the usage gate.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Action a user is about to take.
///
/// Unknown action names parse to [`ActionKind::Other`] rather than failing,
/// so callers can pass through whatever the client sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Create a new study material.
    UploadMaterial,
    /// Take a quiz.
    TakeQuiz,
    /// Submit an AI writing request.
    AiWriting,
    /// Generate questions for an existing material.
    GenerateQuestions,
    /// Anything else.
    Other,
}

impl ActionKind {
    /// Parse from string. Never fails.
    pub fn from_str(s: &str) -> Self {
        match s.trim() {
            "upload_material" => ActionKind::UploadMaterial,
            "take_quiz" => ActionKind::TakeQuiz,
            "ai_writing" => ActionKind::AiWriting,
            "generate_questions" => ActionKind::GenerateQuestions,
            _ => ActionKind::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::UploadMaterial => "upload_material",
            ActionKind::TakeQuiz => "take_quiz",
            ActionKind::AiWriting => "ai_writing",
            ActionKind::GenerateQuestions => "generate_questions",
            ActionKind::Other => "other",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ActionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActionKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ActionKind::from_str(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_actions_round_trip_through_str() {
        for action in [
            ActionKind::UploadMaterial,
            ActionKind::TakeQuiz,
            ActionKind::AiWriting,
            ActionKind::GenerateQuestions,
            ActionKind::Other,
        ] {
            assert_eq!(ActionKind::from_str(action.as_str()), action);
        }
    }

    #[test]
    fn test_unknown_action_is_other() {
        assert_eq!(ActionKind::from_str("export_pdf"), ActionKind::Other);
        assert_eq!(ActionKind::from_str(""), ActionKind::Other);
        // Matching is exact, not case-insensitive
        assert_eq!(ActionKind::from_str("TAKE_QUIZ"), ActionKind::Other);
    }

    #[test]
    fn test_deserialize_unknown_does_not_fail() {
        let action: ActionKind = serde_json::from_str("\"share_deck\"").unwrap();
        assert_eq!(action, ActionKind::Other);

        let action: ActionKind = serde_json::from_str("\"ai_writing\"").unwrap();
        assert_eq!(action, ActionKind::AiWriting);
    }
}
