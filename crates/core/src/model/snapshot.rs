use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::attempt::CurrentQuestionState;
use crate::model::ids::QuestionId;
use crate::model::progress::GameMode;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid snapshot key: {raw}")]
pub struct SnapshotKeyError {
    raw: String,
}

/// Identifies one answer snapshot: `<mode>_<questionId>`.
///
/// The same question can hold one snapshot per mode, so a review round does
/// not overwrite what the player saw during regular play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    pub mode: GameMode,
    pub question_id: QuestionId,
}

impl SnapshotKey {
    #[must_use]
    pub fn new(mode: GameMode, question_id: QuestionId) -> Self {
        Self { mode, question_id }
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.mode, self.question_id)
    }
}

impl FromStr for SnapshotKey {
    type Err = SnapshotKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || SnapshotKeyError { raw: s.to_owned() };
        // Mode names contain underscores themselves; the id is after the last one.
        let (mode, id) = s.rsplit_once('_').ok_or_else(err)?;
        let mode = GameMode::parse(mode).ok_or_else(err)?;
        let question_id = id.parse::<QuestionId>().map_err(|_| err())?;
        Ok(Self { mode, question_id })
    }
}

/// What the player had done on a question, so a reload can show it again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSnapshot {
    pub selected_answer: Option<String>,
    pub attempts: u32,
    pub is_correct: bool,
    pub show_result: bool,
    #[serde(default)]
    pub failed_options: Vec<String>,
    /// Unix time in milliseconds.
    pub timestamp: i64,
}

impl AnswerSnapshot {
    #[must_use]
    pub fn capture(current: &CurrentQuestionState, timestamp: i64) -> Self {
        Self {
            selected_answer: current.last_answer().map(str::to_owned),
            attempts: current.attempts(),
            is_correct: current.is_correct(),
            show_result: current.is_completed(),
            failed_options: current
                .failed_options()
                .into_iter()
                .map(str::to_owned)
                .collect(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::Question;

    #[test]
    fn key_formats_and_parses() {
        let key = SnapshotKey::new(GameMode::ErrorOnly, QuestionId::new(12));
        assert_eq!(key.to_string(), "error_only_12");
        assert_eq!("error_only_12".parse::<SnapshotKey>().unwrap(), key);
        assert_eq!(
            "regular_3".parse::<SnapshotKey>().unwrap(),
            SnapshotKey::new(GameMode::Regular, QuestionId::new(3))
        );
    }

    #[test]
    fn malformed_keys_are_rejected() {
        for raw in ["", "regular", "regular_", "bogus_1", "error_x", "state"] {
            assert!(raw.parse::<SnapshotKey>().is_err(), "{raw} should not parse");
        }
    }

    #[test]
    fn capture_reflects_attempts() {
        let question = Question::new(QuestionId::new(1), "I need ___ apple.", "a/an").unwrap();
        let mut current = CurrentQuestionState::new(2);
        current.submit(&question, "the").unwrap();
        current.submit(&question, "a/an").unwrap();

        let snapshot = AnswerSnapshot::capture(&current, 1_700_000_000_000);
        assert_eq!(snapshot.selected_answer.as_deref(), Some("a/an"));
        assert_eq!(snapshot.attempts, 2);
        assert!(snapshot.is_correct);
        assert!(snapshot.show_result);
        assert_eq!(snapshot.failed_options, vec!["the".to_owned()]);
    }
}
