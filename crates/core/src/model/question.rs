use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id}: sentence cannot be empty")]
    EmptySentence { id: QuestionId },

    #[error("question {id}: sentence has no blank marker `___`")]
    MissingBlank { id: QuestionId },

    #[error("question {id}: correct answer cannot be empty")]
    EmptyAnswer { id: QuestionId },
}

//
// ─── ANSWERS ──────────────────────────────────────────────────────────────────
//

/// Marker that stands in for the missing article inside a sentence.
pub const BLANK_MARKER: &str = "___";

/// Option offered for the indefinite article; matches both `a` and `an`.
pub const INDEFINITE: &str = "a/an";
pub const DEFINITE: &str = "the";
pub const NO_ARTICLE: &str = "nothing";

/// Options offered to the player, in display order.
pub const ARTICLE_OPTIONS: [&str; 3] = [INDEFINITE, DEFINITE, NO_ARTICLE];

/// Recorded in place of a real answer when a question is skipped.
pub const SKIP_MARKER: &str = "__skip__";

/// Content difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// Returns true when `answer` is an accepted answer for `question`.
///
/// Content stores the indefinite article either as the sentinel `a/an` or as
/// the concrete `a`/`an`; the player only ever picks `a/an`.
#[must_use]
pub fn is_answer_correct(question: &Question, answer: &str) -> bool {
    if answer.is_empty() {
        return false;
    }
    if answer == INDEFINITE {
        return matches!(question.correct_answer(), INDEFINITE | "a" | "an");
    }
    answer == question.correct_answer()
}

/// Text shown to the player for a stored answer value.
#[must_use]
pub fn display_text_for(answer: &str) -> String {
    match answer {
        NO_ARTICLE => "NO ARTICLE".to_owned(),
        "a" | "an" | INDEFINITE => "A / AN".to_owned(),
        DEFINITE => "THE".to_owned(),
        other => other.to_uppercase(),
    }
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// Unvalidated question as it appears in content files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub sentence: String,
    pub correct_answer: String,
    #[serde(default)]
    pub rule_id: u32,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

impl QuestionDraft {
    /// Validate the draft into an immutable question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the sentence is empty or has no blank, or if
    /// the correct answer is empty.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let sentence = self.sentence.trim().to_owned();
        if sentence.is_empty() {
            return Err(QuestionError::EmptySentence { id: self.id });
        }
        if !sentence.contains(BLANK_MARKER) {
            return Err(QuestionError::MissingBlank { id: self.id });
        }
        let correct_answer = self.correct_answer.trim().to_owned();
        if correct_answer.is_empty() {
            return Err(QuestionError::EmptyAnswer { id: self.id });
        }

        Ok(Question {
            id: self.id,
            sentence,
            correct_answer,
            rule_id: self.rule_id,
            explanation: self.explanation,
            difficulty: self.difficulty,
        })
    }
}

/// One fill-in-the-blank article question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    id: QuestionId,
    sentence: String,
    correct_answer: String,
    rule_id: u32,
    explanation: String,
    difficulty: Option<Difficulty>,
}

impl Question {
    /// Convenience constructor for a question without rule metadata.
    ///
    /// # Errors
    ///
    /// Same as [`QuestionDraft::validate`].
    pub fn new(
        id: QuestionId,
        sentence: impl Into<String>,
        correct_answer: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        QuestionDraft {
            id,
            sentence: sentence.into(),
            correct_answer: correct_answer.into(),
            rule_id: 0,
            explanation: String::new(),
            difficulty: None,
        }
        .validate()
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn sentence(&self) -> &str {
        &self.sentence
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn rule_id(&self) -> u32 {
        self.rule_id
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    /// Sentence split around the blank marker, for renderers.
    #[must_use]
    pub fn sentence_parts(&self) -> Vec<&str> {
        self.sentence.split(BLANK_MARKER).collect()
    }

    /// True if the stored answer is an indefinite article in any spelling.
    #[must_use]
    pub fn is_indefinite(&self) -> bool {
        matches!(self.correct_answer.as_str(), INDEFINITE | "a" | "an")
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
