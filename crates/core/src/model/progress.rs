use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::QuestionId;

/// Which pool the active question is drawn from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Fresh questions in shuffled order.
    #[default]
    Regular,
    /// A short review round interleaved with regular play.
    Error,
    /// Regular questions are exhausted; only reviews remain.
    ErrorOnly,
}

impl GameMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GameMode::Regular => "regular",
            GameMode::Error => "error",
            GameMode::ErrorOnly => "error_only",
        }
    }

    /// True for both review modes.
    #[must_use]
    pub fn is_review(self) -> bool {
        matches!(self, GameMode::Error | GameMode::ErrorOnly)
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "regular" => Some(GameMode::Regular),
            "error" => Some(GameMode::Error),
            "error_only" => Some(GameMode::ErrorOnly),
            _ => None,
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall position in the game: question order, cursor and mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    #[serde(alias = "shuffledQuestions")]
    shuffled_question_ids: Vec<QuestionId>,
    #[serde(default)]
    cursor: usize,
    #[serde(default)]
    mode: GameMode,
    #[serde(default)]
    regular_question_counter: u32,
    #[serde(default)]
    error_questions_shown: u32,
    #[serde(default)]
    score: u32,
}

impl ProgressState {
    /// Start a pass over `order`, which should be a permutation of all
    /// question ids.
    #[must_use]
    pub fn new(order: Vec<QuestionId>) -> Self {
        Self {
            shuffled_question_ids: order,
            cursor: 0,
            mode: GameMode::Regular,
            regular_question_counter: 0,
            error_questions_shown: 0,
            score: 0,
        }
    }

    #[must_use]
    pub fn shuffled_question_ids(&self) -> &[QuestionId] {
        &self.shuffled_question_ids
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    #[must_use]
    pub fn regular_question_counter(&self) -> u32 {
        self.regular_question_counter
    }

    #[must_use]
    pub fn error_questions_shown(&self) -> u32 {
        self.error_questions_shown
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.shuffled_question_ids.len()
    }

    /// True once every regular question has been served.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.shuffled_question_ids.len()
    }

    /// Regular question under the cursor.
    #[must_use]
    pub fn current_question_id(&self) -> Option<QuestionId> {
        self.shuffled_question_ids.get(self.cursor).copied()
    }

    /// Share of the game done, in percent, clamped to `0..=100`.
    ///
    /// Outstanding mistakes count against progress until they are mastered.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_percentage(&self, outstanding_errors: usize) -> f64 {
        let total = self.shuffled_question_ids.len();
        if total == 0 {
            return 0.0;
        }
        let done = self.cursor.min(total).saturating_sub(outstanding_errors);
        (done as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
    }

    /// The whole game is finished: every question served, no mistakes left.
    #[must_use]
    pub fn is_completed(&self, outstanding_errors: usize) -> bool {
        !self.shuffled_question_ids.is_empty() && self.is_exhausted() && outstanding_errors == 0
    }

    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    /// Clamp a cursor restored from storage back into range.
    ///
    /// Returns true if it had to be changed.
    pub fn clamp_cursor(&mut self) -> bool {
        let total = self.shuffled_question_ids.len();
        if self.cursor > total {
            self.cursor = total;
            return true;
        }
        false
    }

    pub(crate) fn step_cursor(&mut self) {
        self.cursor = (self.cursor + 1).min(self.shuffled_question_ids.len());
    }

    pub(crate) fn bump_regular_counter(&mut self) -> u32 {
        self.regular_question_counter = self.regular_question_counter.saturating_add(1);
        self.regular_question_counter
    }

    pub(crate) fn bump_error_questions_shown(&mut self) -> u32 {
        self.error_questions_shown = self.error_questions_shown.saturating_add(1);
        self.error_questions_shown
    }

    pub(crate) fn set_mode(&mut self, mode: GameMode) {
        self.mode = mode;
        self.error_questions_shown = 0;
    }
}
