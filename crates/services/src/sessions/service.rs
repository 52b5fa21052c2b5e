use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use grammar_core::content::QuestionBank;
use grammar_core::model::question::ARTICLE_OPTIONS;
use grammar_core::model::{
    AnswerOutcome, AnswerSnapshot, CurrentQuestionState, ErrorState, GameConfig, GameMode,
    ProgressState, Question, QuestionId, SnapshotKey,
};
use grammar_core::progression::{self, Transition};

use super::plan::ShuffleSource;
use super::progress::{CompletionStats, GameProgress};
use crate::error::SessionError;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One game over a question bank.
///
/// Owns the progress, current-question and ledger state and applies the
/// progression rules to them. Nothing here touches storage; see
/// `GameLoopService` for the persisted flow.
pub struct GameSession {
    bank: Arc<QuestionBank>,
    config: GameConfig,
    progress: ProgressState,
    current: CurrentQuestionState,
    errors: ErrorState,
}

impl GameSession {
    /// Start a fresh game with the bank shuffled by `shuffle`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the bank has no questions.
    pub fn start(
        bank: Arc<QuestionBank>,
        config: GameConfig,
        shuffle: ShuffleSource,
    ) -> Result<Self, SessionError> {
        if bank.is_empty() {
            return Err(SessionError::Empty);
        }
        let progress = ProgressState::new(shuffle.question_order(&bank));
        Ok(Self {
            current: CurrentQuestionState::new(config.max_attempts()),
            errors: ErrorState::new(),
            bank,
            config,
            progress,
        })
    }

    /// Resume a game from stored records, repairing what can be repaired.
    ///
    /// The cursor is clamped, ledger entries for unknown questions are
    /// dropped, attempts recorded under a different attempt limit or for an
    /// unknown question are discarded, and a mode that no longer fits the
    /// ledger is corrected.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the bank has no questions, and
    /// `SessionError::StaleProgress` if the stored order is not a
    /// permutation of the bank's question ids.
    pub fn restore(
        bank: Arc<QuestionBank>,
        config: GameConfig,
        mut progress: ProgressState,
        current: Option<CurrentQuestionState>,
        mut errors: ErrorState,
    ) -> Result<Self, SessionError> {
        if bank.is_empty() {
            return Err(SessionError::Empty);
        }
        let known = bank.id_set();
        let stored: HashSet<QuestionId> = progress.shuffled_question_ids().iter().copied().collect();
        if stored.len() != progress.total() || stored != known {
            return Err(SessionError::StaleProgress);
        }

        if progress.clamp_cursor() {
            tracing::warn!(cursor = progress.cursor(), "clamped stored cursor");
        }
        let dropped = errors.retain_known(&known);
        if dropped > 0 {
            tracing::warn!(dropped, "dropped unknown ledger entries");
        }

        let current = match current {
            Some(state)
                if state.max_attempts() == config.max_attempts()
                    && state.question_id().is_none_or(|id| known.contains(&id)) =>
            {
                state
            }
            Some(_) => {
                tracing::warn!("discarded stale answer state");
                CurrentQuestionState::new(config.max_attempts())
            }
            None => CurrentQuestionState::new(config.max_attempts()),
        };

        if progression::normalize(&mut progress, &mut errors) {
            tracing::debug!(mode = %progress.mode(), "repaired stored mode");
        }

        Ok(Self {
            bank,
            config,
            progress,
            current,
            errors,
        })
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    #[must_use]
    pub fn current(&self) -> &CurrentQuestionState {
        &self.current
    }

    #[must_use]
    pub fn errors(&self) -> &ErrorState {
        &self.errors
    }

    #[must_use]
    pub fn mode(&self) -> GameMode {
        self.progress.mode()
    }

    /// The question to show, or `None` once the game is completed.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.is_completed() {
            return None;
        }
        self.active_question_id().and_then(|id| self.bank.get(id))
    }

    fn active_question_id(&self) -> Option<QuestionId> {
        progression::active_question_id(&self.progress, &self.current, &self.errors)
    }

    /// Options offered for every question.
    #[must_use]
    pub fn possible_answers(&self) -> [&'static str; 3] {
        ARTICLE_OPTIONS
    }

    #[must_use]
    pub fn progress_percentage(&self) -> f64 {
        self.progress.progress_percentage(self.errors.len())
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.progress.is_completed(self.errors.len())
    }

    /// Served questions that are not waiting for review.
    #[must_use]
    pub fn questions_completed(&self) -> usize {
        self.progress
            .cursor()
            .min(self.progress.total())
            .saturating_sub(self.errors.len())
    }

    #[must_use]
    pub fn completion_stats(&self) -> CompletionStats {
        CompletionStats {
            final_score: self.progress.score(),
            questions_completed: self.questions_completed(),
            errors_remaining: self.errors.len(),
        }
    }

    #[must_use]
    pub fn view(&self) -> GameProgress {
        GameProgress {
            cursor: self.progress.cursor(),
            total: self.progress.total(),
            completed: self.questions_completed(),
            percentage: self.progress_percentage(),
            mode: self.progress.mode(),
            errors_remaining: self.errors.len(),
            score: self.progress.score(),
            is_completed: self.is_completed(),
        }
    }

    /// Submit an answer for the current question.
    ///
    /// Returns `None` if there is no question to answer, the question is
    /// already completed, or `answer` was already tried.
    pub fn submit_answer(&mut self, answer: &str) -> Option<AnswerOutcome> {
        let bank = Arc::clone(&self.bank);
        let question = self.current_question_id().and_then(|id| bank.get(id))?;
        let outcome = self.current.submit(question, answer)?;
        progression::apply_answer(&mut self.progress, &mut self.errors, &outcome, &self.config);
        tracing::debug!(
            question = %outcome.question_id,
            correct = outcome.is_correct,
            attempt = outcome.attempt,
            points = outcome.points,
            "answer recorded"
        );
        Some(outcome)
    }

    fn current_question_id(&self) -> Option<QuestionId> {
        self.current_question().map(Question::id)
    }

    /// Move past the current question once it is completed.
    pub fn advance_to_next(&mut self) -> Transition {
        let transition =
            progression::advance(&mut self.progress, &self.current, &mut self.errors, &self.config);
        if transition.is_moved() {
            self.current.reset();
        }
        match transition {
            Transition::Moved { from, to } if from != to => {
                tracing::debug!(%from, %to, cursor = self.progress.cursor(), "mode switched");
            }
            Transition::Finished => {
                tracing::debug!(score = self.progress.score(), "game finished");
            }
            _ => {}
        }
        transition
    }

    /// Give up on the current question: it counts as a miss and play moves on.
    ///
    /// Returns `None` if there was nothing to skip.
    pub fn skip_current(&mut self) -> Option<Transition> {
        let bank = Arc::clone(&self.bank);
        let question = self.current_question_id().and_then(|id| bank.get(id))?;
        if !self.current.skip(question) {
            return None;
        }
        self.errors.record(question.id());
        tracing::debug!(question = %question.id(), "question skipped");
        Some(self.advance_to_next())
    }

    /// Throw away all progress and start over with a new order.
    pub fn reset(&mut self, shuffle: ShuffleSource) {
        self.progress = ProgressState::new(shuffle.question_order(&self.bank));
        self.current = CurrentQuestionState::new(self.config.max_attempts());
        self.errors = ErrorState::new();
    }

    /// Key of the snapshot for the current question in the current mode.
    #[must_use]
    pub fn snapshot_key(&self) -> Option<SnapshotKey> {
        self.current
            .question_id()
            .or_else(|| self.current_question_id())
            .map(|id| SnapshotKey::new(self.progress.mode(), id))
    }

    /// Capture the attempts on the current question, if any were made.
    #[must_use]
    pub fn answer_snapshot(&self, timestamp: i64) -> Option<(SnapshotKey, AnswerSnapshot)> {
        if self.current.attempts() == 0 {
            return None;
        }
        let key = self.snapshot_key()?;
        Some((key, AnswerSnapshot::capture(&self.current, timestamp)))
    }
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("questions", &self.bank.len())
            .field("cursor", &self.progress.cursor())
            .field("mode", &self.progress.mode())
            .field("errors_len", &self.errors.len())
            .field("score", &self.progress.score())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
