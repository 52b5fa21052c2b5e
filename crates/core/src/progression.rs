//! Quiz progression state machine.
//!
//! Pure functions over the three state blocks. Callers own the state and
//! decide when to persist it.

use crate::model::{
    AnswerOutcome, CurrentQuestionState, ErrorState, GameConfig, GameMode, ProgressState,
    QuestionId,
};

/// What `advance` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The active question is not finished; nothing moved.
    Unchanged,
    /// Moved on to the next question, possibly switching mode.
    Moved { from: GameMode, to: GameMode },
    /// The finished question was the last one; no question is served anymore.
    Finished,
}

impl Transition {
    /// The active question changed, so its attempts must be cleared.
    #[must_use]
    pub fn is_moved(self) -> bool {
        !matches!(self, Transition::Unchanged)
    }

    #[must_use]
    pub fn switched_mode(self) -> bool {
        matches!(self, Transition::Moved { from, to } if from != to)
    }
}

/// Question the player should be looking at.
///
/// Attempts pin their question, so the answered question stays put until
/// `advance` even if the ledger changed underneath it.
#[must_use]
pub fn active_question_id(
    progress: &ProgressState,
    current: &CurrentQuestionState,
    errors: &ErrorState,
) -> Option<QuestionId> {
    if let Some(id) = current.question_id() {
        return Some(id);
    }
    match progress.mode() {
        GameMode::Regular => progress.current_question_id(),
        GameMode::Error | GameMode::ErrorOnly => errors.current_question_id(),
    }
}

/// Fold an accepted answer into progress and ledger.
///
/// Awards the points, registers a failed question in the ledger, and counts
/// a correct review towards mastery.
pub fn apply_answer(
    progress: &mut ProgressState,
    errors: &mut ErrorState,
    outcome: &AnswerOutcome,
    config: &GameConfig,
) {
    progress.add_score(outcome.points);
    if outcome.is_failure() {
        errors.record(outcome.question_id);
    } else if outcome.is_correct && progress.mode().is_review() {
        errors.register_success(outcome.question_id, config.mastery_streak());
    }
}

/// Move past a completed question.
///
/// Regular mode: count the question. Every `error_mode_trigger` questions,
/// while mistakes are pending, start a review round without moving the
/// cursor. Otherwise step the cursor and switch to review-only once the
/// sequence is exhausted.
///
/// Error mode: count the review; after `error_mode_questions` reviews, or
/// once the ledger is empty, go back to regular play (or review-only if the
/// sequence is exhausted). Otherwise rotate to the next mistake.
///
/// Error-only mode: rotate through the ledger until it is empty.
pub fn advance(
    progress: &mut ProgressState,
    current: &CurrentQuestionState,
    errors: &mut ErrorState,
    config: &GameConfig,
) -> Transition {
    if !current.is_completed() {
        return Transition::Unchanged;
    }
    if progress.is_completed(errors.len()) {
        return Transition::Finished;
    }

    let from = progress.mode();
    match from {
        GameMode::Regular => {
            let counter = progress.bump_regular_counter();
            if counter % config.error_mode_trigger() == 0 && !errors.is_empty() {
                // The cursor stays put; this question is served again after the round.
                progress.set_mode(GameMode::Error);
                errors.reset_cursor();
            } else {
                progress.step_cursor();
                if progress.is_exhausted() && !errors.is_empty() {
                    progress.set_mode(GameMode::ErrorOnly);
                    errors.reset_cursor();
                }
            }
        }
        GameMode::Error => {
            let shown = progress.bump_error_questions_shown();
            if shown >= config.error_mode_questions() || errors.is_empty() {
                let next = if progress.is_exhausted() {
                    GameMode::ErrorOnly
                } else {
                    GameMode::Regular
                };
                progress.set_mode(next);
            } else {
                errors.rotate();
            }
        }
        GameMode::ErrorOnly => errors.rotate(),
    }

    if progress.is_completed(errors.len()) {
        return Transition::Finished;
    }
    Transition::Moved {
        from,
        to: progress.mode(),
    }
}

/// Repair a mode that no longer fits the ledger, e.g. after a restore.
///
/// Returns true if anything changed.
pub fn normalize(progress: &mut ProgressState, errors: &mut ErrorState) -> bool {
    let mode = progress.mode();
    let fixed = match mode {
        GameMode::Regular if progress.is_exhausted() && !errors.is_empty() => {
            Some(GameMode::ErrorOnly)
        }
        GameMode::Error if errors.is_empty() => {
            if progress.is_exhausted() {
                Some(GameMode::ErrorOnly)
            } else {
                Some(GameMode::Regular)
            }
        }
        GameMode::ErrorOnly if !progress.is_exhausted() => Some(GameMode::Regular),
        _ => None,
    };
    match fixed {
        Some(next) if next != mode => {
            progress.set_mode(next);
            errors.reset_cursor();
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Question;

    fn questions(n: u64) -> Vec<Question> {
        (1..=n)
            .map(|id| Question::new(QuestionId::new(id), "___ word.", "the").unwrap())
            .collect()
    }

    struct Game {
        questions: Vec<Question>,
        config: GameConfig,
        progress: ProgressState,
        current: CurrentQuestionState,
        errors: ErrorState,
    }

    impl Game {
        fn new(n: u64) -> Self {
            let questions = questions(n);
            let order = questions.iter().map(Question::id).collect();
            let config = GameConfig::article_defaults();
            Self {
                current: CurrentQuestionState::new(config.max_attempts()),
                progress: ProgressState::new(order),
                errors: ErrorState::new(),
                questions,
                config,
            }
        }

        fn active(&self) -> &Question {
            let id = active_question_id(&self.progress, &self.current, &self.errors).unwrap();
            self.questions.iter().find(|q| q.id() == id).unwrap()
        }

        fn answer(&mut self, answer: &str) {
            let question = self.active().clone();
            let outcome = self.current.submit(&question, answer).unwrap();
            apply_answer(&mut self.progress, &mut self.errors, &outcome, &self.config);
        }

        fn next(&mut self) -> Transition {
            let t = advance(&mut self.progress, &self.current, &mut self.errors, &self.config);
            if t.is_moved() {
                self.current.reset();
            }
            t
        }

        fn pass(&mut self) {
            self.answer("the");
            self.next();
        }

        fn fail(&mut self) {
            self.answer("a/an");
            self.answer("nothing");
            self.next();
        }
    }

    #[test]
    fn advance_before_completion_changes_nothing() {
        let mut game = Game::new(3);
        game.answer("nothing");
        let before = game.progress.clone();
        assert_eq!(game.next(), Transition::Unchanged);
        assert_eq!(game.progress, before);
        assert_eq!(game.progress.cursor(), 0);
    }

    #[test]
    fn failure_lands_in_ledger_and_cursor_moves_on() {
        let mut game = Game::new(3);
        game.fail();
        assert_eq!(game.errors.len(), 1);
        assert_eq!(game.errors.entries()[0].correct_streak, 0);
        assert_eq!(game.progress.cursor(), 1);
        assert_eq!(game.progress.mode(), GameMode::Regular);
        assert_eq!(game.progress.score(), 0);
    }

    #[test]
    fn fifth_regular_question_starts_review_round() {
        let mut game = Game::new(8);
        game.fail();
        for _ in 0..3 {
            game.pass();
        }
        assert_eq!(game.progress.mode(), GameMode::Regular);

        let t = game.next_after_pass();
        assert_eq!(
            t,
            Transition::Moved {
                from: GameMode::Regular,
                to: GameMode::Error
            }
        );
        assert_eq!(game.progress.regular_question_counter(), 5);
        assert_eq!(game.progress.cursor(), 4);
        assert_eq!(game.errors.error_cursor(), 0);
        assert_eq!(game.active().id(), QuestionId::new(1));
    }

    #[test]
    fn question_that_triggered_review_is_served_again_afterwards() {
        let mut game = Game::new(8);
        game.fail();
        for _ in 0..4 {
            game.pass();
        }
        assert_eq!(game.progress.mode(), GameMode::Error);

        game.pass();
        game.pass();
        assert_eq!(game.progress.mode(), GameMode::Regular);
        assert_eq!(game.progress.cursor(), 4);
        assert_eq!(game.active().id(), QuestionId::new(5));

        game.pass();
        assert_eq!(game.progress.cursor(), 5);
        assert_eq!(game.progress.regular_question_counter(), 6);
    }

    impl Game {
        fn next_after_pass(&mut self) -> Transition {
            self.answer("the");
            self.next()
        }
    }

    #[test]
    fn review_round_returns_to_regular_after_configured_questions() {
        let mut game = Game::new(10);
        game.fail();
        game.fail();
        for _ in 0..3 {
            game.pass();
        }
        assert_eq!(game.progress.mode(), GameMode::Error);

        game.pass();
        assert_eq!(game.progress.mode(), GameMode::Error);
        assert_eq!(game.errors.error_cursor(), 1);
        game.pass();
        assert_eq!(game.progress.mode(), GameMode::Regular);
        assert_eq!(game.progress.error_questions_shown(), 0);
        assert_eq!(game.errors.len(), 2);
        assert!(game.errors.entries().iter().all(|e| e.correct_streak == 1));
    }

    #[test]
    fn exhausted_sequence_switches_to_error_only_and_finishes() {
        let mut game = Game::new(2);
        game.fail();
        game.pass();
        assert_eq!(game.progress.mode(), GameMode::ErrorOnly);
        assert!(!game.progress.is_completed(game.errors.len()));

        for _ in 0..3 {
            game.pass();
        }
        assert!(game.errors.is_empty());
        assert!(game.progress.is_completed(0));
        assert_eq!(
            active_question_id(&game.progress, &game.current, &game.errors),
            None
        );
    }

    #[test]
    fn failing_a_review_resets_its_streak() {
        let mut game = Game::new(1);
        game.fail();
        assert_eq!(game.progress.mode(), GameMode::ErrorOnly);
        game.pass();
        game.pass();
        assert_eq!(game.errors.entries()[0].correct_streak, 2);
        game.fail();
        assert_eq!(game.errors.entries()[0].correct_streak, 0);
        assert_eq!(game.progress.mode(), GameMode::ErrorOnly);
    }

    #[test]
    fn mastering_during_review_round_ends_it_early() {
        let mut game = Game::new(12);
        game.fail();
        for _ in 0..4 {
            game.pass();
        }
        // Review round one: a single mistake, shown once per round.
        assert_eq!(game.progress.mode(), GameMode::Error);
        game.pass();
        game.pass();
        assert_eq!(game.progress.mode(), GameMode::Regular);
        assert_eq!(game.errors.entries()[0].correct_streak, 2);

        for _ in 0..5 {
            game.pass();
        }
        assert_eq!(game.progress.regular_question_counter(), 10);
        assert_eq!(game.progress.mode(), GameMode::Error);
        game.pass();
        assert!(game.errors.is_empty());
        assert_eq!(game.progress.mode(), GameMode::Regular);
    }

    #[test]
    fn last_question_finishes_the_game() {
        let mut game = Game::new(1);
        game.answer("the");
        assert_eq!(game.next(), Transition::Finished);
        assert!(game.progress.is_completed(0));
        assert_eq!(game.progress.cursor(), 1);

        let question = game.questions[0].clone();
        game.current.skip(&question);
        let before = game.progress.clone();
        assert_eq!(game.next(), Transition::Finished);
        assert_eq!(game.progress, before);
    }

    #[test]
    fn normalize_repairs_restored_modes() {
        let mut progress = ProgressState::new(vec![QuestionId::new(1)]);
        let mut errors = ErrorState::new();
        errors.record(QuestionId::new(1));
        progress.step_cursor();
        assert!(normalize(&mut progress, &mut errors));
        assert_eq!(progress.mode(), GameMode::ErrorOnly);

        let mut progress = ProgressState::new(vec![QuestionId::new(1), QuestionId::new(2)]);
        progress.set_mode(GameMode::Error);
        let mut empty = ErrorState::new();
        assert!(normalize(&mut progress, &mut empty));
        assert_eq!(progress.mode(), GameMode::Regular);
        assert!(!normalize(&mut progress, &mut empty));
    }

    #[test]
    fn normalize_keeps_review_round_at_end_of_sequence() {
        let mut progress = ProgressState::new(vec![QuestionId::new(1), QuestionId::new(2)]);
        progress.step_cursor();
        progress.step_cursor();
        progress.set_mode(GameMode::Error);
        progress.bump_error_questions_shown();
        let mut errors = ErrorState::new();
        errors.record(QuestionId::new(1));
        errors.record(QuestionId::new(2));
        errors.rotate();

        assert!(!normalize(&mut progress, &mut errors));
        assert_eq!(progress.mode(), GameMode::Error);
        assert_eq!(progress.error_questions_shown(), 1);
        assert_eq!(errors.error_cursor(), 1);
    }
}
