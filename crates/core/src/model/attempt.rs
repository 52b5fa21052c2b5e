use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;
use crate::model::question::{Question, SKIP_MARKER, is_answer_correct};

/// Points for a correct answer on the first attempt.
pub const FIRST_TRY_POINTS: u32 = 10;
/// Points for a correct answer after at least one miss.
pub const RETRY_POINTS: u32 = 5;

/// Result of one accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub question_id: QuestionId,
    pub is_correct: bool,
    pub is_completed: bool,
    /// 1-based number of this attempt.
    pub attempt: u32,
    pub points: u32,
}

impl AnswerOutcome {
    /// The question just completed without a correct answer.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.is_completed && !self.is_correct
    }
}

/// Attempts made on the active question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentQuestionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    question_id: Option<QuestionId>,
    #[serde(default)]
    selected_answers: Vec<String>,
    #[serde(default)]
    is_completed: bool,
    #[serde(default)]
    is_correct: bool,
    max_attempts: u32,
}

impl CurrentQuestionState {
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            question_id: None,
            selected_answers: Vec::new(),
            is_completed: false,
            is_correct: false,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Question the attempts belong to, once one has been submitted.
    #[must_use]
    pub fn question_id(&self) -> Option<QuestionId> {
        self.question_id
    }

    #[must_use]
    pub fn selected_answers(&self) -> &[String] {
        &self.selected_answers
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        u32::try_from(self.selected_answers.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn remaining_attempts(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempts())
    }

    /// Options tried and rejected for this question.
    #[must_use]
    pub fn failed_options(&self) -> Vec<&str> {
        let correct_tail = usize::from(self.is_correct);
        let failed = self.selected_answers.len().saturating_sub(correct_tail);
        self.selected_answers[..failed]
            .iter()
            .map(String::as_str)
            .collect()
    }

    #[must_use]
    pub fn last_answer(&self) -> Option<&str> {
        self.selected_answers.last().map(String::as_str)
    }

    /// Submit `answer` for `question`.
    ///
    /// Returns `None` without touching state if the question is already
    /// completed, if `answer` was already tried, or if attempts belong to a
    /// different question.
    pub fn submit(&mut self, question: &Question, answer: &str) -> Option<AnswerOutcome> {
        if self.is_completed {
            return None;
        }
        if self.question_id.is_some_and(|id| id != question.id()) {
            return None;
        }
        if self.selected_answers.iter().any(|a| a == answer) {
            return None;
        }

        self.question_id = Some(question.id());
        self.selected_answers.push(answer.to_owned());
        let attempt = self.attempts();
        let is_correct = is_answer_correct(question, answer);
        self.is_correct = is_correct;
        self.is_completed = is_correct || attempt >= self.max_attempts;

        let points = match (is_correct, attempt) {
            (false, _) => 0,
            (true, 1) => FIRST_TRY_POINTS,
            (true, _) => RETRY_POINTS,
        };

        Some(AnswerOutcome {
            question_id: question.id(),
            is_correct,
            is_completed: self.is_completed,
            attempt,
            points,
        })
    }

    /// Give up on the active question: completes it as incorrect.
    ///
    /// Returns `false` if the question was already completed.
    pub fn skip(&mut self, question: &Question) -> bool {
        if self.is_completed {
            return false;
        }
        if self.question_id.is_some_and(|id| id != question.id()) {
            return false;
        }
        self.question_id = Some(question.id());
        self.selected_answers.push(SKIP_MARKER.to_owned());
        self.is_correct = false;
        self.is_completed = true;
        true
    }

    /// Clear attempts for the next question.
    pub fn reset(&mut self) {
        *self = Self::new(self.max_attempts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> Question {
        Question::new(QuestionId::new(2), "___ sun is bright.", "the").unwrap()
    }

    #[test]
    fn first_try_correct_scores_ten() {
        let mut state = CurrentQuestionState::new(2);
        let outcome = state.submit(&question(), "the").unwrap();
        assert!(outcome.is_correct);
        assert!(outcome.is_completed);
        assert_eq!(outcome.points, 10);
        assert_eq!(outcome.attempt, 1);
    }

    #[test]
    fn second_try_correct_scores_five() {
        let mut state = CurrentQuestionState::new(2);
        let miss = state.submit(&question(), "nothing").unwrap();
        assert!(!miss.is_completed);
        assert_eq!(miss.points, 0);

        let hit = state.submit(&question(), "the").unwrap();
        assert!(hit.is_correct);
        assert_eq!(hit.points, 5);
        assert_eq!(state.failed_options(), vec!["nothing"]);
    }

    #[test]
    fn exhausting_attempts_completes_incorrect() {
        let mut state = CurrentQuestionState::new(2);
        state.submit(&question(), "nothing").unwrap();
        let outcome = state.submit(&question(), "a/an").unwrap();
        assert!(outcome.is_failure());
        assert!(state.is_completed());
        assert!(!state.is_correct());
        assert_eq!(state.remaining_attempts(), 0);
    }

    #[test]
    fn completed_question_ignores_more_answers() {
        let mut state = CurrentQuestionState::new(2);
        state.submit(&question(), "the").unwrap();
        let before = state.clone();
        assert!(state.submit(&question(), "nothing").is_none());
        assert!(state.submit(&question(), "the").is_none());
        assert_eq!(state, before);
    }

    #[test]
    fn repeating_a_failed_option_is_ignored() {
        let mut state = CurrentQuestionState::new(3);
        state.submit(&question(), "nothing").unwrap();
        assert!(state.submit(&question(), "nothing").is_none());
        assert_eq!(state.attempts(), 1);
    }

    #[test]
    fn skip_completes_as_incorrect_once() {
        let mut state = CurrentQuestionState::new(2);
        assert!(state.skip(&question()));
        assert!(state.is_completed());
        assert!(!state.is_correct());
        assert_eq!(state.last_answer(), Some(SKIP_MARKER));
        assert!(!state.skip(&question()));
    }

    #[test]
    fn reset_keeps_max_attempts() {
        let mut state = CurrentQuestionState::new(4);
        state.submit(&question(), "the").unwrap();
        state.reset();
        assert_eq!(state, CurrentQuestionState::new(4));
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let state = CurrentQuestionState::new(2);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "selectedAnswers": [],
                "isCompleted": false,
                "isCorrect": false,
                "maxAttempts": 2
            })
        );
    }
}
