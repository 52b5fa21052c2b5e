use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::model::ids::QuestionId;

/// A question that was answered wrong and is waiting for review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEntry {
    #[serde(rename = "id")]
    pub question_id: QuestionId,
    #[serde(alias = "correctCount")]
    pub correct_streak: u32,
}

/// Review bookkeeping: which questions need repeating and how far along
/// each one is towards mastery.
///
/// Entries keep insertion order, which is also the review order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorState {
    #[serde(default)]
    error_cursor: usize,
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

impl ErrorState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn error_cursor(&self) -> usize {
        self.error_cursor
    }

    #[must_use]
    pub fn entries(&self) -> &[ErrorEntry] {
        &self.errors
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&ErrorEntry> {
        self.errors.iter().find(|e| e.question_id == id)
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.get(id).is_some()
    }

    /// Register a failure. A fresh failure erases prior progress toward mastery.
    pub fn record(&mut self, id: QuestionId) {
        match self.errors.iter_mut().find(|e| e.question_id == id) {
            Some(entry) => entry.correct_streak = 0,
            None => self.errors.push(ErrorEntry {
                question_id: id,
                correct_streak: 0,
            }),
        }
    }

    /// Register a correct review of `id`.
    ///
    /// Returns `true` if the entry reached `mastery_streak` and was removed.
    /// Unknown ids are ignored.
    pub fn register_success(&mut self, id: QuestionId, mastery_streak: u32) -> bool {
        let Some(index) = self.errors.iter().position(|e| e.question_id == id) else {
            return false;
        };
        let entry = &mut self.errors[index];
        entry.correct_streak = entry.correct_streak.saturating_add(1);
        if entry.correct_streak < mastery_streak {
            return false;
        }
        self.remove_at(index);
        true
    }

    /// Question under the review cursor, if any.
    #[must_use]
    pub fn current_question_id(&self) -> Option<QuestionId> {
        let index = if self.error_cursor < self.errors.len() {
            self.error_cursor
        } else {
            0
        };
        self.errors.get(index).map(|e| e.question_id)
    }

    /// Move the review cursor to the next entry, wrapping around.
    pub fn rotate(&mut self) {
        self.error_cursor = if self.errors.is_empty() {
            0
        } else {
            (self.error_cursor + 1) % self.errors.len()
        };
    }

    pub fn reset_cursor(&mut self) {
        self.error_cursor = 0;
    }

    /// Drop entries for questions that are not in `known`, then clamp the cursor.
    ///
    /// Duplicate entries for one id collapse into the first occurrence.
    /// Returns the number of entries removed.
    pub fn retain_known(&mut self, known: &HashSet<QuestionId>) -> usize {
        let before = self.errors.len();
        let mut seen = HashSet::with_capacity(before);
        self.errors
            .retain(|e| known.contains(&e.question_id) && seen.insert(e.question_id));
        self.clamp_cursor();
        before - self.errors.len()
    }

    fn remove_at(&mut self, index: usize) {
        self.errors.remove(index);
        // Keep the cursor just before the follower of the removed entry, so the
        // next rotation lands on it.
        if index <= self.error_cursor {
            self.error_cursor = match self.error_cursor.checked_sub(1) {
                Some(prev) => prev,
                None => self.errors.len().saturating_sub(1),
            };
        }
        self.clamp_cursor();
    }

    fn clamp_cursor(&mut self) {
        if self.error_cursor >= self.errors.len() {
            self.error_cursor = 0;
        }
    }
}
