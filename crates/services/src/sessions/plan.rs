use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{SeedableRng, rng};

use grammar_core::content::QuestionBank;
use grammar_core::model::QuestionId;

/// Where question order comes from.
///
/// `Seeded` gives a reproducible order for tests and replays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShuffleSource {
    #[default]
    Random,
    Seeded(u64),
}

impl ShuffleSource {
    /// Shuffle `items` in place.
    pub fn shuffle<T>(&self, items: &mut [T]) {
        match self {
            ShuffleSource::Random => items.shuffle(&mut rng()),
            ShuffleSource::Seeded(seed) => items.shuffle(&mut StdRng::seed_from_u64(*seed)),
        }
    }

    /// One pass over the bank: every question id exactly once.
    #[must_use]
    pub fn question_order(&self, bank: &QuestionBank) -> Vec<QuestionId> {
        let mut order = bank.ids();
        self.shuffle(&mut order);
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grammar_core::model::Question;
    use std::collections::HashSet;

    fn bank(n: u64) -> QuestionBank {
        let questions = (1..=n)
            .map(|id| Question::new(QuestionId::new(id), "___ cat.", "the").unwrap())
            .collect();
        QuestionBank::new(questions).unwrap()
    }

    #[test]
    fn order_is_a_permutation() {
        let bank = bank(20);
        let order = ShuffleSource::Random.question_order(&bank);
        assert_eq!(order.len(), 20);
        let unique: HashSet<_> = order.iter().copied().collect();
        assert_eq!(unique, bank.id_set());
    }

    #[test]
    fn seeded_order_is_reproducible() {
        let bank = bank(20);
        let first = ShuffleSource::Seeded(7).question_order(&bank);
        let second = ShuffleSource::Seeded(7).question_order(&bank);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_bank_gives_empty_order() {
        let bank = QuestionBank::default();
        assert!(ShuffleSource::Seeded(1).question_order(&bank).is_empty());
    }
}
