//! Static question content and queries over it.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

use crate::model::question::{DEFINITE, NO_ARTICLE};
use crate::model::{Difficulty, Question, QuestionDraft, QuestionError, QuestionId};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentError {
    #[error("content is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Question(#[from] QuestionError),

    #[error("duplicate question id {0}")]
    DuplicateId(QuestionId),
}

/// Content files either wrap the list as `{"gameSentences": [...]}` or are a
/// bare list.
#[derive(Deserialize)]
#[serde(untagged)]
enum ContentFile {
    Wrapped {
        #[serde(rename = "gameSentences")]
        game_sentences: Vec<QuestionDraft>,
    },
    Plain(Vec<QuestionDraft>),
}

/// Answer category for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerType {
    /// `a`, `an` or `a/an`.
    Indefinite,
    Definite,
    NoArticle,
}

impl AnswerType {
    fn matches(self, question: &Question) -> bool {
        match self {
            AnswerType::Indefinite => question.is_indefinite(),
            AnswerType::Definite => question.correct_answer() == DEFINITE,
            AnswerType::NoArticle => question.correct_answer() == NO_ARTICLE,
        }
    }
}

/// Counts over a question bank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankStatistics {
    pub total: usize,
    pub by_difficulty: BTreeMap<&'static str, usize>,
    pub by_answer: BTreeMap<String, usize>,
    pub by_rule: BTreeMap<u32, usize>,
}

/// Immutable set of questions, in content order.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
    index: HashMap<QuestionId, usize>,
}

impl QuestionBank {
    /// Build a bank from validated questions.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::DuplicateId` if two questions share an id.
    pub fn new(questions: Vec<Question>) -> Result<Self, ContentError> {
        let mut index = HashMap::with_capacity(questions.len());
        for (pos, question) in questions.iter().enumerate() {
            if index.insert(question.id(), pos).is_some() {
                return Err(ContentError::DuplicateId(question.id()));
            }
        }
        Ok(Self { questions, index })
    }

    /// Parse and validate a JSON content file.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` on malformed JSON, invalid questions or
    /// duplicate ids.
    pub fn from_json(raw: &str) -> Result<Self, ContentError> {
        let drafts = match serde_json::from_str::<ContentFile>(raw)? {
            ContentFile::Wrapped { game_sentences } => game_sentences,
            ContentFile::Plain(list) => list,
        };
        let questions = drafts
            .into_iter()
            .map(QuestionDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(questions)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.index.get(&id).map(|&pos| &self.questions[pos])
    }

    /// All ids in content order.
    #[must_use]
    pub fn ids(&self) -> Vec<QuestionId> {
        self.questions.iter().map(Question::id).collect()
    }

    #[must_use]
    pub fn id_set(&self) -> HashSet<QuestionId> {
        self.index.keys().copied().collect()
    }

    pub fn by_rule(&self, rule_id: u32) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(move |q| q.rule_id() == rule_id)
    }

    pub fn by_answer_type(&self, answer_type: AnswerType) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(move |q| answer_type.matches(q))
    }

    pub fn by_difficulty(&self, difficulty: Difficulty) -> impl Iterator<Item = &Question> {
        self.questions
            .iter()
            .filter(move |q| q.difficulty() == Some(difficulty))
    }

    /// Questions grouped by rule id.
    #[must_use]
    pub fn grouped_by_rule(&self) -> BTreeMap<u32, Vec<&Question>> {
        let mut groups: BTreeMap<u32, Vec<&Question>> = BTreeMap::new();
        for question in &self.questions {
            groups.entry(question.rule_id()).or_default().push(question);
        }
        groups
    }

    #[must_use]
    pub fn statistics(&self) -> BankStatistics {
        let mut stats = BankStatistics {
            total: self.questions.len(),
            ..BankStatistics::default()
        };
        for question in &self.questions {
            let tier = match question.difficulty() {
                Some(Difficulty::Beginner) => "beginner",
                Some(Difficulty::Intermediate) => "intermediate",
                Some(Difficulty::Advanced) => "advanced",
                None => "unrated",
            };
            *stats.by_difficulty.entry(tier).or_default() += 1;
            *stats
                .by_answer
                .entry(question.correct_answer().to_owned())
                .or_default() += 1;
            *stats.by_rule.entry(question.rule_id()).or_default() += 1;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT: &str = r#"{
        "gameSentences": [
            {"id": 1, "sentence": "I need ___ apple.", "correctAnswer": "an", "ruleId": 1, "difficulty": "beginner"},
            {"id": 2, "sentence": "___ sun is bright.", "correctAnswer": "the", "ruleId": 2, "difficulty": "beginner"},
            {"id": 3, "sentence": "I like ___ music.", "correctAnswer": "nothing", "ruleId": 3, "difficulty": "intermediate"},
            {"id": 4, "sentence": "She is ___ doctor.", "correctAnswer": "a", "ruleId": 1}
        ]
    }"#;

    #[test]
    fn parses_wrapped_content() {
        let bank = QuestionBank::from_json(CONTENT).unwrap();
        assert_eq!(bank.len(), 4);
        assert_eq!(bank.get(QuestionId::new(3)).unwrap().correct_answer(), "nothing");
        assert_eq!(bank.ids(), (1..=4).map(QuestionId::new).collect::<Vec<_>>());
    }

    #[test]
    fn parses_bare_list() {
        let bank =
            QuestionBank::from_json(r#"[{"id": 8, "sentence": "___ moon.", "correctAnswer": "the"}]"#)
                .unwrap();
        assert_eq!(bank.len(), 1);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let raw = r#"[
            {"id": 1, "sentence": "___ a.", "correctAnswer": "the"},
            {"id": 1, "sentence": "___ b.", "correctAnswer": "the"}
        ]"#;
        let err = QuestionBank::from_json(raw).unwrap_err();
        assert!(matches!(err, ContentError::DuplicateId(id) if id == QuestionId::new(1)));
    }

    #[test]
    fn invalid_question_is_reported() {
        let raw = r#"[{"id": 5, "sentence": "no blank", "correctAnswer": "the"}]"#;
        let err = QuestionBank::from_json(raw).unwrap_err();
        assert!(matches!(err, ContentError::Question(QuestionError::MissingBlank { .. })));
    }

    #[test]
    fn filters_by_rule_answer_and_difficulty() {
        let bank = QuestionBank::from_json(CONTENT).unwrap();
        assert_eq!(bank.by_rule(1).count(), 2);
        assert_eq!(bank.by_answer_type(AnswerType::Indefinite).count(), 2);
        assert_eq!(bank.by_answer_type(AnswerType::Definite).count(), 1);
        assert_eq!(bank.by_answer_type(AnswerType::NoArticle).count(), 1);
        assert_eq!(bank.by_difficulty(Difficulty::Beginner).count(), 2);
        assert_eq!(bank.grouped_by_rule()[&1].len(), 2);
    }

    #[test]
    fn statistics_count_everything() {
        let stats = QuestionBank::from_json(CONTENT).unwrap().statistics();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.by_difficulty["beginner"], 2);
        assert_eq!(stats.by_difficulty["unrated"], 1);
        assert_eq!(stats.by_answer["an"], 1);
        assert_eq!(stats.by_rule[&1], 2);
    }
}
