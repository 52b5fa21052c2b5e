use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("max attempts must be > 0")]
    InvalidMaxAttempts,

    #[error("error mode trigger must be > 0")]
    InvalidErrorModeTrigger,

    #[error("error mode questions must be > 0")]
    InvalidErrorModeQuestions,

    #[error("mastery streak must be > 0")]
    InvalidMasteryStreak,

    #[error("snapshot limit must be > 0")]
    InvalidSnapshotLimit,

    #[error("storage key `{0}` cannot be empty")]
    EmptyStorageKey(&'static str),

    #[error("storage keys must be distinct")]
    DuplicateStorageKey,
}

//
// ─── STORAGE KEYS ──────────────────────────────────────────────────────────────
//

/// Key names for the persisted state records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub progress: String,
    pub answer: String,
    pub errors: String,
    pub snapshot_prefix: String,
}

impl StorageKeys {
    /// Keys used by the article game.
    #[must_use]
    pub fn article_game() -> Self {
        Self::with_namespace("article_game")
    }

    /// Derive all keys from a common namespace, e.g. `article_game`.
    #[must_use]
    pub fn with_namespace(namespace: &str) -> Self {
        Self {
            progress: format!("{namespace}_progress_state"),
            answer: format!("{namespace}_answer_state"),
            errors: format!("{namespace}_error_state"),
            snapshot_prefix: format!("{namespace}_snapshot:"),
        }
    }

    /// The three state record keys, in progress/answer/error order.
    #[must_use]
    pub fn state_keys(&self) -> [&str; 3] {
        [&self.progress, &self.answer, &self.errors]
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("progress", &self.progress),
            ("answer", &self.answer),
            ("errors", &self.errors),
            ("snapshot_prefix", &self.snapshot_prefix),
        ];
        for (name, key) in named {
            if key.trim().is_empty() {
                return Err(ConfigError::EmptyStorageKey(name));
            }
        }
        let [progress, answer, errors] = self.state_keys();
        if progress == answer || progress == errors || answer == errors {
            return Err(ConfigError::DuplicateStorageKey);
        }
        if self
            .state_keys()
            .iter()
            .any(|key| key.starts_with(self.snapshot_prefix.as_str()))
        {
            return Err(ConfigError::DuplicateStorageKey);
        }
        Ok(())
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::article_game()
    }
}

//
// ─── GAME CONFIG ───────────────────────────────────────────────────────────────
//

/// Tuning knobs for one game session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    max_attempts: u32,
    error_mode_trigger: u32,
    error_mode_questions: u32,
    mastery_streak: u32,
    snapshots_enabled: bool,
    snapshot_limit: usize,
    keys: StorageKeys,
}

impl GameConfig {
    /// Settings used by the article game:
    /// - 2 attempts per question
    /// - an error review round after every 5 regular questions
    /// - 2 review questions per round
    /// - 3 correct reviews in a row to master a mistake
    #[must_use]
    pub fn article_defaults() -> Self {
        Self {
            max_attempts: 2,
            error_mode_trigger: 5,
            error_mode_questions: 2,
            mastery_streak: 3,
            snapshots_enabled: false,
            snapshot_limit: 100,
            keys: StorageKeys::article_game(),
        }
    }

    /// Creates a custom config.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any count is zero or the storage keys clash.
    pub fn new(
        max_attempts: u32,
        error_mode_trigger: u32,
        error_mode_questions: u32,
        mastery_streak: u32,
        keys: StorageKeys,
    ) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts);
        }
        if error_mode_trigger == 0 {
            return Err(ConfigError::InvalidErrorModeTrigger);
        }
        if error_mode_questions == 0 {
            return Err(ConfigError::InvalidErrorModeQuestions);
        }
        if mastery_streak == 0 {
            return Err(ConfigError::InvalidMasteryStreak);
        }
        keys.validate()?;

        Ok(Self {
            max_attempts,
            error_mode_trigger,
            error_mode_questions,
            mastery_streak,
            snapshots_enabled: false,
            snapshot_limit: 100,
            keys,
        })
    }

    /// Enable per-question answer snapshots, keeping at most `limit` of them.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidSnapshotLimit` if `limit` is zero.
    pub fn with_snapshots(mut self, limit: usize) -> Result<Self, ConfigError> {
        if limit == 0 {
            return Err(ConfigError::InvalidSnapshotLimit);
        }
        self.snapshots_enabled = true;
        self.snapshot_limit = limit;
        Ok(self)
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn error_mode_trigger(&self) -> u32 {
        self.error_mode_trigger
    }

    #[must_use]
    pub fn error_mode_questions(&self) -> u32 {
        self.error_mode_questions
    }

    #[must_use]
    pub fn mastery_streak(&self) -> u32 {
        self.mastery_streak
    }

    #[must_use]
    pub fn snapshots_enabled(&self) -> bool {
        self.snapshots_enabled
    }

    #[must_use]
    pub fn snapshot_limit(&self) -> usize {
        self.snapshot_limit
    }

    #[must_use]
    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::article_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_defaults_match_game_rules() {
        let config = GameConfig::article_defaults();
        assert_eq!(config.max_attempts(), 2);
        assert_eq!(config.error_mode_trigger(), 5);
        assert_eq!(config.error_mode_questions(), 2);
        assert_eq!(config.mastery_streak(), 3);
        assert!(!config.snapshots_enabled());
        assert_eq!(config.keys().progress, "article_game_progress_state");
        assert_eq!(config.keys().answer, "article_game_answer_state");
        assert_eq!(config.keys().errors, "article_game_error_state");
    }

    #[test]
    fn zero_counts_are_rejected() {
        let keys = StorageKeys::default;
        assert_eq!(
            GameConfig::new(0, 5, 2, 3, keys()).unwrap_err(),
            ConfigError::InvalidMaxAttempts
        );
        assert_eq!(
            GameConfig::new(2, 0, 2, 3, keys()).unwrap_err(),
            ConfigError::InvalidErrorModeTrigger
        );
        assert_eq!(
            GameConfig::new(2, 5, 0, 3, keys()).unwrap_err(),
            ConfigError::InvalidErrorModeQuestions
        );
        assert_eq!(
            GameConfig::new(2, 5, 2, 0, keys()).unwrap_err(),
            ConfigError::InvalidMasteryStreak
        );
    }

    #[test]
    fn clashing_keys_are_rejected() {
        let mut keys = StorageKeys::with_namespace("test");
        keys.answer = keys.progress.clone();
        assert_eq!(
            GameConfig::new(2, 5, 2, 3, keys).unwrap_err(),
            ConfigError::DuplicateStorageKey
        );

        let mut keys = StorageKeys::with_namespace("test");
        keys.errors = "  ".into();
        assert_eq!(
            GameConfig::new(2, 5, 2, 3, keys).unwrap_err(),
            ConfigError::EmptyStorageKey("errors")
        );
    }

    #[test]
    fn snapshot_limit_must_be_positive() {
        let err = GameConfig::article_defaults().with_snapshots(0).unwrap_err();
        assert_eq!(err, ConfigError::InvalidSnapshotLimit);

        let config = GameConfig::article_defaults().with_snapshots(10).unwrap();
        assert!(config.snapshots_enabled());
        assert_eq!(config.snapshot_limit(), 10);
    }
}
