mod attempt;
mod config;
mod ids;
mod ledger;
mod progress;
pub mod question;
mod snapshot;

pub use ids::{ParseIdError, QuestionId};

pub use attempt::{AnswerOutcome, CurrentQuestionState, FIRST_TRY_POINTS, RETRY_POINTS};
pub use config::{ConfigError, GameConfig, StorageKeys};
pub use ledger::{ErrorEntry, ErrorState};
pub use progress::{GameMode, ProgressState};
pub use question::{Difficulty, Question, QuestionDraft, QuestionError};
pub use snapshot::{AnswerSnapshot, SnapshotKey, SnapshotKeyError};
