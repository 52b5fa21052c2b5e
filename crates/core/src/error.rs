use thiserror::Error;

use crate::content::ContentError;
use crate::model::{ConfigError, QuestionError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Content(#[from] ContentError),
}
