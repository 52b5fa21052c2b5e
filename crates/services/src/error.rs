//! Shared error types for the services crate.

use thiserror::Error;

use grammar_core::content::ContentError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for a game")]
    Empty,
    #[error("stored question order does not match the question bank")]
    StaleProgress,
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Content(#[from] ContentError),
}
