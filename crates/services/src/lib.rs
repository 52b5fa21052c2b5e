#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod persistence;
pub mod sessions;

pub use grammar_core::Clock;
pub use grammar_core::progression::Transition;

pub use app_services::AppServices;
pub use error::{AppServicesError, SessionError};
pub use persistence::{StatePersistence, StoredState};
pub use sessions::{CompletionStats, GameLoopService, GameProgress, GameSession, ShuffleSource};
