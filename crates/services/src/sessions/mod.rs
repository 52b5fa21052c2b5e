mod plan;
mod progress;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::ShuffleSource;
pub use progress::{CompletionStats, GameProgress};
pub use service::GameSession;
pub use workflow::GameLoopService;
