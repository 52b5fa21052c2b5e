use serde::Serialize;

use grammar_core::model::GameMode;

/// Aggregated view of game progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameProgress {
    pub cursor: usize,
    pub total: usize,
    /// Served questions minus outstanding mistakes.
    pub completed: usize,
    pub percentage: f64,
    pub mode: GameMode,
    pub errors_remaining: usize,
    pub score: u32,
    pub is_completed: bool,
}

/// Numbers shown on the end screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStats {
    pub final_score: u32,
    pub questions_completed: usize,
    pub errors_remaining: usize,
}
