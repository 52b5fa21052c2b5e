use std::sync::Arc;

use grammar_core::content::QuestionBank;
use grammar_core::model::{AnswerOutcome, AnswerSnapshot, GameConfig, SnapshotKey};
use grammar_core::progression::Transition;
use storage::repository::KeyValueStore;

use super::plan::ShuffleSource;
use super::service::GameSession;
use crate::Clock;
use crate::error::SessionError;
use crate::persistence::StatePersistence;

/// Orchestrates game start/resume and mirrors every state change to storage.
#[derive(Clone)]
pub struct GameLoopService {
    clock: Clock,
    bank: Arc<QuestionBank>,
    config: GameConfig,
    persistence: StatePersistence,
    shuffle: ShuffleSource,
}

impl GameLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        bank: Arc<QuestionBank>,
        config: GameConfig,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let persistence = StatePersistence::new(store, config.keys().clone())
            .with_snapshot_limit(config.snapshot_limit());
        Self {
            clock,
            bank,
            config,
            persistence,
            shuffle: ShuffleSource::Random,
        }
    }

    #[must_use]
    pub fn with_shuffle(mut self, shuffle: ShuffleSource) -> Self {
        self.shuffle = shuffle;
        self
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn persistence(&self) -> &StatePersistence {
        &self.persistence
    }

    /// Resume the stored game, or start a new one if nothing usable is stored.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the question bank is empty.
    pub async fn start_or_resume(&self) -> Result<GameSession, SessionError> {
        let stored = self.persistence.load_state().await;
        if let Some(progress) = stored.progress {
            match GameSession::restore(
                Arc::clone(&self.bank),
                self.config.clone(),
                progress,
                stored.current,
                stored.errors,
            ) {
                Ok(session) => {
                    tracing::info!(
                        cursor = session.progress().cursor(),
                        mode = %session.mode(),
                        errors = session.errors().len(),
                        "resumed game"
                    );
                    self.save(&session).await;
                    return Ok(session);
                }
                Err(SessionError::StaleProgress) => {
                    tracing::warn!("stored game does not match the question bank; starting over");
                }
                Err(err) => return Err(err),
            }
        }

        let session = GameSession::start(Arc::clone(&self.bank), self.config.clone(), self.shuffle)?;
        tracing::info!(questions = session.progress().total(), "started new game");
        self.save(&session).await;
        Ok(session)
    }

    /// Submit an answer and persist the result.
    pub async fn submit_answer(
        &self,
        session: &mut GameSession,
        answer: &str,
    ) -> Option<AnswerOutcome> {
        let outcome = session.submit_answer(answer)?;
        self.save(session).await;
        if self.config.snapshots_enabled() {
            if let Some((key, snapshot)) = session.answer_snapshot(self.clock.now_millis()) {
                self.persistence.save_snapshot(key, &snapshot).await;
            }
        }
        Some(outcome)
    }

    /// Move to the next question and persist if anything changed.
    pub async fn advance_to_next(&self, session: &mut GameSession) -> Transition {
        let transition = session.advance_to_next();
        if transition.is_moved() {
            self.save(session).await;
        }
        transition
    }

    /// Skip the current question and persist the outcome.
    pub async fn skip_current(&self, session: &mut GameSession) -> Option<Transition> {
        let transition = session.skip_current()?;
        self.save(session).await;
        Some(transition)
    }

    /// Start over: new order, empty ledger, stored records and snapshots wiped.
    pub async fn reset_session(&self, session: &mut GameSession) {
        session.reset(self.shuffle);
        self.persistence.clear_state().await;
        self.persistence.clear_snapshots().await;
        self.save(session).await;
        tracing::info!("game reset");
    }

    /// All stored answer snapshots.
    pub async fn stored_snapshots(&self) -> Vec<(SnapshotKey, AnswerSnapshot)> {
        self.persistence.load_snapshots().await
    }

    /// Stored snapshot for the question currently shown, if any.
    pub async fn current_snapshot(&self, session: &GameSession) -> Option<AnswerSnapshot> {
        let key = session.snapshot_key()?;
        self.persistence.load_snapshot(key).await
    }

    /// Forget the stored snapshot for the question currently shown.
    ///
    /// Returns `false` if there is no current question.
    pub async fn clear_current_snapshot(&self, session: &GameSession) -> bool {
        let Some(key) = session.snapshot_key() else {
            return false;
        };
        self.persistence.remove_snapshot(key).await;
        true
    }

    /// Wipe every stored record without touching the running session.
    pub async fn clear_stored_statistics(&self) {
        self.persistence.clear_state().await;
        let removed = self.persistence.clear_snapshots().await;
        tracing::info!(snapshots = removed, "cleared stored statistics");
    }

    async fn save(&self, session: &GameSession) {
        self.persistence
            .save_state(session.progress(), session.current(), session.errors())
            .await;
    }
}
