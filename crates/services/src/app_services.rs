use std::sync::Arc;

use grammar_core::content::QuestionBank;
use grammar_core::model::GameConfig;
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::sessions::{GameLoopService, ShuffleSource};

/// Assembles app-facing services over one store and one question bank.
#[derive(Clone)]
pub struct AppServices {
    bank: Arc<QuestionBank>,
    game_loop: Arc<GameLoopService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, with questions parsed from
    /// `content_json`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the content is invalid or storage
    /// initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        content_json: &str,
        clock: Clock,
        config: GameConfig,
        shuffle: ShuffleSource,
    ) -> Result<Self, AppServicesError> {
        let bank = QuestionBank::from_json(content_json)?;
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::with_storage(&storage, bank, clock, config, shuffle))
    }

    /// Build services over an already opened store.
    #[must_use]
    pub fn with_storage(
        storage: &Storage,
        bank: QuestionBank,
        clock: Clock,
        config: GameConfig,
        shuffle: ShuffleSource,
    ) -> Self {
        let bank = Arc::new(bank);
        let game_loop = Arc::new(
            GameLoopService::new(clock, Arc::clone(&bank), config, Arc::clone(&storage.kv))
                .with_shuffle(shuffle),
        );
        Self { bank, game_loop }
    }

    #[must_use]
    pub fn bank(&self) -> Arc<QuestionBank> {
        Arc::clone(&self.bank)
    }

    #[must_use]
    pub fn game_loop(&self) -> Arc<GameLoopService> {
        Arc::clone(&self.game_loop)
    }
}
