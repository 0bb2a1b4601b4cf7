//! Application state shared by all handlers.

use std::sync::Arc;

use crate::content::{self, ContentLoadError};
use crate::db::DbPool;
use crate::domain::{Card, DictionaryFile};
use crate::paths::DataPaths;
use crate::session::QuizStore;

/// Application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    /// Local database (imported cards, quiz history, settings)
    pub db: DbPool,

    /// Data directory layout
    pub paths: DataPaths,

    /// Deck from `cards.json`, loaded once at start-up
    pub builtin_cards: Arc<Vec<Card>>,

    /// Search corpus from `dictionary.json`
    pub dictionary: Arc<Vec<DictionaryFile>>,

    /// Running quiz games
    pub quizzes: Arc<QuizStore>,
}

impl AppState {
    /// Load static content from the data directory.
    pub fn load(db: DbPool, paths: DataPaths) -> Result<Self, ContentLoadError> {
        let builtin_cards = content::load_cards(&paths.cards_json())?;
        let dictionary = content::load_dictionary(&paths.dictionary_json())?;
        tracing::info!(
            "Loaded {} built-in cards and {} dictionary files",
            builtin_cards.len(),
            dictionary.len()
        );

        Ok(Self {
            db,
            paths,
            builtin_cards: Arc::new(builtin_cards),
            dictionary: Arc::new(dictionary),
            quizzes: Arc::new(QuizStore::new()),
        })
    }
}
