//! Project path functions - single source of truth for all file paths.
//!
//! ## Environment Variables
//!
//! - `DATA_DIR`: Override the base data directory (default: "data")
//!
//! Layout under the data directory:
//! ```text
//! data/
//! ├── cards.json               # built-in deck (build-deck output)
//! ├── dictionary.json          # search corpus (build-dictionary output)
//! ├── review_deck.db           # imported cards, quiz history, settings
//! └── public/
//!     ├── cards/               # card images
//!     └── dictionary_images/   # dictionary page images
//! ```

use std::env;
use std::path::{Path, PathBuf};

/// Get the base data directory (from DATA_DIR env var or default "data").
///
/// Read on every call, so a `.env` loaded at startup is honored.
pub fn data_dir() -> String {
  env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string())
}

/// SQLite database path
pub fn db_path() -> String {
  format!("{}/review_deck.db", data_dir())
}

/// Paths rooted at one data directory.
///
/// The server and CLI use [`DataPaths::from_env`]; tests point it at a temp dir.
#[derive(Debug, Clone)]
pub struct DataPaths {
  root: PathBuf,
}

impl DataPaths {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn from_env() -> Self {
    Self::new(data_dir())
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Built-in deck
  pub fn cards_json(&self) -> PathBuf {
    self.root.join("cards.json")
  }

  /// Dictionary search corpus
  pub fn dictionary_json(&self) -> PathBuf {
    self.root.join("dictionary.json")
  }

  pub fn db(&self) -> PathBuf {
    self.root.join("review_deck.db")
  }

  /// Static files served to clients
  pub fn public_dir(&self) -> PathBuf {
    self.root.join("public")
  }

  pub fn card_images_dir(&self) -> PathBuf {
    self.public_dir().join("cards")
  }

  pub fn dictionary_images_dir(&self) -> PathBuf {
    self.public_dir().join("dictionary_images")
  }
}

/// URL prefix stored in `imagePath` for built-in card images
pub const CARD_IMAGES_URL: &str = "./cards";

/// URL prefix stored in `imagePath` for dictionary page images
pub const DICTIONARY_IMAGES_URL: &str = "./dictionary_images";

// ==================== Tests ====================
