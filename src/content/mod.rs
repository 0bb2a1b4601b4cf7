//! Static content shipped in the data directory.
//!
//! - `cards.json`: the built-in deck produced by `build-deck`
//! - `dictionary.json`: the search corpus produced by `build-dictionary`
//!
//! Both files are optional; a fresh install starts with an empty library
//! and grows through PDF imports.

pub mod cards;
pub mod dictionary;

pub use cards::{load_cards, write_cards};
pub use dictionary::{load_dictionary, write_dictionary};

use std::path::Path;

/// Content loading errors.
#[derive(Debug)]
pub enum ContentLoadError {
    IoError(String, String),
    ParseError(String, String),
}

impl std::fmt::Display for ContentLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentLoadError::IoError(path, err) => write!(f, "IO error reading {}: {}", path, err),
            ContentLoadError::ParseError(path, err) => write!(f, "Parse error in {}: {}", path, err),
        }
    }
}

impl ContentLoadError {
    /// Returns a user-facing error message without exposing filesystem paths.
    pub fn user_message(&self) -> &'static str {
        match self {
            ContentLoadError::IoError(_, _) => "Failed to read content file",
            ContentLoadError::ParseError(_, _) => "Failed to parse content file",
        }
    }
}

impl std::error::Error for ContentLoadError {}

/// Read and parse a JSON file, treating a missing file as `T::default()`.
pub(crate) fn read_json_or_default<T>(path: &Path) -> Result<T, ContentLoadError>
where
    T: serde::de::DeserializeOwned + Default,
{
    if !path.exists() {
        tracing::debug!("{} not found, starting empty", path.display());
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ContentLoadError::IoError(path.display().to_string(), e.to_string()))?;

    serde_json::from_str(&content)
        .map_err(|e| ContentLoadError::ParseError(path.display().to_string(), e.to_string()))
}

/// Write pretty JSON, creating parent directories as needed.
pub(crate) fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, json)
}
