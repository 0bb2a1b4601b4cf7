//! Backup module for portable export/import of local study data.
//!
//! Built-in cards ship with the data directory, so only what the user created
//! is exported: imported cards and quiz history.
//!
//! ## Export Format
//! ```text
//! review_deck_{date}.zip
//! ├── manifest.json      # format version, export time, app version
//! ├── custom_cards.json  # imported cards (images embedded as data URLs)
//! └── quiz_history.json  # every game with its answers
//! ```

use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::io::{Read as IoRead, Write as IoWrite};
use zip::write::SimpleFileOptions;

use crate::db;
use crate::domain::{Card, GameRecord};

/// Export manifest format version
pub const MANIFEST_VERSION: u32 = 1;

const MANIFEST_FILE: &str = "manifest.json";
const CARDS_FILE: &str = "custom_cards.json";
const HISTORY_FILE: &str = "quiz_history.json";

/// Export manifest containing metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportManifest {
    /// Format version for future compatibility
    pub format_version: u32,
    /// ISO8601 timestamp of export
    pub exported_at: String,
    /// Application version at export time
    pub app_version: String,
}

impl ExportManifest {
    pub fn current() -> Self {
        Self {
            format_version: MANIFEST_VERSION,
            exported_at: Utc::now().to_rfc3339(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Result of import operation
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportResult {
    pub cards_added: usize,
    /// Cards whose id already existed locally
    pub cards_skipped: usize,
    pub games_added: usize,
    /// True if the export came from an incompatible app version
    pub version_warning: bool,
}

#[derive(Debug)]
pub enum BackupError {
    NotZip,
    MissingFile(&'static str),
    /// Export written by a newer format
    UnsupportedVersion(u32),
    Zip(String),
    Json(String),
    Database(rusqlite::Error),
}

impl std::fmt::Display for BackupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackupError::NotZip => write!(f, "Invalid export file: not a ZIP archive"),
            BackupError::MissingFile(name) => write!(f, "Invalid export file: missing {}", name),
            BackupError::UnsupportedVersion(v) => write!(
                f,
                "Export format version {} is newer than supported version {}. Please update the app.",
                v, MANIFEST_VERSION
            ),
            BackupError::Zip(e) => write!(f, "ZIP error: {}", e),
            BackupError::Json(e) => write!(f, "Invalid export data: {}", e),
            BackupError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl BackupError {
    /// Returns a user-facing error message without internal details.
    pub fn user_message(&self) -> String {
        match self {
            BackupError::Database(_) => "Failed to save imported data".to_string(),
            BackupError::Zip(_) => "Invalid export file: could not read archive".to_string(),
            other => other.to_string(),
        }
    }
}

impl std::error::Error for BackupError {}

impl From<zip::result::ZipError> for BackupError {
    fn from(e: zip::result::ZipError) -> Self {
        BackupError::Zip(e.to_string())
    }
}

impl From<std::io::Error> for BackupError {
    fn from(e: std::io::Error) -> Self {
        BackupError::Zip(e.to_string())
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(e: serde_json::Error) -> Self {
        BackupError::Json(e.to_string())
    }
}

impl From<rusqlite::Error> for BackupError {
    fn from(e: rusqlite::Error) -> Self {
        BackupError::Database(e)
    }
}

/// Check if export version is compatible with current version.
///
/// We allow any version within the same major version number.
/// Pre-1.0 versions (0.x.y) are all considered compatible with each other.
pub fn check_version_compatible(export_version: &str, current_version: &str) -> bool {
    let parse_major = |v: &str| -> Option<u32> { v.split('.').next()?.parse().ok() };

    match (parse_major(export_version), parse_major(current_version)) {
        (Some(export_major), Some(current_major)) => {
            // For pre-1.0, all 0.x versions are compatible
            if export_major == 0 && current_major == 0 {
                return true;
            }
            export_major == current_major
        }
        _ => false,
    }
}

/// Create export ZIP archive from the local database.
pub fn create_export_zip(conn: &Connection) -> Result<Vec<u8>, BackupError> {
    let manifest_json = serde_json::to_string_pretty(&ExportManifest::current())?;
    let cards_json = serde_json::to_string_pretty(&db::get_custom_cards(conn)?)?;
    let history_json = serde_json::to_string_pretty(&db::get_all_games(conn)?)?;

    let mut zip_buffer = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut zip_buffer));
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for (name, body) in [
            (MANIFEST_FILE, manifest_json),
            (CARDS_FILE, cards_json),
            (HISTORY_FILE, history_json),
        ] {
            zip.start_file(name, options)?;
            zip.write_all(body.as_bytes())?;
        }

        zip.finish()?;
    }

    Ok(zip_buffer)
}

/// Contents of an export archive
#[derive(Debug)]
pub struct ExportContents {
    pub manifest: ExportManifest,
    pub cards: Vec<Card>,
    pub games: Vec<GameRecord>,
}

/// Extract and validate import ZIP archive.
pub fn extract_import_zip(bytes: &[u8]) -> Result<ExportContents, BackupError> {
    if !is_zip_file(bytes) {
        return Err(BackupError::NotZip);
    }
    let mut zip = zip::ZipArchive::new(std::io::Cursor::new(bytes))?;

    // Extract manifest first
    let manifest: ExportManifest = serde_json::from_str(&read_entry(&mut zip, MANIFEST_FILE)?)?;
    if manifest.format_version > MANIFEST_VERSION {
        return Err(BackupError::UnsupportedVersion(manifest.format_version));
    }

    let cards: Vec<Card> = serde_json::from_str(&read_entry(&mut zip, CARDS_FILE)?)?;
    let games: Vec<GameRecord> = serde_json::from_str(&read_entry(&mut zip, HISTORY_FILE)?)?;

    Ok(ExportContents { manifest, cards, games })
}

fn read_entry<R: std::io::Read + std::io::Seek>(
    zip: &mut zip::ZipArchive<R>,
    name: &'static str,
) -> Result<String, BackupError> {
    let mut file = zip.by_name(name).map_err(|_| BackupError::MissingFile(name))?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(content)
}

/// Merge an export into the local database.
///
/// Cards with an id already present are skipped; games already recorded
/// (same time, score and topic) are not duplicated.
pub fn import_backup(conn: &Connection, bytes: &[u8]) -> Result<ImportResult, BackupError> {
    let contents = extract_import_zip(bytes)?;
    let version_warning = !check_version_compatible(&contents.manifest.app_version, env!("CARGO_PKG_VERSION"));
    if version_warning {
        tracing::warn!(
            "Importing export from app version {} into {}",
            contents.manifest.app_version,
            env!("CARGO_PKG_VERSION")
        );
    }

    // Built-in ids would shadow cards.json entries
    let (cards, builtin): (Vec<Card>, Vec<Card>) =
        contents.cards.into_iter().partition(|card| card.id.is_custom());
    if !builtin.is_empty() {
        tracing::warn!("Skipping {} backup cards with built-in ids", builtin.len());
    }
    let cards: Vec<Card> = cards
        .into_iter()
        .map(|mut card| {
            card.is_custom = true;
            card
        })
        .collect();
    let cards_added = db::merge_custom_cards(conn, &cards)?;

    let mut games_added = 0;
    for game in &contents.games {
        if !db::has_game(conn, game)? {
            db::record_game(conn, game)?;
            games_added += 1;
        }
    }

    Ok(ImportResult {
        cards_added,
        cards_skipped: cards.len() - cards_added + builtin.len(),
        games_added,
        version_warning,
    })
}

/// Check if bytes look like a ZIP file (magic number check)
pub fn is_zip_file(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && &bytes[0..4] == b"PK\x03\x04"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnswerRecord, CardId, InputMode};
    use crate::testing::TestEnv;

    fn custom_card(page: u32) -> Card {
        let mut card = Card::new(CardId::custom(42, page), format!("Card {}", page), "notes");
        card.is_custom = true;
        card.page = Some(page);
        card
    }

    fn game(score: u32) -> GameRecord {
        GameRecord {
            score,
            date: Utc::now(),
            topic: "notes".into(),
            input_mode: InputMode::Type,
            details: vec![AnswerRecord {
                round: 1,
                card_id: CardId::custom(42, 1),
                title: "Card 1".into(),
                source: "notes".into(),
                user_answer: Some("card one".into()),
                correct: false,
                timed_out: false,
                points: 0,
            }],
        }
    }

    #[test]
    fn test_check_version_compatible() {
        assert!(check_version_compatible("0.1.0", "0.9.3"));
        assert!(check_version_compatible("1.2.0", "1.0.0"));
        assert!(!check_version_compatible("2.0.0", "1.0.0"));
        assert!(!check_version_compatible("garbage", "1.0.0"));
    }

    #[test]
    fn test_export_import_into_fresh_database() {
        let source = TestEnv::new().unwrap();
        db::append_custom_cards(&source.conn, &[custom_card(1), custom_card(2)]).unwrap();
        db::record_game(&source.conn, &game(12)).unwrap();

        let zip = create_export_zip(&source.conn).unwrap();
        assert!(is_zip_file(&zip));

        let target = TestEnv::new().unwrap();
        let result = import_backup(&target.conn, &zip).unwrap();
        assert_eq!(result.cards_added, 2);
        assert_eq!(result.games_added, 1);
        assert!(!result.version_warning);

        assert_eq!(db::get_custom_cards(&target.conn).unwrap().len(), 2);
        let last = db::get_last_session(&target.conn).unwrap().unwrap();
        assert_eq!(last.input_mode, InputMode::Type);
        assert_eq!(last.details[0].user_answer.as_deref(), Some("card one"));
    }

    #[test]
    fn test_reimport_does_not_duplicate() {
        let env = TestEnv::new().unwrap();
        db::append_custom_cards(&env.conn, &[custom_card(1)]).unwrap();
        db::record_game(&env.conn, &game(3)).unwrap();

        let zip = create_export_zip(&env.conn).unwrap();
        let result = import_backup(&env.conn, &zip).unwrap();

        assert_eq!(result.cards_added, 0);
        assert_eq!(result.cards_skipped, 1);
        assert_eq!(result.games_added, 0);
        assert_eq!(db::get_all_games(&env.conn).unwrap().len(), 1);
    }

    #[test]
    fn test_import_skips_builtin_card_ids() {
        let cards = vec![custom_card(1), Card::new(CardId::from(3), "Basil", "Herbs")];
        let mut buffer = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buffer));
            let files = [
                (MANIFEST_FILE, serde_json::to_string(&ExportManifest::current()).unwrap()),
                (CARDS_FILE, serde_json::to_string(&cards).unwrap()),
                (HISTORY_FILE, "[]".to_string()),
            ];
            for (name, body) in files {
                zip.start_file(name, SimpleFileOptions::default()).unwrap();
                zip.write_all(body.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }

        let env = TestEnv::new().unwrap();
        let result = import_backup(&env.conn, &buffer).unwrap();
        assert_eq!(result.cards_added, 1);
        assert_eq!(result.cards_skipped, 1);

        let stored = db::get_custom_cards(&env.conn).unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].id.is_custom());
    }

    #[test]
    fn test_rejects_non_zip() {
        let env = TestEnv::new().unwrap();
        let err = import_backup(&env.conn, b"SQLite format 3\0").unwrap_err();
        assert!(matches!(err, BackupError::NotZip));
    }

    #[test]
    fn test_rejects_newer_format() {
        let mut buffer = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buffer));
            zip.start_file(MANIFEST_FILE, SimpleFileOptions::default()).unwrap();
            zip.write_all(br#"{"format_version": 99, "exported_at": "now", "app_version": "9.0.0"}"#)
                .unwrap();
            zip.finish().unwrap();
        }
        let err = extract_import_zip(&buffer).unwrap_err();
        assert!(matches!(err, BackupError::UnsupportedVersion(99)));
    }

    #[test]
    fn test_missing_history_file() {
        let mut buffer = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buffer));
            let manifest = serde_json::to_string(&ExportManifest::current()).unwrap();
            zip.start_file(MANIFEST_FILE, SimpleFileOptions::default()).unwrap();
            zip.write_all(manifest.as_bytes()).unwrap();
            zip.start_file(CARDS_FILE, SimpleFileOptions::default()).unwrap();
            zip.write_all(b"[]").unwrap();
            zip.finish().unwrap();
        }
        let err = extract_import_zip(&buffer).unwrap_err();
        assert!(matches!(err, BackupError::MissingFile("quiz_history.json")));
    }
}
