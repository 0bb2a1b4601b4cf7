//! Application configuration constants.
//!
//! Tunables for the quiz, search and import heuristics live here, along with
//! the loader for `config.toml` / environment overrides.

use serde::Deserialize;
use std::path::PathBuf;

// ==================== File Configuration ====================

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct AppConfig {
  server: Option<ServerConfig>,
  database: Option<DatabaseConfig>,
}

#[derive(Debug, Deserialize)]
struct ServerConfig {
  addr: Option<String>,
  port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
  path: Option<String>,
}

/// Load `.env` from the working directory into the process environment.
///
/// Runs first in `main`: `DATA_DIR`, `DATABASE_PATH`, `PORT` and `RUST_LOG`
/// are read from the environment afterwards. A missing file is `Ok(None)`.
pub fn load_env() -> Result<Option<PathBuf>, dotenvy::Error> {
  match dotenvy::dotenv() {
    Ok(path) => Ok(Some(path)),
    Err(e) if e.not_found() => Ok(None),
    Err(e) => Err(e),
  }
}

fn read_config_file() -> AppConfig {
  let Ok(contents) = std::fs::read_to_string("config.toml") else {
    return AppConfig::default();
  };
  match toml::from_str::<AppConfig>(&contents) {
    Ok(config) => config,
    Err(e) => {
      tracing::warn!("Ignoring malformed config.toml: {}", e);
      AppConfig::default()
    }
  }
}

/// Load database path with priority: config.toml > .env > default
pub fn load_database_path() -> PathBuf {
  if let Some(path) = read_config_file().database.and_then(|db| db.path) {
    tracing::info!("Using database from config.toml: {}", path);
    return PathBuf::from(path);
  }

  if let Ok(path) = std::env::var("DATABASE_PATH") {
    tracing::info!("Using database from DATABASE_PATH env: {}", path);
    return PathBuf::from(path);
  }

  let default = PathBuf::from(crate::paths::db_path());
  tracing::info!("Using default database path: {}", default.display());
  default
}

// ==================== Server Configuration ====================

/// Loopback only: all data belongs to the local user
pub const SERVER_ADDR: &str = "127.0.0.1";

/// Server port
pub const SERVER_PORT: u16 = 3000;

/// Get the full server bind address (config.toml > PORT env > defaults)
pub fn server_bind_addr() -> String {
  let server = read_config_file().server;

  let addr = server
    .as_ref()
    .and_then(|s| s.addr.clone())
    .unwrap_or_else(|| SERVER_ADDR.to_string());
  let port = server
    .and_then(|s| s.port)
    .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
    .unwrap_or(SERVER_PORT);

  format!("{}:{}", addr, port)
}

// ==================== Session Configuration ====================

/// Idle quiz games are dropped after this many hours
pub const SESSION_EXPIRY_HOURS: i64 = 2;

/// Probability threshold for session cleanup (0-255, lower = more frequent)
/// Value of 25 means ~10% chance (25/256) on each session access
pub const SESSION_CLEANUP_THRESHOLD: u8 = 25;

// ==================== Quiz Configuration ====================

/// Default number of questions (capped by deck size)
pub const DEFAULT_QUESTION_COUNT: usize = 10;

/// Default seconds per question
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 15;

/// Timer bounds in seconds
pub const MIN_TIME_LIMIT_SECS: u32 = 5;
pub const MAX_TIME_LIMIT_SECS: u32 = 300;

/// Timer adjustment step used by clients
pub const TIME_LIMIT_STEP_SECS: u32 = 5;

/// Number of distractor choices in multiple choice mode
pub const DISTRACTOR_COUNT: usize = 3;

/// Distinct answers the library needs before a quiz can offer options
pub const MIN_LIBRARY_ANSWERS: usize = DISTRACTOR_COUNT + 1;

/// Points for a correct answer, before the time bonus
pub const BASE_POINTS: u32 = 10;

/// Topic label stored for games that span the whole library
pub const MIXED_TOPIC: &str = "Mixed";

/// Topic name selecting the mistake deck
pub const MISTAKES_TOPIC: &str = "Mistakes";

// ==================== Stats / Search ====================

/// Games shown under "recent games"
pub const RECENT_GAMES_LIMIT: usize = 5;

/// Matching lines shown per search hit
pub const SEARCH_SNIPPET_LIMIT: usize = 3;

// ==================== Import Heuristics ====================

/// An image on more than max(this, ratio * pages) pages is a background
pub const BACKGROUND_MIN_PAGES: usize = 3;
pub const BACKGROUND_PAGE_RATIO: f64 = 0.1;

/// Images covering more of the page than this are slide backgrounds
pub const FULL_PAGE_AREA_RATIO: f64 = 0.95;

/// Description used when a page has a single text line
pub const NO_DESCRIPTION: &str = "No description extracted.";

/// Resolution for pages rendered because they embed no image
pub const PAGE_RENDER_DPI: u32 = 96;
