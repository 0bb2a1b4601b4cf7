use rusqlite::{Connection, Result};

pub fn run_migrations(conn: &Connection) -> Result<()> {
  // Create tables with COMPLETE schema for new databases
  // Migrations below handle upgrades for existing databases
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS custom_cards (
      seq INTEGER PRIMARY KEY AUTOINCREMENT,
      id TEXT NOT NULL UNIQUE,
      title TEXT NOT NULL DEFAULT '',
      description TEXT NOT NULL DEFAULT '',
      image_path TEXT NOT NULL DEFAULT '',
      source TEXT NOT NULL DEFAULT '',
      page INTEGER,
      created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS quiz_games (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      score INTEGER NOT NULL,
      topic TEXT NOT NULL,
      input_mode TEXT NOT NULL DEFAULT 'choice',
      played_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS quiz_answers (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      game_id INTEGER NOT NULL,
      round INTEGER NOT NULL,
      card_id TEXT NOT NULL,
      title TEXT NOT NULL,
      source TEXT NOT NULL,
      user_answer TEXT,
      is_correct INTEGER NOT NULL,
      timed_out INTEGER NOT NULL DEFAULT 0,
      points INTEGER NOT NULL DEFAULT 0,
      FOREIGN KEY (game_id) REFERENCES quiz_games(id)
    );

    CREATE TABLE IF NOT EXISTS settings (
      key TEXT PRIMARY KEY,
      value TEXT NOT NULL
    );

    -- Indexes
    CREATE INDEX IF NOT EXISTS idx_quiz_games_played_at ON quiz_games(played_at);
    CREATE INDEX IF NOT EXISTS idx_quiz_answers_game_id ON quiz_answers(game_id);
    CREATE INDEX IF NOT EXISTS idx_quiz_answers_card_id ON quiz_answers(card_id);
    "#,
  )?;

  // ============================================================
  // MIGRATIONS FOR EXISTING DATABASES
  // These are no-ops for new databases (columns already exist)
  // ============================================================

  // Migration: page number on imported cards
  add_column_if_missing(conn, "custom_cards", "page", "INTEGER")?;

  // Migration: record how each game was answered
  add_column_if_missing(conn, "quiz_games", "input_mode", "TEXT NOT NULL DEFAULT 'choice'")?;
  add_column_if_missing(conn, "quiz_answers", "timed_out", "INTEGER NOT NULL DEFAULT 0")?;

  Ok(())
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
  conn
    .prepare(&format!("SELECT {} FROM {} LIMIT 1", column, table))
    .is_ok()
}

/// Add a column if it doesn't already exist
fn add_column_if_missing(conn: &Connection, table: &str, column: &str, column_def: &str) -> Result<()> {
  if !column_exists(conn, table, column) {
    conn.execute(
      &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def),
      [],
    )?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_migrations_are_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    run_migrations(&conn).unwrap();
    assert!(column_exists(&conn, "quiz_answers", "timed_out"));
  }

  #[test]
  fn test_upgrades_old_quiz_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn
      .execute_batch(
        "CREATE TABLE quiz_games (id INTEGER PRIMARY KEY AUTOINCREMENT, score INTEGER NOT NULL, topic TEXT NOT NULL, played_at TEXT NOT NULL);",
      )
      .unwrap();
    run_migrations(&conn).unwrap();
    assert!(column_exists(&conn, "quiz_games", "input_mode"));
  }
}
