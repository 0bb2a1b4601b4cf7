//! Key/value settings

use rusqlite::{params, Connection, Result};

use crate::domain::InputMode;
use crate::study::QuizSettings;

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT value FROM settings WHERE key = ?1")?;
    let mut rows = stmt.query(params![key])?;
    if let Some(row) = rows.next()? {
        Ok(Some(row.get(0)?))
    } else {
        Ok(None)
    }
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

/// Quiz settings from the last started game, if any
pub fn get_quiz_settings(conn: &Connection) -> Result<Option<QuizSettings>> {
    let count = get_setting(conn, "quiz_question_count")?.and_then(|v| v.parse().ok());
    let time = get_setting(conn, "quiz_time_limit")?.and_then(|v| v.parse().ok());
    let mode = get_setting(conn, "quiz_input_mode")?.and_then(|v| InputMode::from_str(&v));

    Ok(match (count, time, mode) {
        (Some(question_count), Some(time_limit_secs), Some(input_mode)) => Some(QuizSettings {
            question_count,
            time_limit_secs,
            input_mode,
        }),
        _ => None,
    })
}

pub fn set_quiz_settings(conn: &Connection, settings: &QuizSettings) -> Result<()> {
    set_setting(conn, "quiz_question_count", &settings.question_count.to_string())?;
    set_setting(conn, "quiz_time_limit", &settings.time_limit_secs.to_string())?;
    set_setting(conn, "quiz_input_mode", settings.input_mode.as_str())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestEnv;

    #[test]
    fn test_setting_overwrite() {
        let env = TestEnv::new().unwrap();
        assert_eq!(get_setting(&env.conn, "k").unwrap(), None);
        set_setting(&env.conn, "k", "1").unwrap();
        set_setting(&env.conn, "k", "2").unwrap();
        assert_eq!(get_setting(&env.conn, "k").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_quiz_settings_persist() {
        let env = TestEnv::new().unwrap();
        assert!(get_quiz_settings(&env.conn).unwrap().is_none());

        let settings = QuizSettings {
            question_count: 7,
            time_limit_secs: 25,
            input_mode: InputMode::Type,
        };
        set_quiz_settings(&env.conn, &settings).unwrap();
        assert_eq!(get_quiz_settings(&env.conn).unwrap(), Some(settings));
    }

    #[test]
    fn test_corrupt_quiz_settings_ignored() {
        let env = TestEnv::new().unwrap();
        set_setting(&env.conn, "quiz_question_count", "many").unwrap();
        set_setting(&env.conn, "quiz_time_limit", "15").unwrap();
        set_setting(&env.conn, "quiz_input_mode", "choice").unwrap();
        assert!(get_quiz_settings(&env.conn).unwrap().is_none());
    }
}
