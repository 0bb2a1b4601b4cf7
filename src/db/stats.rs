//! Quiz history, scoreboard and mistake tracking

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result};
use serde::Serialize;

use crate::config;
use crate::domain::{AnswerRecord, Card, CardId, GameRecord, InputMode};

/// One row of the recent games list
#[derive(Debug, Clone, Serialize)]
pub struct GameSummary {
    pub id: i64,
    pub score: u32,
    pub date: DateTime<Utc>,
    pub topic: String,
    pub correct: u32,
    pub total: u32,
}

/// Answer accuracy for one source deck
#[derive(Debug, Clone, Serialize)]
pub struct TopicAccuracy {
    pub topic: String,
    pub attempts: i64,
    pub correct: i64,
}

impl TopicAccuracy {
    pub fn accuracy(&self) -> f64 {
        if self.attempts > 0 {
            self.correct as f64 / self.attempts as f64
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsSummary {
    pub games_played: i64,
    pub total_score: i64,
    pub average_score: i64,
    pub weakest_topic: Option<String>,
    /// Weakest first
    pub topics: Vec<TopicAccuracy>,
    /// Newest first
    pub recent_games: Vec<GameSummary>,
}

/// A card answered wrong at least once
#[derive(Debug, Clone, Serialize)]
pub struct Mistake {
    pub card_id: CardId,
    pub title: String,
    pub source: String,
    pub wrong_count: i64,
    pub last_wrong_at: Option<DateTime<Utc>>,
    /// None when the last miss was a timeout
    pub last_answer: Option<String>,
}

/// Store a finished game with its answers
pub fn record_game(conn: &Connection, game: &GameRecord) -> Result<i64> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO quiz_games (score, topic, input_mode, played_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            game.score,
            game.topic,
            game.input_mode.as_str(),
            game.date.to_rfc3339(),
        ],
    )?;
    let game_id = tx.last_insert_rowid();
    {
        let mut stmt = tx.prepare(
            r#"
      INSERT INTO quiz_answers
        (game_id, round, card_id, title, source, user_answer, is_correct, timed_out, points)
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
      "#,
        )?;
        for answer in &game.details {
            stmt.execute(params![
                game_id,
                answer.round,
                answer.card_id.as_str(),
                answer.title,
                answer.source,
                answer.user_answer,
                answer.correct,
                answer.timed_out,
                answer.points,
            ])?;
        }
    }
    tx.commit()?;
    Ok(game_id)
}

pub fn get_stats_summary(conn: &Connection) -> Result<StatsSummary> {
    let (games_played, total_score): (i64, i64) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(score), 0) FROM quiz_games",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let average_score = if games_played > 0 {
        (total_score as f64 / games_played as f64).round() as i64
    } else {
        0
    };

    let topics = get_topic_accuracy(conn)?;
    let weakest_topic = topics.first().map(|t| t.topic.clone());

    Ok(StatsSummary {
        games_played,
        total_score,
        average_score,
        weakest_topic,
        topics,
        recent_games: get_recent_games(conn, config::RECENT_GAMES_LIMIT)?,
    })
}

pub fn get_recent_games(conn: &Connection, limit: usize) -> Result<Vec<GameSummary>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT g.id, g.score, g.played_at, g.topic,
           COALESCE(SUM(a.is_correct), 0), COUNT(a.id)
    FROM quiz_games g
    LEFT JOIN quiz_answers a ON a.game_id = g.id
    GROUP BY g.id
    ORDER BY g.played_at DESC, g.id DESC
    LIMIT ?1
    "#,
    )?;

    let games = stmt
        .query_map(params![limit as i64], |row| {
            let date: String = row.get(2)?;
            Ok(GameSummary {
                id: row.get(0)?,
                score: row.get(1)?,
                date: parse_date(&date),
                topic: row.get(3)?,
                correct: row.get(4)?,
                total: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>>>()?;

    Ok(games)
}

/// Per-source accuracy over every recorded answer, weakest first
pub fn get_topic_accuracy(conn: &Connection) -> Result<Vec<TopicAccuracy>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT source, COUNT(*), SUM(is_correct)
    FROM quiz_answers
    GROUP BY source
    ORDER BY CAST(SUM(is_correct) AS REAL) / COUNT(*) ASC, COUNT(*) DESC, source
    "#,
    )?;

    let topics = stmt
        .query_map([], |row| {
            Ok(TopicAccuracy {
                topic: row.get(0)?,
                attempts: row.get(1)?,
                correct: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>>>()?;

    Ok(topics)
}

/// The most recently played game with its answers
pub fn get_last_session(conn: &Connection) -> Result<Option<GameRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM quiz_games ORDER BY played_at DESC, id DESC LIMIT 1",
    )?;
    let mut rows = stmt.query([])?;
    if let Some(row) = rows.next()? {
        get_game(conn, row.get(0)?)
    } else {
        Ok(None)
    }
}

pub fn get_game(conn: &Connection, game_id: i64) -> Result<Option<GameRecord>> {
    let mut stmt = conn.prepare(
        "SELECT score, played_at, topic, input_mode FROM quiz_games WHERE id = ?1",
    )?;
    let mut rows = stmt.query(params![game_id])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };

    let date: String = row.get(1)?;
    let mode: String = row.get(3)?;
    Ok(Some(GameRecord {
        score: row.get(0)?,
        date: parse_date(&date),
        topic: row.get(2)?,
        input_mode: InputMode::from_str(&mode).unwrap_or_default(),
        details: get_game_answers(conn, game_id)?,
    }))
}

fn get_game_answers(conn: &Connection, game_id: i64) -> Result<Vec<AnswerRecord>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT round, card_id, title, source, user_answer, is_correct, timed_out, points
    FROM quiz_answers
    WHERE game_id = ?1
    ORDER BY round
    "#,
    )?;

    let answers = stmt
        .query_map(params![game_id], |row| {
            Ok(AnswerRecord {
                round: row.get(0)?,
                card_id: CardId::new(row.get::<_, String>(1)?),
                title: row.get(2)?,
                source: row.get(3)?,
                user_answer: row.get(4)?,
                correct: row.get(5)?,
                timed_out: row.get(6)?,
                points: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>>>()?;

    Ok(answers)
}

/// Whether a game with this timestamp, score and topic is already stored
pub fn has_game(conn: &Connection, game: &GameRecord) -> Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM quiz_games WHERE played_at = ?1 AND score = ?2 AND topic = ?3",
        params![game.date.to_rfc3339(), game.score, game.topic],
        |row| row.get(0),
    )
}

/// Every game, oldest first
pub fn get_all_games(conn: &Connection) -> Result<Vec<GameRecord>> {
    let mut stmt = conn.prepare("SELECT id FROM quiz_games ORDER BY played_at, id")?;
    let ids = stmt
        .query_map([], |row| row.get::<_, i64>(0))?
        .collect::<Result<Vec<_>>>()?;

    let mut games = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(game) = get_game(conn, id)? {
            games.push(game);
        }
    }
    Ok(games)
}

/// Cards answered wrong, most missed first, then most recently missed
pub fn get_mistakes(conn: &Connection) -> Result<Vec<Mistake>> {
    // Title, answer and time come from each card's latest wrong answer by play time
    let mut stmt = conn.prepare(
        r#"
    WITH wrong AS (
        SELECT a.id, a.card_id, a.title, a.source, a.user_answer, g.played_at,
               COUNT(*) OVER (PARTITION BY a.card_id) AS wrong_count,
               ROW_NUMBER() OVER (
                   PARTITION BY a.card_id ORDER BY g.played_at DESC, a.id DESC
               ) AS recency
        FROM quiz_answers a
        JOIN quiz_games g ON g.id = a.game_id
        WHERE a.is_correct = 0
    )
    SELECT card_id, title, source, wrong_count, played_at, user_answer
    FROM wrong
    WHERE recency = 1
    ORDER BY wrong_count DESC, played_at DESC, id DESC
    "#,
    )?;

    let mistakes = stmt
        .query_map([], |row| {
            let played_at: Option<String> = row.get(4)?;
            Ok(Mistake {
                card_id: CardId::new(row.get::<_, String>(0)?),
                title: row.get(1)?,
                source: row.get(2)?,
                wrong_count: row.get(3)?,
                last_wrong_at: played_at.and_then(|s| {
                    DateTime::parse_from_rfc3339(&s)
                        .ok()
                        .map(|dt| dt.with_timezone(&Utc))
                }),
                last_answer: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>>>()?;

    Ok(mistakes)
}

/// Library cards that have mistakes, in mistake order
pub fn mistake_deck(library: &[Card], mistakes: &[Mistake]) -> Vec<Card> {
    mistakes
        .iter()
        .filter_map(|m| library.iter().find(|c| c.id == m.card_id))
        .cloned()
        .collect()
}

fn parse_date(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
