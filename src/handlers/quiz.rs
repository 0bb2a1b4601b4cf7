//! Quiz game endpoints.
//!
//! A game lives in the in-memory [`QuizStore`](crate::session::QuizStore)
//! until it finishes or the player abandons it. Finished games are written to
//! the history exactly once. A failed write leaves the game unsaved and the
//! next state request on it tries again.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::deck::TopicQuery;
use super::{deck_for_topic, library, ApiError};
use crate::config;
use crate::db::{self, try_lock, LogOnError};
use crate::domain::{AnswerRecord, GameRecord, ALL_TOPICS};
use crate::session::ActiveQuiz;
use crate::study::{Feedback, Question, QuizGame, QuizSettings, QuizSettingsRequest};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StartQuizRequest {
  pub topic: Option<String>,
  #[serde(flatten)]
  pub settings: QuizSettingsRequest,
}

/// Final tally of a finished game
#[derive(Debug, Serialize)]
pub struct QuizResult {
  pub score: u32,
  pub correct: usize,
  pub total: usize,
  pub details: Vec<AnswerRecord>,
}

#[derive(Debug, Serialize)]
pub struct QuizStateResponse {
  pub id: String,
  pub topic: String,
  pub settings: QuizSettings,
  pub score: u32,
  pub finished: bool,
  /// None once every question is answered
  pub question: Option<Question>,
  /// Present once the game is over
  pub result: Option<QuizResult>,
}

fn quiz_result(game: &QuizGame) -> QuizResult {
  QuizResult {
    score: game.score(),
    correct: game.history().iter().filter(|a| a.correct).count(),
    total: game.total(),
    details: game.history().to_vec(),
  }
}

fn state_response(id: &str, game: &QuizGame) -> QuizStateResponse {
  let finished = game.is_finished();
  QuizStateResponse {
    id: id.to_string(),
    topic: game.topic().to_string(),
    settings: *game.settings(),
    score: game.score(),
    finished,
    question: game.current_question(),
    result: finished.then(|| quiz_result(game)),
  }
}

fn unknown_quiz(id: &str) -> ApiError {
  ApiError::NotFound(format!("No running quiz with id {}", id))
}

/// Take the record of a finished game nobody is saving yet
fn claim_record(quiz: &mut ActiveQuiz) -> Option<GameRecord> {
  (quiz.game.is_finished() && !quiz.recorded).then(|| {
    quiz.recorded = true;
    quiz.game.to_record()
  })
}

/// Write a claimed game to the history, releasing the claim on failure
fn save_record(state: &AppState, id: &str, record: &GameRecord) -> Result<(), ApiError> {
  let saved = try_lock(&state.db)
    .map_err(ApiError::from)
    .and_then(|conn| db::record_game(&conn, record).map_err(ApiError::from));

  match saved {
    Ok(game_id) => {
      tracing::info!(
        "Quiz {} finished: score {} ({} / {}), saved as game {}",
        id,
        record.score,
        record.correct_count(),
        record.details.len(),
        game_id
      );
      Ok(())
    }
    Err(e) => {
      tracing::warn!("Quiz {} result not saved, will retry", id);
      state.quizzes.with_quiz(id, |quiz| quiz.recorded = false);
      Err(e)
    }
  }
}

/// POST /api/quiz
pub async fn start_quiz(
  State(state): State<AppState>,
  Json(req): Json<StartQuizRequest>,
) -> Result<(StatusCode, Json<QuizStateResponse>), ApiError> {
  let topic = req.topic.unwrap_or_else(|| ALL_TOPICS.to_string());

  let game = {
    let conn = try_lock(&state.db)?;
    let cards = library(&state, &conn)?;
    let deck = deck_for_topic(&cards, &conn, &topic)?;

    let saved = db::get_quiz_settings(&conn).log_warn("Failed to read quiz settings").flatten();
    let preference = req.settings.preference(saved);

    let game = QuizGame::start(&topic, &deck, &cards, preference.clamped(deck.len()), &mut rand::rng())?;
    // Saved unfitted, so a small deck does not shrink the next game's count
    db::set_quiz_settings(&conn, &preference).log_warn("Failed to save quiz settings");
    game
  };

  let id = state.quizzes.insert(game);
  let response = state
    .quizzes
    .with_quiz(&id, |quiz| state_response(&id, &quiz.game))
    .ok_or_else(|| unknown_quiz(&id))?;

  tracing::info!("Started quiz {} on {}", id, topic);
  Ok((StatusCode::CREATED, Json(response)))
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
  pub topic: String,
  pub deck_size: usize,
  pub settings: QuizSettings,
  pub min_time_limit_secs: u32,
  pub max_time_limit_secs: u32,
  pub time_limit_step_secs: u32,
}

/// GET /api/quiz/settings?topic=
///
/// Settings a new game on this topic would start with.
pub async fn quiz_settings(
  State(state): State<AppState>,
  Query(query): Query<TopicQuery>,
) -> Result<Json<SettingsResponse>, ApiError> {
  let topic = query.topic.unwrap_or_else(|| ALL_TOPICS.to_string());
  let conn = try_lock(&state.db)?;
  let cards = library(&state, &conn)?;
  let deck_size = deck_for_topic(&cards, &conn, &topic)?
    .iter()
    .filter(|c| c.has_title())
    .count();

  let saved = db::get_quiz_settings(&conn).log_warn("Failed to read quiz settings").flatten();
  let settings = QuizSettingsRequest::default().resolve(deck_size, saved);

  Ok(Json(SettingsResponse {
    topic,
    deck_size,
    settings,
    min_time_limit_secs: config::MIN_TIME_LIMIT_SECS,
    max_time_limit_secs: config::MAX_TIME_LIMIT_SECS,
    time_limit_step_secs: config::TIME_LIMIT_STEP_SECS,
  }))
}

/// GET /api/quiz/{id}
pub async fn quiz_state(
  State(state): State<AppState>,
  Path(id): Path<String>,
) -> Result<Json<QuizStateResponse>, ApiError> {
  let (response, unsaved) = state
    .quizzes
    .with_quiz(&id, |quiz| (state_response(&id, &quiz.game), claim_record(quiz)))
    .ok_or_else(|| unknown_quiz(&id))?;

  if let Some(record) = unsaved {
    save_record(&state, &id, &record)?;
  }
  Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
  /// Omitted or null when the timer ran out
  #[serde(default)]
  pub answer: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
  pub feedback: Feedback,
  pub next: Option<Question>,
  pub result: Option<QuizResult>,
}

/// POST /api/quiz/{id}/answer
pub async fn submit_answer(
  State(state): State<AppState>,
  Path(id): Path<String>,
  Json(req): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, ApiError> {
  let (response, record): (AnswerResponse, Option<GameRecord>) = state
    .quizzes
    .with_quiz(&id, |quiz| {
      let elapsed = quiz.asked_at.elapsed();
      let feedback = quiz.game.answer(req.answer.as_deref(), elapsed)?;
      quiz.asked_at = Instant::now();

      let finished = quiz.game.is_finished();
      let record = claim_record(quiz);

      Ok::<_, ApiError>((
        AnswerResponse {
          feedback,
          next: quiz.game.current_question(),
          result: finished.then(|| quiz_result(&quiz.game)),
        },
        record,
      ))
    })
    .ok_or_else(|| unknown_quiz(&id))??;

  if let Some(record) = record {
    save_record(&state, &id, &record)?;
  }

  Ok(Json(response))
}

/// DELETE /api/quiz/{id}
///
/// Quitting mid-game discards it without touching the history.
pub async fn abandon_quiz(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
  if state.quizzes.remove(&id) {
    tracing::debug!("Quiz {} abandoned", id);
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(unknown_quiz(&id))
  }
}
