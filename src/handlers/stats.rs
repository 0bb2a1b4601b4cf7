//! Scoreboard, last session and mistake review.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::{library, ApiError};
use crate::db::{self, try_lock, Mistake, StatsSummary};
use crate::domain::{Card, GameRecord};
use crate::state::AppState;

/// GET /api/stats
pub async fn summary(State(state): State<AppState>) -> Result<Json<StatsSummary>, ApiError> {
  let conn = try_lock(&state.db)?;
  Ok(Json(db::get_stats_summary(&conn)?))
}

#[derive(Debug, Serialize)]
pub struct LastSessionResponse {
  /// None before the first finished game
  pub game: Option<GameRecord>,
  pub correct: usize,
  pub total: usize,
}

/// GET /api/stats/last-session
pub async fn last_session(State(state): State<AppState>) -> Result<Json<LastSessionResponse>, ApiError> {
  let conn = try_lock(&state.db)?;
  let game = db::get_last_session(&conn)?;
  let (correct, total) = game
    .as_ref()
    .map(|g| (g.correct_count(), g.details.len()))
    .unwrap_or_default();
  Ok(Json(LastSessionResponse { game, correct, total }))
}

/// GET /api/mistakes
pub async fn mistakes(State(state): State<AppState>) -> Result<Json<Vec<Mistake>>, ApiError> {
  let conn = try_lock(&state.db)?;
  Ok(Json(db::get_mistakes(&conn)?))
}

/// GET /api/mistakes/deck
///
/// Missed cards still in the library, ready for review or a quiz.
pub async fn mistake_deck(State(state): State<AppState>) -> Result<Json<Vec<Card>>, ApiError> {
  let conn = try_lock(&state.db)?;
  let cards = library(&state, &conn)?;
  let mistakes = db::get_mistakes(&conn)?;
  Ok(Json(db::mistake_deck(&cards, &mistakes)))
}
