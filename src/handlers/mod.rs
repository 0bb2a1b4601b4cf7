//! Local JSON API.
//!
//! Every route answers JSON; errors render as `{"error": "<message>"}`.

pub mod backup;
pub mod deck;
pub mod import;
pub mod quiz;
pub mod search;
pub mod stats;

use axum::extract::{DefaultBodyLimit, Multipart};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rusqlite::Connection;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config;
use crate::db::{self, DbLockError};
use crate::domain::{filter_by_topic, Card};
use crate::import::ImportError;
use crate::services::backup::BackupError;
use crate::state::AppState;
use crate::study::QuizError;

/// Uploads (PDFs, backups) up to this size
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Build the application router
pub fn router(state: AppState) -> Router {
  let card_images = ServeDir::new(state.paths.card_images_dir());
  let dictionary_images = ServeDir::new(state.paths.dictionary_images_dir());

  Router::new()
    .route("/api/topics", get(deck::topics))
    .route("/api/deck", get(deck::deck))
    .route("/api/review", get(deck::review))
    .route("/api/quiz", post(quiz::start_quiz))
    .route("/api/quiz/settings", get(quiz::quiz_settings))
    .route("/api/quiz/{id}", get(quiz::quiz_state).delete(quiz::abandon_quiz))
    .route("/api/quiz/{id}/answer", post(quiz::submit_answer))
    .route("/api/search", get(search::search))
    .route("/api/stats", get(stats::summary))
    .route("/api/stats/last-session", get(stats::last_session))
    .route("/api/mistakes", get(stats::mistakes))
    .route("/api/mistakes/deck", get(stats::mistake_deck))
    .route("/api/import", post(import::import_pdf))
    .route("/api/backup", get(backup::export_data).post(backup::import_data))
    .nest_service("/cards", card_images)
    .nest_service("/dictionary_images", dictionary_images)
    .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// Error response for API handlers
#[derive(Debug)]
pub enum ApiError {
  BadRequest(String),
  NotFound(String),
  Conflict(String),
  Unprocessable(String),
  Unavailable,
  Internal(String),
}

impl ApiError {
  fn status(&self) -> StatusCode {
    match self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn message(&self) -> &str {
    match self {
      ApiError::BadRequest(m)
      | ApiError::NotFound(m)
      | ApiError::Conflict(m)
      | ApiError::Unprocessable(m)
      | ApiError::Internal(m) => m,
      ApiError::Unavailable => "Database unavailable",
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    (self.status(), Json(serde_json::json!({ "error": self.message() }))).into_response()
  }
}

impl From<DbLockError> for ApiError {
  fn from(_: DbLockError) -> Self {
    ApiError::Unavailable
  }
}

impl From<rusqlite::Error> for ApiError {
  fn from(e: rusqlite::Error) -> Self {
    tracing::error!("Database error: {}", e);
    ApiError::Internal("Database error".to_string())
  }
}

impl From<QuizError> for ApiError {
  fn from(e: QuizError) -> Self {
    match e {
      QuizError::Finished => ApiError::Conflict(e.user_message()),
      other => ApiError::Unprocessable(other.user_message()),
    }
  }
}

impl From<ImportError> for ApiError {
  fn from(e: ImportError) -> Self {
    match e {
      ImportError::InvalidFile => ApiError::BadRequest(e.user_message()),
      ImportError::Io(ref io) => {
        tracing::error!("Import write failed: {}", io);
        ApiError::Internal(e.user_message())
      }
      other => ApiError::Unprocessable(other.user_message()),
    }
  }
}

impl From<BackupError> for ApiError {
  fn from(e: BackupError) -> Self {
    match e {
      BackupError::Database(ref db) => {
        tracing::error!("Backup import failed: {}", db);
        ApiError::Internal(e.user_message())
      }
      other => ApiError::BadRequest(other.user_message()),
    }
  }
}

/// Built-in cards followed by imported cards in import order
pub(crate) fn library(state: &AppState, conn: &Connection) -> Result<Vec<Card>, ApiError> {
  let mut cards = state.builtin_cards.as_ref().clone();
  cards.extend(db::get_custom_cards(conn)?);
  Ok(cards)
}

/// Cards for a topic: a source deck, "All", or the mistake deck
pub(crate) fn deck_for_topic(library: &[Card], conn: &Connection, topic: &str) -> Result<Vec<Card>, ApiError> {
  if topic == config::MISTAKES_TOPIC {
    let mistakes = db::get_mistakes(conn)?;
    return Ok(db::mistake_deck(library, &mistakes));
  }
  Ok(filter_by_topic(library, topic).into_iter().cloned().collect())
}

/// A file read from a multipart upload
pub(crate) struct UploadedFile {
  pub file_name: String,
  pub content_type: Option<String>,
  pub bytes: Vec<u8>,
}

/// Read the multipart field `field_name`, skipping any others
pub(crate) async fn read_upload(multipart: &mut Multipart, field_name: &str) -> Result<UploadedFile, ApiError> {
  while let Ok(Some(field)) = multipart.next_field().await {
    if field.name() != Some(field_name) {
      continue;
    }
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field
      .bytes()
      .await
      .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
    return Ok(UploadedFile { file_name, content_type, bytes: bytes.to_vec() });
  }
  Err(ApiError::BadRequest("No file uploaded".to_string()))
}
