//! PDF upload into the custom deck.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use super::{read_upload, ApiError};
use crate::db::{self, try_lock};
use crate::domain::Card;
use crate::import::{self, ImportError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ImportResponse {
  pub imported: usize,
  pub source: String,
  pub cards: Vec<Card>,
}

/// POST /api/import (multipart field `file`)
///
/// One card per page; the cards join the library immediately.
pub async fn import_pdf(
  State(state): State<AppState>,
  mut multipart: Multipart,
) -> Result<(StatusCode, Json<ImportResponse>), ApiError> {
  let upload = read_upload(&mut multipart, "file").await?;
  if !import::is_pdf_upload(&upload.file_name, upload.content_type.as_deref()) {
    tracing::warn!("Rejected upload {:?} ({:?})", upload.file_name, upload.content_type);
    return Err(ImportError::InvalidFile.into());
  }

  let file_name = upload.file_name.clone();
  let timestamp_ms = Utc::now().timestamp_millis();
  let cards = tokio::task::spawn_blocking(move || {
    import::import_pdf(&upload.file_name, &upload.bytes, timestamp_ms, |percent| {
      tracing::debug!("Importing {}: {}%", upload.file_name, percent);
    })
  })
  .await
  .map_err(|e| {
    tracing::error!("Import task failed: {}", e);
    ApiError::Internal("Failed to process PDF".to_string())
  })??;

  {
    let conn = try_lock(&state.db)?;
    db::append_custom_cards(&conn, &cards)?;
  }

  let source = import::source_name(&file_name);
  tracing::info!("Added {} cards from {}", cards.len(), file_name);
  Ok((StatusCode::CREATED, Json(ImportResponse { imported: cards.len(), source, cards })))
}
