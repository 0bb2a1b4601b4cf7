//! Export and restore of imported cards and quiz history.

use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

use super::{read_upload, ApiError};
use crate::db::try_lock;
use crate::services::backup::{self, ImportResult};
use crate::state::AppState;

/// GET /api/backup
pub async fn export_data(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
  let zip_bytes = {
    let conn = try_lock(&state.db)?;
    backup::create_export_zip(&conn)?
  };

  let filename = format!("review_deck_{}.zip", Utc::now().format("%Y%m%d"));
  tracing::info!("Exported backup {} ({} bytes)", filename, zip_bytes.len());

  Ok((
    [
      (header::CONTENT_TYPE, "application/zip".to_string()),
      (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
    ],
    zip_bytes,
  ))
}

/// POST /api/backup (multipart field `file`)
///
/// Merges into local data: existing cards and games are kept.
pub async fn import_data(
  State(state): State<AppState>,
  mut multipart: Multipart,
) -> Result<Json<ImportResult>, ApiError> {
  let upload = read_upload(&mut multipart, "file").await?;
  let conn = try_lock(&state.db)?;
  let result = backup::import_backup(&conn, &upload.bytes)?;
  tracing::info!(
    "Backup restored: {} cards added, {} skipped, {} games added",
    result.cards_added,
    result.cards_skipped,
    result.games_added
  );
  Ok(Json(result))
}
