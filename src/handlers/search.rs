//! Dictionary search endpoint.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::search::{self as dictionary_search, SearchHit};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
  #[serde(default)]
  pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
  pub query: String,
  pub count: usize,
  pub results: Vec<SearchHit>,
}

/// GET /api/search?q=
pub async fn search(State(state): State<AppState>, Query(query): Query<SearchQuery>) -> Json<SearchResponse> {
  let results = dictionary_search::search(&state.dictionary, &query.q);
  Json(SearchResponse { count: results.len(), query: query.q, results })
}
