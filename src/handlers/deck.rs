//! Deck browsing and card review.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{deck_for_topic, library, ApiError};
use crate::db::{self, try_lock, LogOnError};
use crate::domain::{topics as source_topics, Card, CardId, ALL_TOPICS};
use crate::state::AppState;
use crate::study::{DeckCursor, Move};

#[derive(Debug, Serialize)]
pub struct TopicInfo {
  pub name: String,
  pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct TopicsResponse {
  /// "All" first, then sources in library order
  pub topics: Vec<TopicInfo>,
  /// Size of the mistake deck
  pub mistakes: usize,
}

/// GET /api/topics
pub async fn topics(State(state): State<AppState>) -> Result<Json<TopicsResponse>, ApiError> {
  let conn = try_lock(&state.db)?;
  let cards = library(&state, &conn)?;

  let mut topics = vec![TopicInfo { name: ALL_TOPICS.to_string(), count: cards.len() }];
  topics.extend(source_topics(&cards).into_iter().map(|name| TopicInfo {
    count: cards.iter().filter(|c| c.source == name).count(),
    name,
  }));

  let mistakes = db::get_mistakes(&conn)
    .map(|m| db::mistake_deck(&cards, &m).len())
    .log_warn_default("Failed to count mistakes");

  Ok(Json(TopicsResponse { topics, mistakes }))
}

#[derive(Debug, Deserialize)]
pub struct TopicQuery {
  pub topic: Option<String>,
}

/// GET /api/deck?topic=
pub async fn deck(
  State(state): State<AppState>,
  Query(query): Query<TopicQuery>,
) -> Result<Json<Vec<Card>>, ApiError> {
  let topic = query.topic.as_deref().unwrap_or(ALL_TOPICS);
  let conn = try_lock(&state.db)?;
  let cards = library(&state, &conn)?;
  Ok(Json(deck_for_topic(&cards, &conn, topic)?))
}

#[derive(Debug, Deserialize)]
pub struct ReviewQuery {
  pub topic: Option<String>,
  #[serde(default)]
  pub index: usize,
  #[serde(default)]
  pub action: Move,
}

/// Question side of a card
#[derive(Debug, Serialize)]
pub struct CardFront {
  pub image_path: String,
  pub description: String,
}

/// Answer side of a card
#[derive(Debug, Serialize)]
pub struct CardBack {
  pub title: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewCard {
  pub id: CardId,
  pub source: String,
  pub front: CardFront,
  pub back: CardBack,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
  pub topic: String,
  pub index: usize,
  /// 1-based position for display
  pub position: usize,
  pub total: usize,
  /// None when the deck is empty
  pub card: Option<ReviewCard>,
}

/// GET /api/review?topic=&index=&action=next|prev|random
pub async fn review(
  State(state): State<AppState>,
  Query(query): Query<ReviewQuery>,
) -> Result<Json<ReviewResponse>, ApiError> {
  let topic = query.topic.unwrap_or_else(|| ALL_TOPICS.to_string());
  let cards = {
    let conn = try_lock(&state.db)?;
    let library = library(&state, &conn)?;
    deck_for_topic(&library, &conn, &topic)?
  };

  let Some(mut cursor) = DeckCursor::at(cards.len(), query.index) else {
    return Ok(Json(ReviewResponse { topic, index: 0, position: 0, total: 0, card: None }));
  };

  let index = cursor.apply(query.action, &mut rand::rng());
  let card = &cards[index];
  let (position, total) = cursor.position();

  Ok(Json(ReviewResponse {
    topic,
    index,
    position,
    total,
    card: Some(ReviewCard {
      id: card.id.clone(),
      source: card.source.clone(),
      front: CardFront {
        image_path: card.image_path.clone(),
        description: card.display_description().to_string(),
      },
      back: CardBack { title: card.display_title().to_string() },
    }),
  }))
}
