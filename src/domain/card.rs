use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Topic name that selects every card in the library
pub const ALL_TOPICS: &str = "All";

/// Card identifier.
///
/// Built-in decks number their cards (`0, 1, 2...`), imported decks use
/// `custom_<timestamp>_<page>`. Both forms end up as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  /// Id for page `page` of a PDF imported at `timestamp_ms`
  pub fn custom(timestamp_ms: i64, page: u32) -> Self {
    Self(format!("custom_{}_{}", timestamp_ms, page))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn is_custom(&self) -> bool {
    self.0.starts_with("custom_")
  }
}

impl fmt::Display for CardId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<u64> for CardId {
  fn from(id: u64) -> Self {
    Self(id.to_string())
  }
}

impl<'de> Deserialize<'de> for CardId {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
      Number(u64),
      Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
      RawId::Number(n) => CardId::from(n),
      RawId::Text(s) => CardId(s),
    })
  }
}

/// A review card: the image and description are the front, the title is the answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
  pub id: CardId,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub description: String,
  /// Relative path (`./cards/x.png`) or a `data:` URL for imported cards
  #[serde(default)]
  pub image_path: String,
  #[serde(default)]
  pub source: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub page: Option<u32>,
  #[serde(default)]
  pub is_custom: bool,
}

impl Card {
  pub fn new(id: CardId, title: impl Into<String>, source: impl Into<String>) -> Self {
    Self {
      id,
      title: title.into(),
      description: String::new(),
      image_path: String::new(),
      source: source.into(),
      page: None,
      is_custom: false,
    }
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = description.into();
    self
  }

  pub fn with_image(mut self, image_path: impl Into<String>) -> Self {
    self.image_path = image_path.into();
    self
  }

  pub fn has_title(&self) -> bool {
    !self.title.trim().is_empty()
  }

  /// Text shown on the answer side
  pub fn display_title(&self) -> &str {
    if self.has_title() { &self.title } else { "Untitled" }
  }

  /// Text shown next to the image on the question side
  pub fn display_description(&self) -> &str {
    if self.description.trim().is_empty() {
      "No description available."
    } else {
      &self.description
    }
  }
}

/// Unique card sources in first-seen order
pub fn topics(cards: &[Card]) -> Vec<String> {
  let mut seen: Vec<String> = Vec::new();
  for card in cards {
    if !seen.iter().any(|s| s == &card.source) {
      seen.push(card.source.clone());
    }
  }
  seen
}

/// Cards belonging to `topic`; [`ALL_TOPICS`] keeps everything
pub fn filter_by_topic<'a>(cards: &'a [Card], topic: &str) -> Vec<&'a Card> {
  if topic == ALL_TOPICS {
    cards.iter().collect()
  } else {
    cards.iter().filter(|c| c.source == topic).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn card(id: u64, title: &str, source: &str) -> Card {
    Card::new(CardId::from(id), title, source)
  }

  #[test]
  fn test_card_id_from_number_and_string() {
    let cards: Vec<Card> = serde_json::from_str(
      r#"[{"id": 3, "title": "Oak", "source": "trees"},
          {"id": "custom_17_2", "title": "Elm", "source": "trees", "isCustom": true}]"#,
    )
    .unwrap();

    assert_eq!(cards[0].id.as_str(), "3");
    assert!(!cards[0].id.is_custom());
    assert_eq!(cards[1].id.as_str(), "custom_17_2");
    assert!(cards[1].id.is_custom());
    assert!(cards[1].is_custom);
  }

  #[test]
  fn test_card_serializes_camel_case() {
    let c = card(1, "Oak", "trees").with_image("./cards/oak.png");
    let json = serde_json::to_value(&c).unwrap();
    assert_eq!(json["imagePath"], "./cards/oak.png");
    assert_eq!(json["isCustom"], false);
    assert_eq!(json["id"], "1");
    assert!(json.get("page").is_none());
  }

  #[test]
  fn test_custom_id_format() {
    assert_eq!(CardId::custom(1700000000000, 4).as_str(), "custom_1700000000000_4");
  }

  #[test]
  fn test_display_fallbacks() {
    let c = card(1, "  ", "trees");
    assert_eq!(c.display_title(), "Untitled");
    assert_eq!(c.display_description(), "No description available.");

    let c = card(2, "Oak", "trees").with_description("Tall tree");
    assert_eq!(c.display_title(), "Oak");
    assert_eq!(c.display_description(), "Tall tree");
  }

  #[test]
  fn test_topics_first_seen_order() {
    let cards = vec![
      card(0, "a", "zoology"),
      card(1, "b", "botany"),
      card(2, "c", "zoology"),
    ];
    assert_eq!(topics(&cards), vec!["zoology", "botany"]);
  }

  #[test]
  fn test_filter_by_topic() {
    let cards = vec![card(0, "a", "zoology"), card(1, "b", "botany")];

    assert_eq!(filter_by_topic(&cards, ALL_TOPICS).len(), 2);

    let botany = filter_by_topic(&cards, "botany");
    assert_eq!(botany.len(), 1);
    assert_eq!(botany[0].title, "b");

    assert!(filter_by_topic(&cards, "geology").is_empty());
  }
}
