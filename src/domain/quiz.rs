use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CardId;

/// How the player answers a quiz question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
  /// Pick one of four options - exact matching
  #[default]
  Choice,
  /// Type the answer - tolerant matching
  Type,
}

impl InputMode {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Choice => "choice",
      Self::Type => "type",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "choice" => Some(Self::Choice),
      "type" => Some(Self::Type),
      _ => None,
    }
  }
}

/// One answered question of a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
  pub round: u32,
  pub card_id: CardId,
  pub title: String,
  pub source: String,
  /// None when the timer ran out
  pub user_answer: Option<String>,
  pub correct: bool,
  pub timed_out: bool,
  pub points: u32,
}

/// A finished game as stored in the history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
  pub score: u32,
  pub date: DateTime<Utc>,
  pub topic: String,
  pub input_mode: InputMode,
  pub details: Vec<AnswerRecord>,
}

impl GameRecord {
  pub fn correct_count(&self) -> usize {
    self.details.iter().filter(|d| d.correct).count()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_input_mode_roundtrip() {
    for mode in [InputMode::Choice, InputMode::Type] {
      assert_eq!(InputMode::from_str(mode.as_str()), Some(mode));
    }
    assert_eq!(InputMode::from_str("voice"), None);
  }

  #[test]
  fn test_input_mode_serde() {
    assert_eq!(serde_json::to_string(&InputMode::Type).unwrap(), "\"type\"");
    let mode: InputMode = serde_json::from_str("\"choice\"").unwrap();
    assert_eq!(mode, InputMode::Choice);
  }

  #[test]
  fn test_correct_count() {
    let answer = |correct| AnswerRecord {
      round: 1,
      card_id: CardId::new("1"),
      title: "Oak".into(),
      source: "trees".into(),
      user_answer: Some("Oak".into()),
      correct,
      timed_out: false,
      points: 0,
    };
    let game = GameRecord {
      score: 20,
      date: Utc::now(),
      topic: "trees".into(),
      input_mode: InputMode::Choice,
      details: vec![answer(true), answer(false), answer(true)],
    };
    assert_eq!(game.correct_count(), 2);
  }
}
