//! Quiz game: deck selection, question generation and scoring.
//!
//! A game draws up to `question_count` distinct cards from the topic deck.
//! Each question shows a card's image; the answer is its title, either picked
//! from four options or typed. Answers after the time limit count as wrong.

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::choices::{distinct_titles, generate_choices};
use crate::config;
use crate::domain::{AnswerRecord, Card, CardId, GameRecord, InputMode, ALL_TOPICS};
use crate::validation::validate_answer;

/// Game settings after clamping to the deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSettings {
  pub question_count: usize,
  pub time_limit_secs: u32,
  pub input_mode: InputMode,
}

impl QuizSettings {
  /// Defaults for a deck of `deck_len` cards
  pub fn for_deck(deck_len: usize) -> Self {
    Self {
      question_count: config::DEFAULT_QUESTION_COUNT.min(deck_len.max(1)),
      time_limit_secs: config::DEFAULT_TIME_LIMIT_SECS,
      input_mode: InputMode::Choice,
    }
  }

  /// Clamp count to `[1, deck_len]` and the timer to its bounds
  pub fn clamped(self, deck_len: usize) -> Self {
    Self {
      question_count: self.question_count.clamp(1, deck_len.max(1)),
      time_limit_secs: self
        .time_limit_secs
        .clamp(config::MIN_TIME_LIMIT_SECS, config::MAX_TIME_LIMIT_SECS),
      input_mode: self.input_mode,
    }
  }

  pub fn time_limit(&self) -> Duration {
    Duration::from_secs(u64::from(self.time_limit_secs))
  }
}

/// Partial settings from a client; missing fields take deck defaults
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuizSettingsRequest {
  pub question_count: Option<usize>,
  pub time_limit_secs: Option<u32>,
  pub input_mode: Option<InputMode>,
}

impl QuizSettingsRequest {
  /// Requested values over the saved ones, not yet fitted to a deck.
  ///
  /// The timer is bounded and the count is at least one; the count has no
  /// upper limit.
  pub fn preference(&self, saved: Option<QuizSettings>) -> QuizSettings {
    let base = saved.unwrap_or_else(|| QuizSettings::for_deck(config::DEFAULT_QUESTION_COUNT));
    QuizSettings {
      question_count: self.question_count.unwrap_or(base.question_count),
      time_limit_secs: self.time_limit_secs.unwrap_or(base.time_limit_secs),
      input_mode: self.input_mode.unwrap_or(base.input_mode),
    }
    .clamped(usize::MAX)
  }

  /// Settings for a game on a deck of `deck_len` cards
  pub fn resolve(&self, deck_len: usize, saved: Option<QuizSettings>) -> QuizSettings {
    self.preference(saved).clamped(deck_len)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
  /// The topic has no answerable cards
  EmptyDeck,
  /// The library cannot supply enough distinct options
  NotEnoughCards { available: usize },
  /// The game already ended
  Finished,
}

impl std::fmt::Display for QuizError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      QuizError::EmptyDeck => write!(f, "No cards in this deck to test"),
      QuizError::NotEnoughCards { available } => write!(
        f,
        "Not enough cards in the library to generate options: need at least {}, have {}",
        config::MIN_LIBRARY_ANSWERS,
        available
      ),
      QuizError::Finished => write!(f, "Quiz already finished"),
    }
  }
}

impl QuizError {
  /// Message shown to the player
  pub fn user_message(&self) -> String {
    match self {
      QuizError::EmptyDeck => "This deck has no cards with answers to quiz on.".to_string(),
      other => other.to_string(),
    }
  }
}

impl std::error::Error for QuizError {}

/// Question as sent to the player
#[derive(Debug, Clone, Serialize)]
pub struct Question {
  pub round: usize,
  pub total: usize,
  pub card_id: CardId,
  pub image_path: String,
  pub description: String,
  pub source: String,
  pub input_mode: InputMode,
  /// Empty in typing mode
  pub options: Vec<String>,
  pub time_limit_secs: u32,
  pub score: u32,
}

/// Outcome of one answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
  pub round: usize,
  pub correct: bool,
  pub timed_out: bool,
  pub correct_answer: String,
  pub points: u32,
  pub score: u32,
  pub finished: bool,
}

#[derive(Debug, Clone)]
pub struct QuizGame {
  topic: String,
  settings: QuizSettings,
  deck: Vec<Card>,
  /// Options per deck entry, empty in typing mode
  options: Vec<Vec<String>>,
  round: usize,
  score: u32,
  history: Vec<AnswerRecord>,
}

impl QuizGame {
  /// Start a game over `deck`, drawing distractors from `library`.
  pub fn start<R: Rng + ?Sized>(
    topic: &str,
    deck: &[Card],
    library: &[Card],
    settings: QuizSettings,
    rng: &mut R,
  ) -> Result<Self, QuizError> {
    let available = distinct_titles(library).len();
    if available < config::MIN_LIBRARY_ANSWERS {
      return Err(QuizError::NotEnoughCards { available });
    }

    let mut playable: Vec<Card> = deck.iter().filter(|c| c.has_title()).cloned().collect();
    if playable.is_empty() {
      return Err(QuizError::EmptyDeck);
    }

    let settings = settings.clamped(playable.len());
    playable.shuffle(rng);
    playable.truncate(settings.question_count);

    let options = playable
      .iter()
      .map(|card| match settings.input_mode {
        InputMode::Choice => generate_choices(card, library, rng),
        InputMode::Type => Vec::new(),
      })
      .collect();

    tracing::debug!(
      "Quiz started: topic={} questions={} mode={}",
      topic,
      playable.len(),
      settings.input_mode.as_str()
    );

    Ok(Self {
      topic: topic.to_string(),
      settings,
      deck: playable,
      options,
      round: 0,
      score: 0,
      history: Vec::new(),
    })
  }

  pub fn settings(&self) -> &QuizSettings {
    &self.settings
  }

  pub fn topic(&self) -> &str {
    &self.topic
  }

  pub fn score(&self) -> u32 {
    self.score
  }

  pub fn history(&self) -> &[AnswerRecord] {
    &self.history
  }

  pub fn total(&self) -> usize {
    self.deck.len()
  }

  pub fn is_finished(&self) -> bool {
    self.round >= self.deck.len()
  }

  pub fn current_question(&self) -> Option<Question> {
    let card = self.deck.get(self.round)?;
    Some(Question {
      round: self.round + 1,
      total: self.deck.len(),
      card_id: card.id.clone(),
      image_path: card.image_path.clone(),
      description: card.description.clone(),
      source: card.source.clone(),
      input_mode: self.settings.input_mode,
      options: self.options[self.round].clone(),
      time_limit_secs: self.settings.time_limit_secs,
      score: self.score,
    })
  }

  /// Answer the current question. `None` means the timer ran out.
  pub fn answer(&mut self, answer: Option<&str>, elapsed: Duration) -> Result<Feedback, QuizError> {
    let card = self.deck.get(self.round).ok_or(QuizError::Finished)?;

    let timed_out = answer.is_none() || elapsed > self.settings.time_limit();
    let correct = !timed_out
      && answer.is_some_and(|given| match self.settings.input_mode {
        InputMode::Choice => given == card.title,
        InputMode::Type => validate_answer(given, &card.title).is_correct(),
      });

    let points = if correct {
      // Seconds left on the countdown as displayed
      let remaining = u64::from(self.settings.time_limit_secs).saturating_sub(elapsed.as_secs());
      config::BASE_POINTS + remaining as u32
    } else {
      0
    };
    self.score += points;

    self.history.push(AnswerRecord {
      round: (self.round + 1) as u32,
      card_id: card.id.clone(),
      title: card.title.clone(),
      source: card.source.clone(),
      user_answer: answer.map(str::to_string),
      correct,
      timed_out,
      points,
    });

    let feedback = Feedback {
      round: self.round + 1,
      correct,
      timed_out,
      correct_answer: card.title.clone(),
      points,
      score: self.score,
      finished: self.round + 1 >= self.deck.len(),
    };
    self.round += 1;

    Ok(feedback)
  }

  /// History entry for a finished (or abandoned) game
  pub fn to_record(&self) -> GameRecord {
    let topic = if self.topic.is_empty() || self.topic == ALL_TOPICS {
      config::MIXED_TOPIC.to_string()
    } else {
      self.topic.clone()
    };
    GameRecord {
      score: self.score,
      date: Utc::now(),
      topic,
      input_mode: self.settings.input_mode,
      details: self.history.clone(),
    }
  }
}
