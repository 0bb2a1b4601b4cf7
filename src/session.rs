//! Simple in-memory storage for running quiz games.
//!
//! Games are keyed by a random id handed to the client. Entries auto-expire
//! after a configurable duration of inactivity.

use crate::config;
use crate::study::QuizGame;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// A game plus the moment its current question was shown
pub struct ActiveQuiz {
  pub game: QuizGame,
  pub asked_at: Instant,
  /// Set once the finished game has been written to the history
  pub recorded: bool,
}

impl ActiveQuiz {
  fn new(game: QuizGame) -> Self {
    Self { game, asked_at: Instant::now(), recorded: false }
  }
}

/// Session entry with last access time for expiration
struct SessionEntry {
  quiz: ActiveQuiz,
  last_access: DateTime<Utc>,
}

#[derive(Default)]
pub struct QuizStore {
  sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl QuizStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
    // A panic mid-update leaves at worst one stale game behind
    self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Store a new game and return its id
  pub fn insert(&self, game: QuizGame) -> String {
    let id = generate_session_id();
    let mut sessions = self.lock();

    // Clean up expired sessions occasionally (~10% chance)
    if rand::random::<u8>() < config::SESSION_CLEANUP_THRESHOLD {
      cleanup_expired(&mut sessions);
    }

    sessions.insert(
      id.clone(),
      SessionEntry {
        quiz: ActiveQuiz::new(game),
        last_access: Utc::now(),
      },
    );
    id
  }

  /// Run `f` on the game with this id, refreshing its expiry
  pub fn with_quiz<R>(&self, id: &str, f: impl FnOnce(&mut ActiveQuiz) -> R) -> Option<R> {
    let mut sessions = self.lock();
    let entry = sessions.get_mut(id)?;
    entry.last_access = Utc::now();
    Some(f(&mut entry.quiz))
  }

  pub fn remove(&self, id: &str) -> bool {
    self.lock().remove(id).is_some()
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Clean up expired sessions
fn cleanup_expired(sessions: &mut HashMap<String, SessionEntry>) {
  let expiry = Utc::now() - Duration::hours(config::SESSION_EXPIRY_HOURS);
  let before = sessions.len();
  sessions.retain(|_, entry| entry.last_access > expiry);
  if sessions.len() < before {
    tracing::debug!("Expired {} quiz sessions", before - sessions.len());
  }
}

/// Generate a new session ID
pub fn generate_session_id() -> String {
  use rand::Rng;
  let mut rng = rand::rng();
  (0..32)
    .map(|_| {
      let idx = rng.random_range(0..36);
      if idx < 10 {
        (b'0' + idx) as char
      } else {
        (b'a' + idx - 10) as char
      }
    })
    .collect()
}
