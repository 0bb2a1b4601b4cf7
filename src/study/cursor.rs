//! Review deck navigation.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Navigation requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Move {
  /// Stay on the given index
  #[default]
  Stay,
  Next,
  Prev,
  Random,
}

/// Position within a non-empty deck. Moves wrap around at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeckCursor {
  len: usize,
  index: usize,
}

impl DeckCursor {
  /// Cursor at the first card, or None for an empty deck
  pub fn new(len: usize) -> Option<Self> {
    Self::at(len, 0)
  }

  /// Cursor at `index` (wrapped into range), or None for an empty deck
  pub fn at(len: usize, index: usize) -> Option<Self> {
    (len > 0).then(|| Self { len, index: index % len })
  }

  pub fn index(&self) -> usize {
    self.index
  }

  pub fn len(&self) -> usize {
    self.len
  }

  /// 1-based position for display ("3 / 12")
  pub fn position(&self) -> (usize, usize) {
    (self.index + 1, self.len)
  }

  pub fn next(&mut self) -> usize {
    self.index = (self.index + 1) % self.len;
    self.index
  }

  pub fn prev(&mut self) -> usize {
    self.index = (self.index + self.len - 1) % self.len;
    self.index
  }

  /// Jump to a uniformly random card (may land on the current one)
  pub fn random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
    self.index = rng.random_range(0..self.len);
    self.index
  }

  pub fn apply<R: Rng + ?Sized>(&mut self, step: Move, rng: &mut R) -> usize {
    match step {
      Move::Stay => self.index,
      Move::Next => self.next(),
      Move::Prev => self.prev(),
      Move::Random => self.random(rng),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  #[test]
  fn test_empty_deck_has_no_cursor() {
    assert!(DeckCursor::new(0).is_none());
    assert!(DeckCursor::at(0, 5).is_none());
  }

  #[test]
  fn test_next_wraps() {
    let mut cursor = DeckCursor::at(3, 2).unwrap();
    assert_eq!(cursor.next(), 0);
    assert_eq!(cursor.next(), 1);
  }

  #[test]
  fn test_prev_wraps() {
    let mut cursor = DeckCursor::new(3).unwrap();
    assert_eq!(cursor.prev(), 2);
    assert_eq!(cursor.prev(), 1);
  }

  #[test]
  fn test_single_card_deck() {
    let mut cursor = DeckCursor::new(1).unwrap();
    assert_eq!(cursor.next(), 0);
    assert_eq!(cursor.prev(), 0);
  }

  #[test]
  fn test_out_of_range_index_wraps() {
    let cursor = DeckCursor::at(4, 9).unwrap();
    assert_eq!(cursor.index(), 1);
    assert_eq!(cursor.position(), (2, 4));
  }

  #[test]
  fn test_random_stays_in_range() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut cursor = DeckCursor::new(5).unwrap();
    for _ in 0..50 {
      assert!(cursor.apply(Move::Random, &mut rng) < 5);
    }
  }

  #[test]
  fn test_move_deserialize() {
    let step: Move = serde_json::from_str("\"prev\"").unwrap();
    assert_eq!(step, Move::Prev);
  }
}
