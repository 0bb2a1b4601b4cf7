//! Typed-answer validation for the quiz.
//!
//! Card titles come straight out of PDF text, so matching is forgiving about
//! the things extraction mangles and people skip when typing:
//! - case, punctuation and repeated whitespace
//! - compatibility forms (full-width letters, ligatures) via NFKC
//! - `(info)` trailing a title, e.g. `Basil (Ocimum basilicum)`
//! - `a / b` alternatives
//! - small typos, scaled by answer length

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Result of answer validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerResult {
  /// Normalized input equals an accepted answer
  Correct,
  /// Within typo tolerance of an accepted answer
  CloseEnough,
  Incorrect,
}

impl AnswerResult {
  pub fn is_correct(&self) -> bool {
    !matches!(self, Self::Incorrect)
  }
}

/// Normalize text for comparison: NFKC, lowercase, alphanumerics only, single spaces.
pub fn normalize_answer(input: &str) -> String {
  input
    .nfkc()
    .collect::<String>()
    .to_lowercase()
    .chars()
    .map(|c| if c.is_alphanumeric() { c } else { ' ' })
    .collect::<String>()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}

/// Remove `( ... )` groups, handling nesting
fn strip_parenthetical(input: &str) -> String {
  let mut depth = 0usize;
  let mut out = String::with_capacity(input.len());
  for ch in input.chars() {
    match ch {
      '(' => depth += 1,
      ')' if depth > 0 => depth -= 1,
      _ if depth == 0 => out.push(ch),
      _ => {}
    }
  }
  out
}

/// All normalized forms accepted for `expected`
fn accepted_answers(expected: &str) -> Vec<String> {
  let mut accepted: Vec<String> = Vec::new();
  let mut push = |s: String| {
    if !s.is_empty() && !accepted.contains(&s) {
      accepted.push(s);
    }
  };

  push(normalize_answer(expected));

  let core = strip_parenthetical(expected);
  push(normalize_answer(&core));

  if core.contains('/') {
    for part in core.split('/') {
      push(normalize_answer(part));
    }
  }

  accepted
}

/// Calculate simple Levenshtein distance between two strings
fn levenshtein_distance(a: &str, b: &str) -> usize {
  let a_chars: Vec<char> = a.chars().collect();
  let b_chars: Vec<char> = b.chars().collect();

  if a_chars.is_empty() {
    return b_chars.len();
  }
  if b_chars.is_empty() {
    return a_chars.len();
  }

  let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
  let mut curr = vec![0usize; b_chars.len() + 1];

  for (i, a_ch) in a_chars.iter().enumerate() {
    curr[0] = i + 1;
    for (j, b_ch) in b_chars.iter().enumerate() {
      let cost = if a_ch == b_ch { 0 } else { 1 };
      curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
    }
    std::mem::swap(&mut prev, &mut curr);
  }

  prev[b_chars.len()]
}

/// Typo tolerance based on answer length
fn max_typo_distance(char_count: usize) -> usize {
  match char_count {
    0..=2 => 0,
    3..=4 => 1,
    _ => 2,
  }
}

/// Validate a typed answer against a card title
pub fn validate_answer(user_input: &str, expected: &str) -> AnswerResult {
  let input = normalize_answer(user_input);
  if input.is_empty() {
    return AnswerResult::Incorrect;
  }

  let accepted = accepted_answers(expected);
  if accepted.contains(&input) {
    return AnswerResult::Correct;
  }

  let close = accepted.iter().any(|answer| {
    let distance = levenshtein_distance(&input, answer);
    distance <= max_typo_distance(answer.chars().count())
  });

  if close {
    AnswerResult::CloseEnough
  } else {
    AnswerResult::Incorrect
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_exact_match() {
    assert_eq!(validate_answer("Oak", "Oak"), AnswerResult::Correct);
    assert_eq!(validate_answer("sweet basil", "Sweet Basil"), AnswerResult::Correct);
  }

  #[test]
  fn test_punctuation_and_whitespace_ignored() {
    assert_eq!(validate_answer("  st. john's   wort ", "St John's-Wort"), AnswerResult::Correct);
  }

  #[test]
  fn test_full_width_input() {
    assert_eq!(validate_answer("ＯＡＫ", "oak"), AnswerResult::Correct);
  }

  #[test]
  fn test_parenthetical_optional() {
    assert_eq!(validate_answer("basil", "Basil (Ocimum basilicum)"), AnswerResult::Correct);
    assert_eq!(
      validate_answer("basil ocimum basilicum", "Basil (Ocimum basilicum)"),
      AnswerResult::Correct
    );
  }

  #[test]
  fn test_slash_alternatives() {
    assert_eq!(validate_answer("maize", "Corn / Maize"), AnswerResult::Correct);
    assert_eq!(validate_answer("corn", "Corn / Maize"), AnswerResult::Correct);
  }

  #[test]
  fn test_close_match() {
    assert_eq!(validate_answer("rosemery", "Rosemary"), AnswerResult::CloseEnough);
    assert_eq!(validate_answer("rosmary", "Rosemary"), AnswerResult::CloseEnough);
    assert_eq!(validate_answer("elk", "elm"), AnswerResult::CloseEnough);
  }

  #[test]
  fn test_short_answers_need_exact() {
    assert_eq!(validate_answer("ox", "ax"), AnswerResult::Incorrect);
  }

  #[test]
  fn test_incorrect() {
    assert_eq!(validate_answer("pine", "Rosemary"), AnswerResult::Incorrect);
    assert_eq!(validate_answer("", "Oak"), AnswerResult::Incorrect);
    assert_eq!(validate_answer("!!!", "Oak"), AnswerResult::Incorrect);
  }

  #[test]
  fn test_levenshtein() {
    assert_eq!(levenshtein_distance("", "abc"), 3);
    assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    assert_eq!(levenshtein_distance("same", "same"), 0);
  }

  #[test]
  fn test_is_correct() {
    assert!(AnswerResult::Correct.is_correct());
    assert!(AnswerResult::CloseEnough.is_correct());
    assert!(!AnswerResult::Incorrect.is_correct());
  }
}
