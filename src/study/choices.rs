//! Multiple choice option generation.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config;
use crate::domain::Card;

/// Distinct non-empty titles in the library
pub fn distinct_titles(library: &[Card]) -> Vec<&str> {
  let mut titles: Vec<&str> = library
    .iter()
    .filter(|c| c.has_title())
    .map(|c| c.title.as_str())
    .collect();
  titles.sort_unstable();
  titles.dedup();
  titles
}

/// Generate multiple choice options for a card with fallback expansion.
///
/// Distractors come from two pools:
/// 1. Titles from the same source (most plausible)
/// 2. Any other title in the library
///
/// Returns the correct title plus up to [`config::DISTRACTOR_COUNT`] distractors, shuffled.
pub fn generate_choices<R: Rng + ?Sized>(card: &Card, library: &[Card], rng: &mut R) -> Vec<String> {
  let correct = card.title.clone();
  let needed = config::DISTRACTOR_COUNT;

  // --- Phase 1: Same source ---
  let mut distractors: Vec<String> = library
    .iter()
    .filter(|c| c.id != card.id && c.source == card.source && c.has_title() && c.title != correct)
    .map(|c| c.title.clone())
    .collect();
  distractors.sort();
  distractors.dedup();
  distractors.shuffle(rng);
  distractors.truncate(needed);

  // --- Phase 2: Rest of the library ---
  if distractors.len() < needed {
    let mut others: Vec<String> = library
      .iter()
      .filter(|c| {
        c.id != card.id && c.has_title() && c.title != correct && !distractors.contains(&c.title)
      })
      .map(|c| c.title.clone())
      .collect();
    others.sort();
    others.dedup();
    others.shuffle(rng);
    others.truncate(needed - distractors.len());
    distractors.extend(others);
  }

  let mut choices = vec![correct];
  choices.extend(distractors);
  choices.shuffle(rng);

  choices
}
