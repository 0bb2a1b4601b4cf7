//! Dictionary full-text search.
//!
//! Matching is a case-insensitive substring test per content line, after NFKC
//! so full-width and ligature forms match their plain spelling.

use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

use crate::config;
use crate::domain::DictionaryFile;

/// A dictionary page with at least one matching line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
  pub source: String,
  pub page: u32,
  pub title: String,
  pub image_path: String,
  /// Every matching line, in page order
  pub matches: Vec<String>,
  /// First few matching lines for the result list
  pub snippets: Vec<String>,
  /// Matches not shown in `snippets`
  pub more_matches: usize,
  pub full_content: Vec<String>,
}

fn fold(text: &str) -> String {
  text.nfkc().collect::<String>().to_lowercase()
}

/// Search every page of every file. A blank query matches nothing.
pub fn search(dictionary: &[DictionaryFile], query: &str) -> Vec<SearchHit> {
  let needle = fold(query.trim());
  if needle.is_empty() {
    return Vec::new();
  }

  let mut hits = Vec::new();
  for file in dictionary {
    for page in &file.pages {
      let matches: Vec<String> = page
        .content
        .iter()
        .filter(|line| fold(line).contains(&needle))
        .cloned()
        .collect();
      if matches.is_empty() {
        continue;
      }

      let snippets: Vec<String> = matches.iter().take(config::SEARCH_SNIPPET_LIMIT).cloned().collect();
      hits.push(SearchHit {
        source: file.source.clone(),
        page: page.page,
        title: page.display_title(),
        image_path: page.image_path.clone(),
        more_matches: matches.len() - snippets.len(),
        snippets,
        matches,
        full_content: page.content.clone(),
      });
    }
  }

  tracing::debug!("Search {:?}: {} hits", query, hits.len());
  hits
}
