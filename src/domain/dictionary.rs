use serde::{Deserialize, Serialize};

/// One source PDF of the reference dictionary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryFile {
  pub source: String,
  pub pages: Vec<DictionaryPage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryPage {
  /// 1-based page number
  pub page: u32,
  #[serde(default)]
  pub title: String,
  /// Trimmed, non-empty text lines of the page
  #[serde(default)]
  pub content: Vec<String>,
  #[serde(rename = "imagePath", default)]
  pub image_path: String,
  #[serde(default)]
  pub raw_text: String,
}

impl DictionaryPage {
  /// Title to show, falling back to the page number
  pub fn display_title(&self) -> String {
    if self.title.trim().is_empty() {
      format!("Page {}", self.page)
    } else {
      self.title.clone()
    }
  }
}
