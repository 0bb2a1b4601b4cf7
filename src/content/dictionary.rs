//! Dictionary corpus loading.

use std::path::Path;

use super::{read_json_or_default, write_json, ContentLoadError};
use crate::domain::DictionaryFile;

/// Load `dictionary.json`; a missing file yields an empty corpus.
pub fn load_dictionary(path: &Path) -> Result<Vec<DictionaryFile>, ContentLoadError> {
    let files: Vec<DictionaryFile> = read_json_or_default(path)?;
    let pages: usize = files.iter().map(|f| f.pages.len()).sum();
    tracing::debug!("Loaded dictionary: {} files, {} pages", files.len(), pages);
    Ok(files)
}

pub fn write_dictionary(path: &Path, files: &[DictionaryFile]) -> std::io::Result<()> {
    write_json(path, &files)
}
