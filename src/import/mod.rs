//! PDF to deck conversion.
//!
//! - [`upload`]: in-app import of one PDF into the local custom deck
//! - [`deck_builder`]: `build-deck` CLI, PDFs to `cards.json` plus image files
//! - [`dictionary_builder`]: `build-dictionary` CLI, PDFs to the search corpus
//! - [`render`]: page rasterization for pages without an embedded image

pub mod deck_builder;
pub mod dictionary_builder;
pub mod pdf;
pub mod render;
pub mod upload;

pub use deck_builder::build_deck;
pub use dictionary_builder::build_dictionary;
pub use pdf::{PdfDocument, PdfError};
pub use upload::{import_pdf, is_pdf_upload};

use std::path::{Path, PathBuf};

use pdf::ExtractedImage;

/// Import errors.
#[derive(Debug)]
pub enum ImportError {
    /// Upload is not a PDF
    InvalidFile,
    Pdf(PdfError),
    Io(std::io::Error),
    /// No PDFs at the given input path
    NoInput(String),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::InvalidFile => write!(f, "Please upload a valid PDF file."),
            ImportError::Pdf(e) => write!(f, "Failed to process PDF: {}", e),
            ImportError::Io(e) => write!(f, "Failed to process PDF: {}", e),
            ImportError::NoInput(path) => write!(f, "No PDF files found at {}", path),
        }
    }
}

impl ImportError {
    /// Returns a user-facing error message without exposing filesystem paths.
    pub fn user_message(&self) -> String {
        match self {
            ImportError::InvalidFile => "Please upload a valid PDF file.".to_string(),
            ImportError::Pdf(e) => format!("Failed to process PDF: {}", e),
            ImportError::Io(_) => "Failed to process PDF: could not write files".to_string(),
            ImportError::NoInput(_) => "No PDF files found".to_string(),
        }
    }
}

impl std::error::Error for ImportError {}

impl From<PdfError> for ImportError {
    fn from(e: PdfError) -> Self {
        match e {
            PdfError::NotPdf => ImportError::InvalidFile,
            other => ImportError::Pdf(other),
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(e: std::io::Error) -> Self {
        ImportError::Io(e)
    }
}

/// File-system safe name: every non-alphanumeric character becomes `_`
pub fn safe_name(base: &str) -> String {
    base.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Deck name for a PDF: its file name without the `.pdf` extension
pub fn source_name(file_name: &str) -> String {
    let name = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file_name);
    let cut = name.len().saturating_sub(4);
    match name.get(cut..) {
        Some(ext) if ext.eq_ignore_ascii_case(".pdf") => name[..cut].to_string(),
        _ => name.to_string(),
    }
}

/// PDFs in `dir`, sorted by file name
pub fn list_pdfs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && is_pdf_path(p))
        .collect();
    files.sort();
    Ok(files)
}

fn is_pdf_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Write an extracted image as `<stem>.<ext>` in `dir`, returning the file name
fn write_image(dir: &Path, stem: &str, image: &ExtractedImage) -> std::io::Result<String> {
    std::fs::create_dir_all(dir)?;
    let file_name = format!("{}.{}", stem, image.format.extension());
    std::fs::write(dir.join(&file_name), &image.bytes)?;
    Ok(file_name)
}
