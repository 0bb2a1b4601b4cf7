//! `build-deck`: turn slide PDFs into the built-in deck.
//!
//! Per page, the largest picture that is not a repeated background becomes the
//! card image and the text block with the largest font becomes the title.

use std::collections::HashSet;
use std::path::Path;

use super::pdf::{PageAnalysis, PdfDocument};
use super::{list_pdfs, safe_name, source_name, write_image, ImportError};
use crate::content::write_cards;
use crate::domain::{Card, CardId};
use crate::paths::{DataPaths, CARD_IMAGES_URL};

/// Cards from one PDF and the id the next file starts at
#[derive(Debug)]
pub struct DeckPart {
    pub cards: Vec<Card>,
    pub next_id: u64,
}

/// Build `cards.json` from a PDF file or a directory of PDFs.
///
/// Ids run on across files: each file reserves one id per page.
pub fn build_deck(input: &Path, paths: &DataPaths) -> Result<Vec<Card>, ImportError> {
    let files = if input.is_dir() {
        list_pdfs(input)?
    } else if input.is_file() {
        vec![input.to_path_buf()]
    } else {
        Vec::new()
    };
    if files.is_empty() {
        return Err(ImportError::NoInput(input.display().to_string()));
    }

    tracing::info!("Found {} PDF files in {}", files.len(), input.display());

    let images_dir = paths.card_images_dir();
    let mut all_cards = Vec::new();
    let mut next_id = 0;

    for file in &files {
        let file_name = file.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let pdf = match std::fs::read(file)
            .map_err(ImportError::from)
            .and_then(|bytes| PdfDocument::from_bytes(&bytes).map_err(ImportError::from))
        {
            Ok(pdf) => pdf,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", file.display(), e);
                continue;
            }
        };

        tracing::info!("Processing {}...", file_name);
        let part = cards_from_pdf(&pdf, &source_name(file_name), next_id, &images_dir)?;
        next_id = part.next_id;
        all_cards.extend(part.cards);
    }

    write_cards(&paths.cards_json(), &all_cards)?;
    tracing::info!(
        "Total processed: {} cards, saved to {}",
        all_cards.len(),
        paths.cards_json().display()
    );
    Ok(all_cards)
}

/// Cards for one document, numbered from `start_id`
pub fn cards_from_pdf(
    pdf: &PdfDocument,
    source: &str,
    start_id: u64,
    images_dir: &Path,
) -> Result<DeckPart, ImportError> {
    let pages = pdf.pages()?;
    let ignored = super::pdf::background_hashes(&pages);
    if !ignored.is_empty() {
        tracing::debug!("{}: ignoring {} repeated images", source, ignored.len());
    }

    let safe_base = safe_name(source);
    let mut cards = Vec::new();

    for (index, page) in pages.iter().enumerate() {
        let image_path = save_main_image(pdf, page, &ignored, &format!("{}_p{}", safe_base, index), images_dir)?;
        let (title, description) = title_and_description(page);

        if title.is_empty() && image_path.is_empty() {
            continue;
        }

        let mut card = Card::new(CardId::from(start_id + index as u64), title, source)
            .with_description(description)
            .with_image(image_path);
        card.page = Some(page.number);
        cards.push(card);
    }

    Ok(DeckPart {
        cards,
        next_id: start_id + pages.len() as u64,
    })
}

fn save_main_image(
    pdf: &PdfDocument,
    page: &PageAnalysis,
    ignored: &HashSet<String>,
    stem: &str,
    images_dir: &Path,
) -> Result<String, ImportError> {
    let Some(image) = page.main_image(ignored) else {
        return Ok(String::new());
    };

    match pdf.extract_image(image) {
        Ok(extracted) => {
            let file_name = write_image(images_dir, stem, &extracted)?;
            Ok(format!("{}/{}", CARD_IMAGES_URL, file_name))
        }
        Err(e) => {
            tracing::warn!("Error extracting image on page {}: {}", page.number, e);
            Ok(String::new())
        }
    }
}

/// Largest-font block as the title, the others (by size) as description lines
fn title_and_description(page: &PageAnalysis) -> (String, String) {
    let mut blocks: Vec<(String, f32)> = page
        .blocks
        .iter()
        .map(|b| (b.text(), b.font_size))
        .filter(|(text, _)| !text.is_empty())
        .collect();
    // Stable: equal sizes keep content order
    blocks.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut texts = blocks.into_iter().map(|(text, _)| text);
    let title = texts.next().unwrap_or_default();
    let description = texts.collect::<Vec<_>>().join("\n");
    (title, description)
}
