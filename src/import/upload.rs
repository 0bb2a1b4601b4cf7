//! In-app PDF import.
//!
//! Each page becomes one card: the first text line is the answer, the rest
//! the description, and the page's largest image is embedded as a data URL so
//! the card needs no files beside the database. Pages without an image are
//! rendered instead.

use super::pdf::{PageAnalysis, PdfDocument, PdfError};
use super::render::PageRasterizer;
use super::{source_name, ImportError};
use crate::config;
use crate::domain::{Card, CardId};

/// Accept by MIME type or, for clients that send none, by extension
pub fn is_pdf_upload(file_name: &str, content_type: Option<&str>) -> bool {
    let by_type = content_type.is_some_and(|ct| ct.eq_ignore_ascii_case("application/pdf"));
    let by_name = file_name.to_lowercase().ends_with(".pdf");
    by_type || by_name
}

/// Percentage of pages done, rounded
pub fn progress_percent(done: u32, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done as f64 / total as f64) * 100.0).round().min(100.0) as u8
}

/// Convert an uploaded PDF into custom cards.
///
/// `on_progress` is called after every page with the percentage done.
pub fn import_pdf<F>(
    file_name: &str,
    bytes: &[u8],
    timestamp_ms: i64,
    mut on_progress: F,
) -> Result<Vec<Card>, ImportError>
where
    F: FnMut(u8),
{
    let pdf = PdfDocument::from_bytes(bytes)?;
    if pdf.page_count() == 0 {
        return Err(PdfError::Parse("document has no pages".to_string()).into());
    }
    let source = source_name(file_name);
    let mut cards = Vec::with_capacity(pdf.page_count());
    let mut rasterizer = PageRasterizer::for_bytes(bytes);

    pdf.for_each_page(|page, total| {
        cards.push(card_from_page(&pdf, &mut rasterizer, &page, &source, timestamp_ms));
        on_progress(progress_percent(page.number, total));
        Ok(())
    })?;

    tracing::info!("Imported {} cards from {}", cards.len(), file_name);
    Ok(cards)
}

fn card_from_page(
    pdf: &PdfDocument,
    rasterizer: &mut PageRasterizer<'_>,
    page: &PageAnalysis,
    source: &str,
    timestamp_ms: i64,
) -> Card {
    let lines = page.lines();
    let title = lines
        .first()
        .cloned()
        .unwrap_or_else(|| format!("Page {}", page.number));
    let description = if lines.len() > 1 {
        lines[1..].join("\n")
    } else {
        config::NO_DESCRIPTION.to_string()
    };

    let extracted = match page.largest_image() {
        Some(img) => pdf.extract_image(img),
        None => rasterizer.render(page.number),
    };
    let image_path = match extracted {
        Ok(image) => image.data_url(),
        Err(e) => {
            tracing::warn!("Page {} image skipped: {}", page.number, e);
            String::new()
        }
    };

    Card {
        id: CardId::custom(timestamp_ms, page.number),
        title,
        description,
        image_path,
        source: source.to_string(),
        page: Some(page.number),
        is_custom: true,
    }
}
