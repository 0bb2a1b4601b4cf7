//! Page rasterization with pdf_oxide.
//!
//! Used for pages that carry no embedded picture, so text-only slides still
//! get an image. The document is opened on the first render.

use pdf_oxide::document::PdfDocument as RenderDocument;
use pdf_oxide::rendering::{PageRenderer, RenderOptions};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use super::pdf::{ExtractedImage, ImageFormat, PdfError};
use crate::config;

enum Source<'a> {
    Path(&'a Path),
    Bytes(&'a [u8]),
}

struct Opened {
    doc: RenderDocument,
    renderer: PageRenderer,
    /// Spooled upload, removed on drop
    _file: Option<NamedTempFile>,
}

/// Lazily opened renderer for one PDF
pub struct PageRasterizer<'a> {
    source: Source<'a>,
    opened: Option<Result<Opened, String>>,
}

impl<'a> PageRasterizer<'a> {
    pub fn for_path(path: &'a Path) -> Self {
        Self { source: Source::Path(path), opened: None }
    }

    pub fn for_bytes(bytes: &'a [u8]) -> Self {
        Self { source: Source::Bytes(bytes), opened: None }
    }

    /// PNG of a 1-based page
    pub fn render(&mut self, number: u32) -> Result<ExtractedImage, PdfError> {
        let index = (number as usize)
            .checked_sub(1)
            .ok_or_else(|| PdfError::Render("page numbers start at 1".to_string()))?;

        let source = &self.source;
        let opened = self
            .opened
            .get_or_insert_with(|| open(source))
            .as_mut()
            .map_err(|e| PdfError::Render(e.clone()))?;

        let image = opened
            .renderer
            .render_page(&mut opened.doc, index)
            .map_err(|e| PdfError::Render(e.to_string()))?;
        Ok(ExtractedImage { format: ImageFormat::Png, bytes: image.data })
    }
}

fn open(source: &Source<'_>) -> Result<Opened, String> {
    // pdf_oxide reads from a path, so uploads are spooled to disk first
    let (doc, file) = match source {
        Source::Path(path) => (RenderDocument::open(path).map_err(|e| e.to_string())?, None),
        Source::Bytes(bytes) => {
            let mut file = NamedTempFile::new().map_err(|e| e.to_string())?;
            file.write_all(bytes).map_err(|e| e.to_string())?;
            file.flush().map_err(|e| e.to_string())?;
            let doc = RenderDocument::open(file.path()).map_err(|e| e.to_string())?;
            (doc, Some(file))
        }
    };

    let renderer = PageRenderer::new(RenderOptions::with_dpi(config::PAGE_RENDER_DPI));
    Ok(Opened { doc, renderer, _file: file })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::pdf::{build, TestPage};

    #[test]
    fn test_renders_text_only_page_to_png() {
        let bytes = build(&[TestPage::default().text(24.0, "Oak")]);
        let mut rasterizer = PageRasterizer::for_bytes(&bytes);

        let image = rasterizer.render(1).unwrap();
        assert_eq!(image.format, ImageFormat::Png);
        assert!(image.bytes.starts_with(b"\x89PNG"));
    }

    #[test]
    fn test_page_numbers_are_one_based() {
        let bytes = build(&[TestPage::default()]);
        let mut rasterizer = PageRasterizer::for_bytes(&bytes);
        assert!(matches!(rasterizer.render(0), Err(PdfError::Render(_))));
    }

    #[test]
    fn test_unreadable_file_fails_every_render() {
        let mut rasterizer = PageRasterizer::for_path(Path::new("/nonexistent/deck.pdf"));
        assert!(matches!(rasterizer.render(1), Err(PdfError::Render(_))));
        assert!(matches!(rasterizer.render(2), Err(PdfError::Render(_))));
    }
}
