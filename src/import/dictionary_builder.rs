//! `build-dictionary`: extract the search corpus from reference PDFs.

use std::path::Path;

use super::pdf::{PageAnalysis, PdfDocument};
use super::render::PageRasterizer;
use super::{list_pdfs, safe_name, source_name, write_image, ImportError};
use crate::content::write_dictionary;
use crate::domain::{DictionaryFile, DictionaryPage};
use crate::paths::{DataPaths, DICTIONARY_IMAGES_URL};

/// Build `dictionary.json` from every PDF in `dir`.
///
/// Files that fail to parse are logged and skipped.
pub fn build_dictionary(dir: &Path, paths: &DataPaths) -> Result<Vec<DictionaryFile>, ImportError> {
    if !dir.is_dir() {
        return Err(ImportError::NoInput(dir.display().to_string()));
    }

    let files = list_pdfs(dir)?;
    tracing::info!("Scanning {}: {} PDF files", dir.display(), files.len());

    let images_dir = paths.dictionary_images_dir();
    let mut dictionary = Vec::new();

    for file in &files {
        let file_name = file.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        tracing::info!("Processing: {}", file_name);

        let result = std::fs::read(file)
            .map_err(ImportError::from)
            .and_then(|bytes| PdfDocument::from_bytes(&bytes).map_err(ImportError::from))
            .and_then(|pdf| {
                let mut rasterizer = PageRasterizer::for_path(file);
                dictionary_file(&pdf, &mut rasterizer, &source_name(file_name), &images_dir)
            });

        match result {
            Ok(entry) => dictionary.push(entry),
            Err(e) => tracing::warn!("Failed to process {}: {}", file_name, e),
        }
    }

    write_dictionary(&paths.dictionary_json(), &dictionary)?;
    tracing::info!(
        "Extracted data from {} files to {}",
        dictionary.len(),
        paths.dictionary_json().display()
    );
    Ok(dictionary)
}

/// Dictionary entry for one document, writing page images into `images_dir`
pub fn dictionary_file(
    pdf: &PdfDocument,
    rasterizer: &mut PageRasterizer<'_>,
    source: &str,
    images_dir: &Path,
) -> Result<DictionaryFile, ImportError> {
    let safe_base = safe_name(source);
    let mut pages = Vec::new();

    for (index, page) in pdf.pages()?.iter().enumerate() {
        let stem = format!("{}_p{}", safe_base, index);
        let image_path = save_page_image(pdf, rasterizer, page, &stem, images_dir)?;
        let content = page.lines();
        let title = content
            .first()
            .cloned()
            .unwrap_or_else(|| format!("Page {}", page.number));

        pages.push(DictionaryPage {
            page: page.number,
            title,
            content,
            image_path,
            raw_text: page.raw_text(),
        });
    }

    Ok(DictionaryFile {
        source: source.to_string(),
        pages,
    })
}

/// Largest embedded image, or the rendered page when there is none
fn save_page_image(
    pdf: &PdfDocument,
    rasterizer: &mut PageRasterizer<'_>,
    page: &PageAnalysis,
    stem: &str,
    images_dir: &Path,
) -> Result<String, ImportError> {
    let extracted = match page.largest_image() {
        Some(image) => pdf.extract_image(image),
        None => rasterizer.render(page.number),
    };
    match extracted {
        Ok(extracted) => {
            let file_name = write_image(images_dir, stem, &extracted)?;
            Ok(format!("{}/{}", DICTIONARY_IMAGES_URL, file_name))
        }
        Err(e) => {
            tracing::warn!("Page {} image skipped: {}", page.number, e);
            Ok(String::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::load_dictionary;
    use crate::testing::pdf::{build, TestPage};
    use tempfile::TempDir;

    #[test]
    fn test_dictionary_pages() {
        let temp = TempDir::new().unwrap();
        let bytes = build(&[
            TestPage::default()
                .text(14.0, "Basil")
                .text(10.0, "Annual herb")
                .image(2, 2, 30, 300.0, 300.0),
            TestPage::default(),
        ]);
        let pdf = PdfDocument::from_bytes(&bytes).unwrap();
        let mut rasterizer = PageRasterizer::for_bytes(&bytes);

        let file = dictionary_file(&pdf, &mut rasterizer, "Herb Guide", temp.path()).unwrap();
        assert_eq!(file.source, "Herb Guide");
        assert_eq!(file.pages.len(), 2);

        let first = &file.pages[0];
        assert_eq!(first.page, 1);
        assert_eq!(first.title, "Basil");
        assert_eq!(first.content, vec!["Basil", "Annual herb"]);
        assert_eq!(first.image_path, "./dictionary_images/Herb_Guide_p0.png");
        assert!(temp.path().join("Herb_Guide_p0.png").exists());

        let blank = &file.pages[1];
        assert_eq!(blank.title, "Page 2");
        assert!(blank.content.is_empty());
        assert_eq!(blank.image_path, "./dictionary_images/Herb_Guide_p1.png");
    }

    #[test]
    fn test_text_only_page_is_rendered() {
        let input = TempDir::new().unwrap();
        let data = TempDir::new().unwrap();
        let bytes = build(&[TestPage::default().text(14.0, "Sage").text(10.0, "Evergreen shrub")]);
        std::fs::write(input.path().join("Herbs.pdf"), bytes).unwrap();

        let paths = DataPaths::new(data.path());
        let files = build_dictionary(input.path(), &paths).unwrap();

        let page = &files[0].pages[0];
        assert_eq!(page.image_path, "./dictionary_images/Herbs_p0.png");
        let written = std::fs::read(paths.dictionary_images_dir().join("Herbs_p0.png")).unwrap();
        assert!(written.starts_with(b"\x89PNG"));
    }

    #[test]
    fn test_build_dictionary_skips_broken_files() {
        let input = TempDir::new().unwrap();
        let data = TempDir::new().unwrap();
        std::fs::write(input.path().join("good.pdf"), build(&[TestPage::default().text(12.0, "Sage")])).unwrap();
        std::fs::write(input.path().join("bad.pdf"), b"not a pdf").unwrap();

        let paths = DataPaths::new(data.path());
        let files = build_dictionary(input.path(), &paths).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].source, "good");
        assert_eq!(load_dictionary(&paths.dictionary_json()).unwrap(), files);
    }
}
