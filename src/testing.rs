//! Test utilities for database setup.
//!
//! Provides helpers that reuse authoritative schema initialization,
//! eliminating schema duplication in test code.

use rusqlite::Connection;
use std::path::Path;
use tempfile::TempDir;

use crate::paths::DataPaths;

/// Test environment with a migrated `review_deck.db` in a temporary data directory.
///
/// Everything is removed when dropped.
pub struct TestEnv {
    /// Temporary directory (kept alive for database file persistence)
    pub temp: TempDir,
    /// Connection with the full schema (all migrations)
    pub conn: Connection,
}

impl TestEnv {
    /// Create a test environment using `crate::db::schema::run_migrations()`.
    pub fn new() -> rusqlite::Result<Self> {
        let temp =
            TempDir::new().map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let conn = Connection::open(DataPaths::new(temp.path()).db())?;
        crate::db::schema::run_migrations(&conn)?;

        Ok(Self { temp, conn })
    }

    /// Get the temporary directory path for creating test files.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Data directory layout rooted at the temporary directory.
    pub fn paths(&self) -> DataPaths {
        DataPaths::new(self.temp.path())
    }
}

/// Minimal PDFs for import tests, built with lopdf.
pub mod pdf {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream, StringFormat};

    /// Glyph codes of the composite test font and the text they map to
    pub const CID_GLYPHS: [(u16, char); 3] = [(1, 'O'), (2, 'a'), (3, 'k')];

    /// An image XObject drawn at `(10, 10)` scaled to `placed`.
    ///
    /// Width and height are written as declared, even when `data` is shorter.
    #[derive(Clone)]
    pub struct TestImage {
        pub width: i64,
        pub height: i64,
        pub color_space: &'static str,
        pub data: Vec<u8>,
        pub placed: (f32, f32),
    }

    /// One page: text lines as `(font size, text)`, lines in the composite
    /// font as `(font size, glyph codes)`, and images.
    #[derive(Default, Clone)]
    pub struct TestPage {
        pub lines: Vec<(f32, String)>,
        pub cid_lines: Vec<(f32, Vec<u16>)>,
        pub images: Vec<TestImage>,
    }

    impl TestPage {
        pub fn text(mut self, size: f32, text: &str) -> Self {
            self.lines.push((size, text.to_string()));
            self
        }

        /// Line shown with a Type0 Identity-H font decoded through its ToUnicode map
        pub fn cid_text(mut self, size: f32, codes: &[u16]) -> Self {
            self.cid_lines.push((size, codes.to_vec()));
            self
        }

        /// Gray image filled with `shade`
        pub fn image(mut self, width: u32, height: u32, shade: u8, placed_w: f32, placed_h: f32) -> Self {
            self.images.push(TestImage {
                width: i64::from(width),
                height: i64::from(height),
                color_space: "DeviceGray",
                data: vec![shade; (width * height) as usize],
                placed: (placed_w, placed_h),
            });
            self
        }

        pub fn raw_image(mut self, image: TestImage) -> Self {
            self.images.push(image);
            self
        }
    }

    fn to_unicode_cmap() -> Vec<u8> {
        let mut cmap = String::from(
            "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
             /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
             1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
        );
        cmap.push_str(&format!("{} beginbfchar\n", CID_GLYPHS.len()));
        for (code, ch) in CID_GLYPHS {
            cmap.push_str(&format!("<{:04X}> <{:04X}>\n", code, ch as u32));
        }
        cmap.push_str(
            "endbfchar\nendcmap\nCMapName currentdict /CMapResource defineresource pop\nend\nend\n",
        );
        cmap.into_bytes()
    }

    /// Build a 600x800 point PDF, each text line in its own text object.
    pub fn build(pages: &[TestPage]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let to_unicode_id = doc.add_object(Stream::new(dictionary! {}, to_unicode_cmap()));
        let descendant_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => "TestSans",
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
        });
        let cid_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "TestSans",
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(descendant_id)],
            "ToUnicode" => to_unicode_id,
        });

        let mut kids = Vec::new();
        for page in pages {
            let mut operations = Vec::new();
            let mut xobjects = lopdf::Dictionary::new();

            for (i, image) in page.images.iter().enumerate() {
                let stream = Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => image.width,
                        "Height" => image.height,
                        "ColorSpace" => image.color_space,
                        "BitsPerComponent" => 8,
                    },
                    image.data.clone(),
                );
                let image_id = doc.add_object(stream);
                let name = format!("Im{}", i);
                xobjects.set(name.as_bytes().to_vec(), Object::Reference(image_id));

                let (placed_w, placed_h) = image.placed;
                operations.push(Operation::new("q", vec![]));
                operations.push(Operation::new(
                    "cm",
                    vec![placed_w.into(), 0.into(), 0.into(), placed_h.into(), 10.into(), 10.into()],
                ));
                operations.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
                operations.push(Operation::new("Q", vec![]));
            }

            let shown = page
                .lines
                .iter()
                .map(|(size, text)| ("F1", *size, Object::string_literal(text.as_str())))
                .chain(page.cid_lines.iter().map(|(size, codes)| {
                    let bytes = codes.iter().flat_map(|c| c.to_be_bytes()).collect();
                    ("F2", *size, Object::String(bytes, StringFormat::Hexadecimal))
                }));
            for (i, (font, size, text)) in shown.enumerate() {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec![font.into(), size.into()]));
                operations.push(Operation::new("Td", vec![50.into(), (750 - 40 * i as i64).into()]));
                operations.push(Operation::new("Tj", vec![text]));
                operations.push(Operation::new("ET", vec![]));
            }

            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap_or_default()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id, "F2" => cid_font_id },
                    "XObject" => xobjects,
                },
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 600.into(), 800.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }
}
