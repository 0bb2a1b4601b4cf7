//! PDF page analysis using lopdf.
//!
//! Walks each page's content stream and collects:
//! - text objects (`BT ... ET`) as blocks of lines with their largest font size
//! - image XObjects drawn with `Do`, with the area they cover on the page
//!
//! Form XObjects are followed so that slides exported with wrapped content
//! still yield their images and text.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use lopdf::content::Content;
use lopdf::{dictionary, Dictionary, Document, Encoding, Object, ObjectId, Stream};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::LazyLock;

use crate::config;

/// Nesting limit for form XObjects and page tree walks
const MAX_DEPTH: usize = 16;

/// Letter size, used when a page has no usable MediaBox
const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

static NULL: Object = Object::Null;

/// Text shown with a font that declares no usable encoding
static WIN_ANSI: LazyLock<Option<Encoding<'static>>> = LazyLock::new(|| {
  static FONT: LazyLock<Dictionary> =
    LazyLock::new(|| dictionary! { "Type" => "Font", "Encoding" => "WinAnsiEncoding" });
  FONT.get_font_encoding(&Document::new()).ok()
});

#[derive(Debug)]
pub enum PdfError {
  /// Missing `%PDF` header
  NotPdf,
  Encrypted,
  Parse(String),
  /// Image uses a filter or color space we cannot re-encode
  UnsupportedImage(String),
  /// Page could not be rasterized
  Render(String),
}

impl std::fmt::Display for PdfError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      PdfError::NotPdf => write!(f, "Not a PDF file"),
      PdfError::Encrypted => write!(f, "PDF is encrypted"),
      PdfError::Parse(e) => write!(f, "PDF parsing error: {}", e),
      PdfError::UnsupportedImage(e) => write!(f, "Unsupported image: {}", e),
      PdfError::Render(e) => write!(f, "Page rendering failed: {}", e),
    }
  }
}

impl std::error::Error for PdfError {}

impl From<lopdf::Error> for PdfError {
  fn from(e: lopdf::Error) -> Self {
    PdfError::Parse(e.to_string())
  }
}

/// Lines of one text object
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
  pub lines: Vec<String>,
  /// Largest effective font size used in the block
  pub font_size: f32,
}

impl TextBlock {
  /// Block text with lines joined by spaces
  pub fn text(&self) -> String {
    self
      .lines
      .iter()
      .map(|l| l.trim())
      .filter(|l| !l.is_empty())
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// An image drawn on a page
#[derive(Debug, Clone)]
pub struct PlacedImage {
  pub id: ObjectId,
  pub width: u32,
  pub height: u32,
  /// Area covered on the page in points²
  pub placed_area: f32,
  /// SHA-256 of the encoded stream data
  pub hash: String,
}

#[derive(Debug, Clone)]
pub struct PageAnalysis {
  /// 1-based page number
  pub number: u32,
  pub width: f32,
  pub height: f32,
  pub blocks: Vec<TextBlock>,
  pub images: Vec<PlacedImage>,
}

impl PageAnalysis {
  pub fn area(&self) -> f32 {
    self.width * self.height
  }

  /// Trimmed, non-empty text lines in content order
  pub fn lines(&self) -> Vec<String> {
    self
      .blocks
      .iter()
      .flat_map(|b| b.lines.iter())
      .map(|l| l.trim())
      .filter(|l| !l.is_empty())
      .map(str::to_string)
      .collect()
  }

  /// Page text with one line per row
  pub fn raw_text(&self) -> String {
    let mut text = String::new();
    for block in &self.blocks {
      for line in &block.lines {
        text.push_str(line);
        text.push('\n');
      }
    }
    text
  }

  /// Largest image covering the most area
  pub fn largest_image(&self) -> Option<&PlacedImage> {
    self
      .images
      .iter()
      .max_by(|a, b| a.placed_area.total_cmp(&b.placed_area))
  }

  /// Largest image that is neither a repeated background nor a full-page backdrop
  pub fn main_image(&self, ignored: &HashSet<String>) -> Option<&PlacedImage> {
    let max_area = self.area() * config::FULL_PAGE_AREA_RATIO as f32;
    self
      .images
      .iter()
      .filter(|img| !ignored.contains(&img.hash))
      .filter(|img| img.placed_area <= max_area)
      .max_by(|a, b| a.placed_area.total_cmp(&b.placed_area))
  }
}

/// Hashes of images repeated on too many pages to be card content
pub fn background_hashes(pages: &[PageAnalysis]) -> HashSet<String> {
  let mut counts: HashMap<&str, usize> = HashMap::new();
  for page in pages {
    let unique: HashSet<&str> = page.images.iter().map(|i| i.hash.as_str()).collect();
    for hash in unique {
      *counts.entry(hash).or_default() += 1;
    }
  }

  let threshold = (config::BACKGROUND_MIN_PAGES as f64)
    .max(pages.len() as f64 * config::BACKGROUND_PAGE_RATIO);

  counts
    .into_iter()
    .filter(|(_, count)| *count as f64 > threshold)
    .map(|(hash, _)| hash.to_string())
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
  Jpeg,
  Png,
}

impl ImageFormat {
  pub fn extension(&self) -> &'static str {
    match self {
      ImageFormat::Jpeg => "jpeg",
      ImageFormat::Png => "png",
    }
  }

  pub fn mime(&self) -> &'static str {
    match self {
      ImageFormat::Jpeg => "image/jpeg",
      ImageFormat::Png => "image/png",
    }
  }
}

/// Image bytes ready to write to disk or embed
#[derive(Debug, Clone)]
pub struct ExtractedImage {
  pub format: ImageFormat,
  pub bytes: Vec<u8>,
}

impl ExtractedImage {
  pub fn data_url(&self) -> String {
    format!("data:{};base64,{}", self.format.mime(), STANDARD.encode(&self.bytes))
  }
}

/// A loaded PDF
pub struct PdfDocument {
  doc: Document,
}

impl PdfDocument {
  pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
    if !has_pdf_header(bytes) {
      return Err(PdfError::NotPdf);
    }
    let doc = Document::load_mem(bytes)?;
    if doc.trailer.get(b"Encrypt").is_ok() {
      return Err(PdfError::Encrypted);
    }
    Ok(Self { doc })
  }

  pub fn page_count(&self) -> usize {
    self.doc.get_pages().len()
  }

  /// Analyze every page in order
  pub fn pages(&self) -> Result<Vec<PageAnalysis>, PdfError> {
    self
      .doc
      .get_pages()
      .into_iter()
      .map(|(number, id)| self.analyze_page(number, id))
      .collect()
  }

  /// Analyze pages one by one, reporting each to `on_page`
  pub fn for_each_page<F>(&self, mut on_page: F) -> Result<(), PdfError>
  where
    F: FnMut(PageAnalysis, usize) -> Result<(), PdfError>,
  {
    let pages = self.doc.get_pages();
    let total = pages.len();
    for (number, id) in pages {
      on_page(self.analyze_page(number, id)?, total)?;
    }
    Ok(())
  }

  fn analyze_page(&self, number: u32, page_id: ObjectId) -> Result<PageAnalysis, PdfError> {
    let (width, height) = self.page_size(page_id);
    let resources = self
      .inherited(page_id, b"Resources")
      .and_then(|obj| self.resolve(obj).as_dict().ok());

    let content = Content::decode(&self.doc.get_page_content(page_id)?)?;
    let mut walker = ContentWalker::new(self);
    walker.walk(&content, resources, IDENTITY, 0)?;

    Ok(PageAnalysis {
      number,
      width,
      height,
      blocks: walker.blocks,
      images: walker.images,
    })
  }

  /// Bytes of a placed image, as JPEG passthrough or re-encoded PNG
  pub fn extract_image(&self, image: &PlacedImage) -> Result<ExtractedImage, PdfError> {
    let stream = self.doc.get_object(image.id)?.as_stream()?;
    let filters = stream_filters(stream);

    if filters.iter().any(|f| f == "DCTDecode") {
      if filters.len() > 1 {
        return Err(PdfError::UnsupportedImage("chained JPEG filter".into()));
      }
      return Ok(ExtractedImage { format: ImageFormat::Jpeg, bytes: stream.content.clone() });
    }
    if let Some(other) = filters.iter().find(|f| *f != "FlateDecode") {
      return Err(PdfError::UnsupportedImage(other.clone()));
    }

    let bits = stream.dict.get(b"BitsPerComponent").and_then(Object::as_i64).unwrap_or(8);
    if bits != 8 {
      return Err(PdfError::UnsupportedImage(format!("{} bits per component", bits)));
    }

    let color_space = stream
      .dict
      .get(b"ColorSpace")
      .map(|cs| self.resolve(cs))
      .ok()
      .and_then(|cs| color_space_name(&self.doc, cs))
      .unwrap_or_else(|| "DeviceGray".to_string());

    let pixels = stream_bytes(stream)?;
    let (color, data) = match color_space.as_str() {
      "DeviceGray" | "CalGray" | "G" => (ColorType::L8, take_pixels(pixels, image, 1)?),
      "DeviceRGB" | "CalRGB" | "RGB" => (ColorType::Rgb8, take_pixels(pixels, image, 3)?),
      "DeviceCMYK" | "CMYK" => (ColorType::Rgb8, cmyk_to_rgb(&take_pixels(pixels, image, 4)?)),
      other => return Err(PdfError::UnsupportedImage(format!("color space {}", other))),
    };

    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
      .write_image(&data, image.width, image.height, color)
      .map_err(|e| PdfError::UnsupportedImage(e.to_string()))?;

    Ok(ExtractedImage { format: ImageFormat::Png, bytes })
  }

  fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
    let mut current = obj;
    for _ in 0..MAX_DEPTH {
      match current {
        Object::Reference(id) => match self.doc.get_object(*id) {
          Ok(next) => current = next,
          Err(_) => return &NULL,
        },
        _ => return current,
      }
    }
    current
  }

  /// Look up a page attribute, following `Parent` for inherited keys
  fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
    let mut dict = self.doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_DEPTH {
      if let Ok(value) = dict.get(key) {
        return Some(value);
      }
      let parent = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
      dict = self.doc.get_dictionary(parent).ok()?;
    }
    None
  }

  fn page_size(&self, page_id: ObjectId) -> (f32, f32) {
    let media_box = self
      .inherited(page_id, b"MediaBox")
      .and_then(|obj| self.resolve(obj).as_array().ok())
      .map(|arr| {
        arr
          .iter()
          .filter_map(|v| self.resolve(v).as_float().ok())
          .collect::<Vec<f32>>()
      });

    match media_box.as_deref() {
      Some([x0, y0, x1, y1]) => ((x1 - x0).abs(), (y1 - y0).abs()),
      _ => DEFAULT_PAGE_SIZE,
    }
  }
}

/// PDFs may carry junk before the header; readers accept it within the first KiB
fn has_pdf_header(bytes: &[u8]) -> bool {
  let head = &bytes[..bytes.len().min(1024)];
  head.windows(5).any(|w| w == b"%PDF-")
}

fn stream_filters(stream: &Stream) -> Vec<String> {
  match stream.dict.get(b"Filter") {
    Ok(Object::Name(name)) => vec![String::from_utf8_lossy(name).into_owned()],
    Ok(Object::Array(items)) => items
      .iter()
      .filter_map(|f| f.as_name().ok())
      .map(|n| String::from_utf8_lossy(n).into_owned())
      .collect(),
    _ => Vec::new(),
  }
}

fn stream_bytes(stream: &Stream) -> Result<Vec<u8>, PdfError> {
  if stream.dict.get(b"Filter").is_ok() {
    Ok(stream.decompressed_content()?)
  } else {
    Ok(stream.content.clone())
  }
}

fn color_space_name(doc: &Document, cs: &Object) -> Option<String> {
  match cs {
    Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
    // [/ICCBased stream]: pick by component count
    Object::Array(items) => {
      let family = items.first()?.as_name().ok()?;
      if family != b"ICCBased" {
        return Some(String::from_utf8_lossy(family).into_owned());
      }
      let profile = match items.get(1)? {
        Object::Reference(id) => doc.get_object(*id).ok()?.as_stream().ok()?,
        Object::Stream(s) => s,
        _ => return None,
      };
      match profile.dict.get(b"N").and_then(Object::as_i64).ok()? {
        1 => Some("DeviceGray".into()),
        3 => Some("DeviceRGB".into()),
        4 => Some("DeviceCMYK".into()),
        n => Some(format!("ICCBased/{}", n)),
      }
    }
    _ => None,
  }
}

fn take_pixels(mut pixels: Vec<u8>, image: &PlacedImage, components: usize) -> Result<Vec<u8>, PdfError> {
  let needed = usize::try_from(image.width)
    .ok()
    .zip(usize::try_from(image.height).ok())
    .and_then(|(w, h)| w.checked_mul(h))
    .and_then(|n| n.checked_mul(components))
    .ok_or_else(|| {
      PdfError::UnsupportedImage(format!("{}x{} image is too large", image.width, image.height))
    })?;
  if needed == 0 || pixels.len() < needed {
    return Err(PdfError::UnsupportedImage(format!(
      "expected {} bytes of pixel data, found {}",
      needed,
      pixels.len()
    )));
  }
  pixels.truncate(needed);
  Ok(pixels)
}

fn cmyk_to_rgb(pixels: &[u8]) -> Vec<u8> {
  pixels
    .chunks_exact(4)
    .flat_map(|px| {
      let k = 255 - px[3] as u16;
      [px[0], px[1], px[2]].map(|c| ((255 - c as u16) * k / 255) as u8)
    })
    .collect()
}

// ==================== Content stream interpretation ====================

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `a × b` for PDF row-vector matrices
fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
  [
    a[0] * b[0] + a[1] * b[2],
    a[0] * b[1] + a[1] * b[3],
    a[2] * b[0] + a[3] * b[2],
    a[2] * b[1] + a[3] * b[3],
    a[4] * b[0] + a[5] * b[2] + b[4],
    a[4] * b[1] + a[5] * b[3] + b[5],
  ]
}

fn matrix_from(operands: &[Object]) -> Option<Matrix> {
  if operands.len() < 6 {
    return None;
  }
  let mut m = IDENTITY;
  for (slot, op) in m.iter_mut().zip(operands) {
    *slot = op.as_float().ok()?;
  }
  Some(m)
}

/// Encoding of a font resource, from its `/Encoding` name or, for composite
/// fonts, its `/ToUnicode` map.
///
/// Simple fonts without a named encoding return `None`: lopdf reads
/// ToUnicode codes as two bytes, which only holds for composite fonts.
fn font_encoding<'a>(doc: &Document, font: &'a Dictionary) -> Option<Encoding<'a>> {
  // lopdf asserts /Type /Font
  if !font.type_is(b"Font") {
    return None;
  }
  let composite = font.get(b"Subtype").and_then(Object::as_name).is_ok_and(|s| s == b"Type0");
  let named = font.get(b"Encoding").and_then(Object::as_name).is_ok();
  if !composite && !named {
    return None;
  }
  font
    .get_font_encoding(doc)
    .map_err(|e| tracing::debug!("Font encoding not usable: {}", e))
    .ok()
}

/// Decode shown text with the current font's encoding.
///
/// Without one, a UTF-16BE BOM is honored and anything else reads as WinAnsi.
fn decode_text(encoding: Option<&Encoding<'_>>, bytes: &[u8]) -> String {
  if let Some(text) = encoding.and_then(|enc| Document::decode_text(enc, bytes).ok()) {
    return text;
  }
  if bytes.starts_with(&[0xFE, 0xFF]) {
    let units: Vec<u16> = bytes[2..]
      .chunks_exact(2)
      .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
      .collect();
    return String::from_utf16_lossy(&units);
  }
  match WIN_ANSI.as_ref().and_then(|enc| Document::decode_text(enc, bytes).ok()) {
    Some(text) => text,
    None => bytes.iter().map(|&b| b as char).filter(|c| !c.is_control()).collect(),
  }
}

/// TJ adjustments below this (thousandths of an em) read as a word gap
const TJ_SPACE_THRESHOLD: f32 = -200.0;

struct TextState<'a> {
  font: Option<Rc<Encoding<'a>>>,
  font_size: f32,
  leading: f32,
  matrix: Matrix,
  line_matrix: Matrix,
}

impl Default for TextState<'_> {
  fn default() -> Self {
    Self { font: None, font_size: 0.0, leading: 0.0, matrix: IDENTITY, line_matrix: IDENTITY }
  }
}

#[derive(Default)]
struct OpenBlock {
  lines: Vec<String>,
  current: String,
  max_size: f32,
}

impl OpenBlock {
  fn break_line(&mut self) {
    if !self.current.trim().is_empty() {
      self.lines.push(std::mem::take(&mut self.current).trim().to_string());
    }
    self.current.clear();
  }
}

struct ContentWalker<'a> {
  pdf: &'a PdfDocument,
  blocks: Vec<TextBlock>,
  images: Vec<PlacedImage>,
  seen_forms: HashSet<ObjectId>,
  /// Parsed encodings of indirect font objects
  fonts: HashMap<ObjectId, Option<Rc<Encoding<'a>>>>,
}

impl<'a> ContentWalker<'a> {
  fn new(pdf: &'a PdfDocument) -> Self {
    Self {
      pdf,
      blocks: Vec::new(),
      images: Vec::new(),
      seen_forms: HashSet::new(),
      fonts: HashMap::new(),
    }
  }

  fn font(&mut self, name: &[u8], resources: Option<&'a Dictionary>) -> Option<Rc<Encoding<'a>>> {
    let pdf = self.pdf;
    let entry = resources?
      .get(b"Font")
      .ok()
      .and_then(|fonts| pdf.resolve(fonts).as_dict().ok())?
      .get(name)
      .ok()?;
    let id = entry.as_reference().ok();
    if let Some(cached) = id.and_then(|id| self.fonts.get(&id)) {
      return cached.clone();
    }

    let encoding = pdf
      .resolve(entry)
      .as_dict()
      .ok()
      .and_then(|font| font_encoding(&pdf.doc, font))
      .map(Rc::new);
    if let Some(id) = id {
      self.fonts.insert(id, encoding.clone());
    }
    encoding
  }

  fn walk(
    &mut self,
    content: &Content,
    resources: Option<&'a Dictionary>,
    base: Matrix,
    depth: usize,
  ) -> Result<(), PdfError> {
    let mut ctm = base;
    let mut stack: Vec<Matrix> = Vec::new();
    let mut text = TextState::default();
    let mut block: Option<OpenBlock> = None;

    for op in &content.operations {
      let operands = &op.operands;
      match op.operator.as_str() {
        "q" => stack.push(ctm),
        "Q" => ctm = stack.pop().unwrap_or(base),
        "cm" => {
          if let Some(m) = matrix_from(operands) {
            ctm = multiply(&m, &ctm);
          }
        }
        "BT" => {
          text.matrix = IDENTITY;
          text.line_matrix = IDENTITY;
          block = Some(OpenBlock::default());
        }
        "ET" => {
          if let Some(mut open) = block.take() {
            open.break_line();
            if !open.lines.is_empty() {
              self.blocks.push(TextBlock { lines: open.lines, font_size: open.max_size });
            }
          }
        }
        "Tf" => {
          if let Some(name) = operands.first().and_then(|n| n.as_name().ok()) {
            text.font = self.font(name, resources);
          }
          if let Some(size) = operands.get(1).and_then(|s| s.as_float().ok()) {
            text.font_size = size;
          }
        }
        "TL" => {
          if let Some(leading) = operands.first().and_then(|l| l.as_float().ok()) {
            text.leading = leading;
          }
        }
        "Td" | "TD" => {
          let tx = operands.first().and_then(|v| v.as_float().ok()).unwrap_or(0.0);
          let ty = operands.get(1).and_then(|v| v.as_float().ok()).unwrap_or(0.0);
          if op.operator == "TD" {
            text.leading = -ty;
          }
          text.line_matrix = multiply(&[1.0, 0.0, 0.0, 1.0, tx, ty], &text.line_matrix);
          text.matrix = text.line_matrix;
          if ty != 0.0 {
            if let Some(open) = block.as_mut() {
              open.break_line();
            }
          }
        }
        "Tm" => {
          if let Some(m) = matrix_from(operands) {
            let moved = (m[5] - text.line_matrix[5]).abs() > f32::EPSILON;
            text.matrix = m;
            text.line_matrix = m;
            if moved {
              if let Some(open) = block.as_mut() {
                open.break_line();
              }
            }
          }
        }
        "T*" | "'" | "\"" => {
          text.line_matrix = multiply(&[1.0, 0.0, 0.0, 1.0, 0.0, -text.leading], &text.line_matrix);
          text.matrix = text.line_matrix;
          if let Some(open) = block.as_mut() {
            open.break_line();
            if op.operator != "T*" {
              if let Some(Object::String(bytes, _)) = operands.last() {
                open.current.push_str(&decode_text(text.font.as_deref(), bytes));
                open.max_size = open.max_size.max(effective_size(&text, &ctm));
              }
            }
          }
        }
        "Tj" => {
          if let (Some(open), Some(Object::String(bytes, _))) = (block.as_mut(), operands.first()) {
            open.current.push_str(&decode_text(text.font.as_deref(), bytes));
            open.max_size = open.max_size.max(effective_size(&text, &ctm));
          }
        }
        "TJ" => {
          if let (Some(open), Some(Object::Array(items))) = (block.as_mut(), operands.first()) {
            for item in items {
              match item {
                Object::String(bytes, _) => open.current.push_str(&decode_text(text.font.as_deref(), bytes)),
                other => {
                  if other.as_float().is_ok_and(|adj| adj < TJ_SPACE_THRESHOLD)
                    && !open.current.ends_with(' ')
                  {
                    open.current.push(' ');
                  }
                }
              }
            }
            open.max_size = open.max_size.max(effective_size(&text, &ctm));
          }
        }
        "Do" => {
          let Some(name) = operands.first().and_then(|n| n.as_name().ok()) else {
            continue;
          };
          self.draw_xobject(name, resources, ctm, depth)?;
        }
        _ => {}
      }
    }

    Ok(())
  }

  fn draw_xobject(
    &mut self,
    name: &[u8],
    resources: Option<&'a Dictionary>,
    ctm: Matrix,
    depth: usize,
  ) -> Result<(), PdfError> {
    let pdf = self.pdf;
    let Some(entry) = resources
      .and_then(|res| res.get(b"XObject").ok())
      .and_then(|x| pdf.resolve(x).as_dict().ok())
      .and_then(|x| x.get(name).ok())
    else {
      tracing::debug!("XObject {} not in resources", String::from_utf8_lossy(name));
      return Ok(());
    };

    let Object::Reference(id) = entry else {
      return Ok(());
    };
    let Ok(stream) = pdf.doc.get_object(*id).and_then(Object::as_stream) else {
      return Ok(());
    };

    match stream.dict.get(b"Subtype").and_then(Object::as_name) {
      Ok(b"Image") => {
        let dimension = |key: &[u8]| {
          stream
            .dict
            .get(key)
            .and_then(Object::as_i64)
            .ok()
            .and_then(|v| u32::try_from(v).ok())
        };
        let (Some(width), Some(height)) = (dimension(b"Width"), dimension(b"Height")) else {
          tracing::debug!("Skipping image {:?} with invalid dimensions", id);
          return Ok(());
        };
        // Unit square mapped through the CTM
        let placed_area = (ctm[0] * ctm[3] - ctm[1] * ctm[2]).abs();
        self.images.push(PlacedImage {
          id: *id,
          width,
          height,
          placed_area,
          hash: hex::encode(Sha256::digest(&stream.content)),
        });
      }
      Ok(b"Form") => {
        if depth >= MAX_DEPTH || !self.seen_forms.insert(*id) {
          return Ok(());
        }
        let matrix = stream
          .dict
          .get(b"Matrix")
          .ok()
          .and_then(|m| m.as_array().ok())
          .and_then(|arr| matrix_from(arr))
          .unwrap_or(IDENTITY);
        let form_resources = stream
          .dict
          .get(b"Resources")
          .ok()
          .and_then(|r| pdf.resolve(r).as_dict().ok())
          .or(resources);
        let content = Content::decode(&stream_bytes(stream)?)?;
        self.walk(&content, form_resources, multiply(&matrix, &ctm), depth + 1)?;
        self.seen_forms.remove(id);
      }
      _ => {}
    }

    Ok(())
  }
}

fn effective_size(text: &TextState<'_>, ctm: &Matrix) -> f32 {
  let m = multiply(&text.matrix, ctm);
  let scale = (m[2] * m[2] + m[3] * m[3]).sqrt();
  (text.font_size * scale).abs()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::pdf::{build, TestImage, TestPage};

  #[test]
  fn test_rejects_non_pdf() {
    assert!(matches!(PdfDocument::from_bytes(b"hello world"), Err(PdfError::NotPdf)));
  }

  #[test]
  fn test_truncated_pdf_is_parse_error() {
    assert!(matches!(PdfDocument::from_bytes(b"%PDF-1.5\n garbage"), Err(PdfError::Parse(_))));
  }

  #[test]
  fn test_text_blocks_and_sizes() {
    let bytes = build(&[TestPage::default().text(12.0, "Small print").text(28.0, "Big Title")]);
    let pdf = PdfDocument::from_bytes(&bytes).unwrap();
    let pages = pdf.pages().unwrap();

    assert_eq!(pages.len(), 1);
    let page = &pages[0];
    assert_eq!(page.number, 1);
    assert_eq!(page.blocks.len(), 2);
    assert_eq!(page.blocks[0].text(), "Small print");
    assert_eq!(page.blocks[1].font_size, 28.0);
    assert_eq!(page.lines(), vec!["Small print", "Big Title"]);
    assert_eq!(page.raw_text(), "Small print\nBig Title\n");
  }

  #[test]
  fn test_media_box_inherited_from_page_tree() {
    let bytes = build(&[TestPage::default()]);
    let page = &PdfDocument::from_bytes(&bytes).unwrap().pages().unwrap()[0];
    assert_eq!((page.width, page.height), (600.0, 800.0));
  }

  #[test]
  fn test_images_with_placed_area() {
    let bytes = build(&[TestPage::default()
      .image(4, 4, 10, 100.0, 50.0)
      .image(2, 2, 200, 300.0, 200.0)]);
    let page = &PdfDocument::from_bytes(&bytes).unwrap().pages().unwrap()[0];

    assert_eq!(page.images.len(), 2);
    assert_eq!(page.images[0].placed_area, 5000.0);
    let largest = page.largest_image().unwrap();
    assert_eq!((largest.width, largest.height), (2, 2));
  }

  #[test]
  fn test_main_image_skips_full_page() {
    let bytes = build(&[TestPage::default()
      .image(2, 2, 0, 600.0, 800.0)
      .image(2, 2, 90, 100.0, 100.0)]);
    let page = &PdfDocument::from_bytes(&bytes).unwrap().pages().unwrap()[0];

    let main = page.main_image(&HashSet::new()).unwrap();
    assert_eq!(main.placed_area, 10_000.0);
    assert_eq!(page.largest_image().unwrap().placed_area, 480_000.0);
  }

  #[test]
  fn test_background_detection() {
    // Same logo on 5 of 6 pages, unique picture on one
    let mut pages: Vec<TestPage> = (0..5)
      .map(|_| TestPage::default().image(2, 2, 7, 50.0, 50.0))
      .collect();
    pages.push(TestPage::default().image(3, 3, 99, 80.0, 80.0));

    let bytes = build(&pages);
    let analyzed = PdfDocument::from_bytes(&bytes).unwrap().pages().unwrap();
    let ignored = background_hashes(&analyzed);

    assert_eq!(ignored.len(), 1);
    assert!(analyzed[0].main_image(&ignored).is_none());
    assert!(analyzed[5].main_image(&ignored).is_some());
  }

  #[test]
  fn test_background_needs_more_than_three_pages() {
    let pages: Vec<TestPage> = (0..3)
      .map(|_| TestPage::default().image(2, 2, 7, 50.0, 50.0))
      .collect();
    let analyzed = PdfDocument::from_bytes(&build(&pages)).unwrap().pages().unwrap();
    assert!(background_hashes(&analyzed).is_empty());
  }

  #[test]
  fn test_extract_gray_image_as_png() {
    let bytes = build(&[TestPage::default().image(3, 2, 128, 30.0, 20.0)]);
    let pdf = PdfDocument::from_bytes(&bytes).unwrap();
    let page = &pdf.pages().unwrap()[0];

    let extracted = pdf.extract_image(&page.images[0]).unwrap();
    assert_eq!(extracted.format, ImageFormat::Png);
    assert!(extracted.bytes.starts_with(b"\x89PNG"));
    assert!(extracted.data_url().starts_with("data:image/png;base64,"));
  }

  #[test]
  fn test_for_each_page_reports_total() {
    let bytes = build(&[TestPage::default(), TestPage::default().text(10.0, "x")]);
    let pdf = PdfDocument::from_bytes(&bytes).unwrap();
    let mut seen = Vec::new();
    pdf
      .for_each_page(|page, total| {
        seen.push((page.number, total));
        Ok(())
      })
      .unwrap();
    assert_eq!(seen, vec![(1, 2), (2, 2)]);
  }

  #[test]
  fn test_decode_text_without_font_encoding() {
    assert_eq!(decode_text(None, b"caf\xe9"), "café");
    assert_eq!(decode_text(None, &[0xFE, 0xFF, 0x00, 0x41, 0x00, 0x42]), "AB");
    // WinAnsi right single quote, not a C1 control
    assert_eq!(decode_text(None, b"it\x92s"), "it\u{2019}s");
  }

  #[test]
  fn test_composite_font_decoded_through_to_unicode() {
    let bytes = build(&[TestPage::default().cid_text(24.0, &[1, 2, 3])]);
    let page = &PdfDocument::from_bytes(&bytes).unwrap().pages().unwrap()[0];

    assert_eq!(page.lines(), vec!["Oak"]);
    assert_eq!(page.blocks[0].font_size, 24.0);
  }

  #[test]
  fn test_fonts_switch_within_a_page() {
    let bytes = build(&[TestPage::default().text(12.0, "Tall tree").cid_text(20.0, &[3, 2])]);
    let page = &PdfDocument::from_bytes(&bytes).unwrap().pages().unwrap()[0];
    assert_eq!(page.lines(), vec!["Tall tree", "ka"]);
  }

  #[test]
  fn test_oversized_image_is_rejected_not_allocated() {
    let bytes = build(&[TestPage::default().raw_image(TestImage {
      width: 4_294_967_295,
      height: 4_294_967_295,
      color_space: "DeviceRGB",
      data: vec![0; 12],
      placed: (100.0, 100.0),
    })]);
    let pdf = PdfDocument::from_bytes(&bytes).unwrap();
    let page = &pdf.pages().unwrap()[0];

    assert_eq!(page.images.len(), 1);
    assert!(matches!(pdf.extract_image(&page.images[0]), Err(PdfError::UnsupportedImage(_))));
  }

  #[test]
  fn test_image_with_negative_size_is_skipped() {
    let bytes = build(&[TestPage::default().raw_image(TestImage {
      width: -3,
      height: 2,
      color_space: "DeviceGray",
      data: vec![0; 6],
      placed: (100.0, 100.0),
    })]);
    let page = &PdfDocument::from_bytes(&bytes).unwrap().pages().unwrap()[0];
    assert!(page.images.is_empty());
  }

  #[test]
  fn test_matrix_multiply() {
    let scale = [2.0, 0.0, 0.0, 3.0, 0.0, 0.0];
    let shift = [1.0, 0.0, 0.0, 1.0, 5.0, 7.0];
    assert_eq!(multiply(&scale, &shift), [2.0, 0.0, 0.0, 3.0, 5.0, 7.0]);
    assert_eq!(multiply(&shift, &scale), [2.0, 0.0, 0.0, 3.0, 10.0, 21.0]);
  }
}
