//! Content-model abstraction layer.
//!
//! The collectors only see the [`ContentModel`] trait: per-page text
//! structured as blocks of lines of spans, image placements with their raw
//! bytes, the page count and the document metadata. [`LopdfBackend`] is the
//! built-in implementation; tests and other PDF engines can provide their own.
//!
//! [`LopdfBackend`]: super::LopdfBackend

use crate::error::Result;
use crate::model::{BoundingBox, Metadata};

/// PDF object reference: (object number, generation number).
pub type ObjectRef = (u32, u16);

/// A run of text with one font and size.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    /// The text content
    pub text: String,
    /// Font name (e.g., "Helvetica-Bold")
    pub font: String,
    /// Font size in points
    pub size: f32,
    /// Position on the page
    pub bbox: BoundingBox,
}

impl Span {
    /// Create a new span.
    pub fn new(text: impl Into<String>, font: impl Into<String>, size: f32, bbox: BoundingBox) -> Self {
        Self {
            text: text.into(),
            font: font.into(),
            size,
            bbox,
        }
    }
}

/// Spans sharing a baseline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextLine {
    /// The spans in this line, left to right
    pub spans: Vec<Span>,
}

impl TextLine {
    /// Create a line from spans.
    pub fn new(spans: Vec<Span>) -> Self {
        Self { spans }
    }

    /// Union of the span boxes.
    pub fn bbox(&self) -> Option<BoundingBox> {
        self.spans
            .iter()
            .map(|s| s.bbox)
            .reduce(|acc, b| acc.union(&b))
    }
}

/// A visually contiguous group of lines.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    /// Region covered by the block
    pub bbox: BoundingBox,
    /// Lines, top to bottom
    pub lines: Vec<TextLine>,
}

impl TextBlock {
    /// Create a block; its box is the union of its lines.
    pub fn from_lines(lines: Vec<TextLine>) -> Self {
        let bbox = lines
            .iter()
            .filter_map(TextLine::bbox)
            .reduce(|acc, b| acc.union(&b))
            .unwrap_or_default();
        Self { bbox, lines }
    }
}

/// Structured text of one page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageText {
    /// Page index (0-based)
    pub page_index: u32,
    /// Text blocks, top to bottom
    pub blocks: Vec<TextBlock>,
}

impl PageText {
    /// Total number of spans on the page.
    pub fn span_count(&self) -> usize {
        self.blocks
            .iter()
            .flat_map(|b| b.lines.iter())
            .map(|l| l.spans.len())
            .sum()
    }

    /// Whether the page carries no spans at all.
    pub fn is_empty(&self) -> bool {
        self.span_count() == 0
    }
}

/// An image drawn on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    /// Page index (0-based)
    pub page_index: u32,
    /// Resource name (e.g., "Im0")
    pub name: String,
    /// Image stream object
    pub object: ObjectRef,
    /// Placement on the page
    pub bbox: BoundingBox,
}

/// Raw image bytes ready to be written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    /// Encoded bytes
    pub bytes: Vec<u8>,
    /// File extension matching the encoding (e.g., "jpg", "png")
    pub extension: String,
}

/// Abstract interface for the PDF content model.
///
/// Page indices are 0-based; the collectors turn them into 1-based page
/// numbers.
pub trait ContentModel: Sync {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Document metadata.
    fn metadata(&self) -> Result<Metadata>;

    /// Blocks, lines and spans of one page.
    fn page_text(&self, page_index: u32) -> Result<PageText>;

    /// Image placements of one page, in drawing order.
    fn page_images(&self, page_index: u32) -> Result<Vec<ImageRef>>;

    /// Bytes and extension of one image.
    fn image_data(&self, image: &ImageRef) -> Result<ImageData>;
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16(&utf16).unwrap_or_default();
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, x0: f32, y0: f32) -> Span {
        Span::new(
            text,
            "Helvetica",
            12.0,
            BoundingBox::new(x0, y0, x0 + 30.0, y0 + 12.0),
        )
    }

    #[test]
    fn test_decode_text_simple() {
        assert_eq!(decode_text_simple(b"Hello"), "Hello");
        assert_eq!(decode_text_simple(&[0x48, 0x65, 0x6C, 0x6C, 0xE9]), "Hellé");
        assert_eq!(decode_text_simple(&[0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69]), "Hi");
    }

    #[test]
    fn test_block_bbox_is_union_of_lines() {
        let block = TextBlock::from_lines(vec![
            TextLine::new(vec![span("a", 10.0, 100.0), span("b", 50.0, 100.0)]),
            TextLine::new(vec![span("c", 20.0, 115.0)]),
        ]);
        assert_eq!(block.bbox, BoundingBox::new(10.0, 100.0, 80.0, 127.0));
    }

    #[test]
    fn test_page_text_span_count() {
        let page = PageText {
            page_index: 0,
            blocks: vec![TextBlock::from_lines(vec![TextLine::new(vec![
                span("a", 0.0, 0.0),
                span("b", 40.0, 0.0),
            ])])],
        };
        assert_eq!(page.span_count(), 2);
        assert!(!page.is_empty());
        assert!(PageText::default().is_empty());
    }
}
