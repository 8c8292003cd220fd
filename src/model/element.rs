//! Layout elements: one normalized unit of page content.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::BoundingBox;

/// Discriminant of a [`LayoutElement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    /// One line of text
    Text,
    /// An embedded image placement
    Image,
    /// A detected table
    Table,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::Text => "Text",
            ElementKind::Image => "Image",
            ElementKind::Table => "Table",
        };
        f.write_str(name)
    }
}

/// A page-positioned layout element.
///
/// Serialized as a flat object discriminated by `"type"`. Elements read from
/// external JSON without `page_number` or `y_position` default to 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LayoutElement {
    /// A text line
    Text(TextElement),
    /// An image
    Image(ImageElement),
    /// A table
    Table(TableElement),
}

impl LayoutElement {
    /// The element's kind.
    pub fn kind(&self) -> ElementKind {
        match self {
            LayoutElement::Text(_) => ElementKind::Text,
            LayoutElement::Image(_) => ElementKind::Image,
            LayoutElement::Table(_) => ElementKind::Table,
        }
    }

    /// Page number (1-indexed, 0 when unknown).
    pub fn page_number(&self) -> u32 {
        match self {
            LayoutElement::Text(e) => e.page_number,
            LayoutElement::Image(e) => e.page_number,
            LayoutElement::Table(e) => e.page_number,
        }
    }

    /// Vertical sort key (top edge of the element).
    pub fn y_position(&self) -> f32 {
        match self {
            LayoutElement::Text(e) => e.y_position,
            LayoutElement::Image(e) => e.y_position,
            LayoutElement::Table(e) => e.y_position,
        }
    }

    /// Bounding box on the page.
    pub fn bbox(&self) -> BoundingBox {
        match self {
            LayoutElement::Text(e) => e.bbox,
            LayoutElement::Image(e) => e.bbox,
            LayoutElement::Table(e) => e.bbox,
        }
    }

    /// Element width.
    pub fn width(&self) -> f32 {
        match self {
            LayoutElement::Text(e) => e.width,
            LayoutElement::Image(e) => e.width,
            LayoutElement::Table(e) => e.width,
        }
    }

    /// Replace a non-finite `y_position` with 0.
    pub(crate) fn normalize_position(&mut self) {
        let y = match self {
            LayoutElement::Text(e) => &mut e.y_position,
            LayoutElement::Image(e) => &mut e.y_position,
            LayoutElement::Table(e) => &mut e.y_position,
        };
        if !y.is_finite() {
            log::debug!("Element without a usable y position, defaulting to 0");
            *y = 0.0;
        }
    }
}

impl From<TextElement> for LayoutElement {
    fn from(element: TextElement) -> Self {
        LayoutElement::Text(element)
    }
}

impl From<ImageElement> for LayoutElement {
    fn from(element: ImageElement) -> Self {
        LayoutElement::Image(element)
    }
}

impl From<TableElement> for LayoutElement {
    fn from(element: TableElement) -> Self {
        LayoutElement::Table(element)
    }
}

/// One line of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextElement {
    /// Page number (1-indexed)
    #[serde(default)]
    pub page_number: u32,
    /// Union of the line's span boxes
    #[serde(default)]
    pub bbox: BoundingBox,
    /// Top edge of the line's first span
    #[serde(default)]
    pub y_position: f32,
    /// Line width
    #[serde(default)]
    pub width: f32,
    /// Joined, trimmed span text
    pub content: String,
    /// Largest span size on the line
    pub font_size: f32,
    /// Whether any span uses a bold font
    pub is_bold: bool,
    /// Width of the enclosing text block
    #[serde(default)]
    pub block_width: f32,
}

impl TextElement {
    /// Create a text element; `y_position` is the top edge of the first span.
    pub fn new(
        page_number: u32,
        bbox: BoundingBox,
        y_position: f32,
        content: impl Into<String>,
        font_size: f32,
        is_bold: bool,
        block_width: f32,
    ) -> Self {
        Self {
            page_number,
            bbox,
            y_position,
            width: bbox.width(),
            content: content.into(),
            font_size,
            is_bold,
            block_width,
        }
    }
}

/// An image placed on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageElement {
    /// Page number (1-indexed)
    #[serde(default)]
    pub page_number: u32,
    /// Placement box
    #[serde(default)]
    pub bbox: BoundingBox,
    /// Top edge of the placement
    #[serde(default)]
    pub y_position: f32,
    /// Placement width
    #[serde(default)]
    pub width: f32,
    /// Placement height
    #[serde(default)]
    pub height: f32,
    /// Where the image bytes were written
    pub image_path: PathBuf,
    /// Placement area
    #[serde(default)]
    pub area: f32,
    /// Width / height, 0 for zero height
    #[serde(default)]
    pub aspect_ratio: f32,
}

impl ImageElement {
    /// Create an image element, deriving the box metrics.
    pub fn new(page_number: u32, bbox: BoundingBox, image_path: impl Into<PathBuf>) -> Self {
        Self {
            page_number,
            bbox,
            y_position: bbox.y0,
            width: bbox.width(),
            height: bbox.height(),
            image_path: image_path.into(),
            area: bbox.area(),
            aspect_ratio: bbox.aspect_ratio(),
        }
    }
}

/// A detected table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableElement {
    /// Page number (1-indexed)
    #[serde(default)]
    pub page_number: u32,
    /// Table region
    #[serde(default)]
    pub bbox: BoundingBox,
    /// Top edge of the region
    #[serde(default)]
    pub y_position: f32,
    /// Region width
    #[serde(default)]
    pub width: f32,
    /// Region height
    #[serde(default)]
    pub height: f32,
    /// Where the CSV export was written
    pub table_path: PathBuf,
    /// Row count
    pub rows: usize,
    /// Column count
    pub columns: usize,
    /// Region area
    #[serde(default)]
    pub area: f32,
    /// Width / height, 0 for zero height
    #[serde(default)]
    pub aspect_ratio: f32,
}

impl TableElement {
    /// Create a table element, deriving the box metrics.
    pub fn new(
        page_number: u32,
        bbox: BoundingBox,
        table_path: impl Into<PathBuf>,
        rows: usize,
        columns: usize,
    ) -> Self {
        Self {
            page_number,
            bbox,
            y_position: bbox.y0,
            width: bbox.width(),
            height: bbox.height(),
            table_path: table_path.into(),
            rows,
            columns,
            area: bbox.area(),
            aspect_ratio: bbox.aspect_ratio(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_element_metrics() {
        let image = ImageElement::new(2, BoundingBox::new(0.0, 100.0, 200.0, 200.0), "a.png");
        assert_eq!(image.y_position, 100.0);
        assert_eq!(image.width, 200.0);
        assert_eq!(image.area, 20000.0);
        assert_eq!(image.aspect_ratio, 2.0);
    }

    #[test]
    fn test_flat_image_has_zero_aspect_ratio() {
        let image = ImageElement::new(1, BoundingBox::new(0.0, 100.0, 200.0, 100.0), "a.png");
        assert_eq!(image.aspect_ratio, 0.0);
    }

    #[test]
    fn test_element_serializes_with_type_tag() {
        let element: LayoutElement = TableElement::new(
            1,
            BoundingBox::new(0.0, 0.0, 100.0, 50.0),
            "tables/table_1.csv",
            2,
            3,
        )
        .into();

        let json = serde_json::to_string(&element).unwrap();
        assert!(json.contains("\"type\":\"Table\""));
        assert!(json.contains("\"rows\":2"));
    }

    #[test]
    fn test_missing_placement_defaults_to_zero() {
        let json = r#"{"type":"Text","content":"Hello","font_size":12.0,"is_bold":false}"#;
        let element: LayoutElement = serde_json::from_str(json).unwrap();
        assert_eq!(element.kind(), ElementKind::Text);
        assert_eq!(element.page_number(), 0);
        assert_eq!(element.y_position(), 0.0);
    }

    #[test]
    fn test_normalize_position() {
        let mut element: LayoutElement = TextElement::new(
            1,
            BoundingBox::default(),
            f32::NAN,
            "x",
            10.0,
            false,
            0.0,
        )
        .into();
        element.normalize_position();
        assert_eq!(element.y_position(), 0.0);
    }
}
