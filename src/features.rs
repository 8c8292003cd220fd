//! Feature derivation.
//!
//! Every layout element becomes one [`FeatureRow`] with the same column set.
//! Font sizes are compared against a single document-wide average computed
//! over all text lines.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::{ElementKind, FeatureRow, LayoutElement};
use crate::policy::{BOLD_FONT_KEYWORD, DEFAULT_AVG_FONT_SIZE, NUMBERING_PATTERN};

/// Whether a font name denotes a bold face.
pub fn is_bold_font(font_name: &str) -> bool {
    font_name.to_lowercase().contains(BOLD_FONT_KEYWORD)
}

/// Share of uppercase letters among alphabetic characters (0 with no letters).
pub fn uppercase_ratio(text: &str) -> f32 {
    let (letters, upper) = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(letters, upper), c| {
            (letters + 1, upper + usize::from(c.is_uppercase()))
        });

    if letters == 0 {
        0.0
    } else {
        upper as f32 / letters as f32
    }
}

/// Character count of the trimmed text.
pub fn text_length(text: &str) -> usize {
    text.trim().chars().count()
}

/// Whether the trimmed text starts with a heading number such as `1.2)` or `IV.`.
pub fn contains_numbering(text: &str) -> bool {
    static NUMBERING: OnceLock<Regex> = OnceLock::new();
    NUMBERING
        .get_or_init(|| Regex::new(NUMBERING_PATTERN).expect("numbering pattern is valid"))
        .is_match(text.trim())
}

/// Derives feature rows relative to document-wide statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureDeriver {
    avg_font_size: f32,
}

impl FeatureDeriver {
    /// Compute the document statistics from all elements.
    ///
    /// The average font size covers text elements only and falls back to
    /// [`DEFAULT_AVG_FONT_SIZE`] when there are none.
    pub fn new(elements: &[LayoutElement]) -> Self {
        let sizes: Vec<f32> = elements
            .iter()
            .filter_map(|e| match e {
                LayoutElement::Text(t) => Some(t.font_size),
                _ => None,
            })
            .collect();

        let avg_font_size = if sizes.is_empty() {
            DEFAULT_AVG_FONT_SIZE
        } else {
            sizes.iter().sum::<f32>() / sizes.len() as f32
        };

        Self { avg_font_size }
    }

    /// Use a known average font size.
    pub fn with_avg_font_size(avg_font_size: f32) -> Self {
        Self { avg_font_size }
    }

    /// Document-wide average text font size.
    pub fn avg_font_size(&self) -> f32 {
        self.avg_font_size
    }

    /// Feature row of one element; fields irrelevant to its kind are 0.
    pub fn derive(&self, element: &LayoutElement) -> FeatureRow {
        let mut row = FeatureRow::empty(element.kind(), element.page_number());
        row.y_position = element.y_position();

        match element {
            LayoutElement::Text(text) => {
                row.content = text.content.clone();
                row.font_size = text.font_size;
                row.font_size_relative = if self.avg_font_size != 0.0 {
                    text.font_size / self.avg_font_size
                } else {
                    0.0
                };
                row.is_bold = u8::from(text.is_bold);
                row.uppercase_ratio = uppercase_ratio(&text.content);
                row.text_length = text_length(&text.content);
                row.contains_numbering = u8::from(contains_numbering(&text.content));
                row.block_width = text.block_width;
            }
            LayoutElement::Image(image) => {
                row.content = image.image_path.display().to_string();
                row.block_width = image.width;
                row.image_area = image.area;
                row.image_aspect_ratio = image.aspect_ratio;
            }
            LayoutElement::Table(table) => {
                row.content = table.table_path.display().to_string();
                row.block_width = table.width;
                row.table_rows = table.rows;
                row.table_columns = table.columns;
            }
        }

        row
    }

    /// Feature rows of all elements, in order.
    pub fn derive_all(&self, elements: &[LayoutElement]) -> Vec<FeatureRow> {
        elements.iter().map(|e| self.derive(e)).collect()
    }
}

/// Derive the feature table of an ordered element stream.
pub fn derive_features(elements: &[LayoutElement]) -> Vec<FeatureRow> {
    let deriver = FeatureDeriver::new(elements);
    log::debug!(
        "Deriving features for {} elements (avg font size {:.2})",
        elements.len(),
        deriver.avg_font_size()
    );
    deriver.derive_all(elements)
}

/// Count of rows per element kind.
pub fn kind_counts(rows: &[FeatureRow]) -> [(ElementKind, usize); 3] {
    let count = |kind| rows.iter().filter(|r| r.kind == kind).count();
    [
        (ElementKind::Text, count(ElementKind::Text)),
        (ElementKind::Image, count(ElementKind::Image)),
        (ElementKind::Table, count(ElementKind::Table)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, ImageElement, TableElement, TextElement};

    fn text(content: &str, size: f32, bold: bool) -> LayoutElement {
        TextElement::new(
            1,
            BoundingBox::new(10.0, 100.0, 210.0, 112.0),
            100.0,
            content,
            size,
            bold,
            300.0,
        )
        .into()
    }

    #[test]
    fn test_contains_numbering() {
        assert!(contains_numbering("1.2 Introduction"));
        assert!(contains_numbering("  3) Results"));
        assert!(contains_numbering("A. Appendix"));
        assert!(contains_numbering("IV. Conclusion"));
        assert!(!contains_numbering("introduction"));
        assert!(!contains_numbering("1 Introduction"));
        assert!(!contains_numbering(""));
    }

    #[test]
    fn test_uppercase_ratio() {
        assert_eq!(uppercase_ratio("ABC def"), 0.5);
        assert_eq!(uppercase_ratio("123 !!"), 0.0);
        assert_eq!(uppercase_ratio(""), 0.0);
        assert_eq!(uppercase_ratio("ÉTÉ"), 1.0);
    }

    #[test]
    fn test_text_length_and_bold() {
        assert_eq!(text_length("  hello  "), 5);
        assert_eq!(text_length("héllo"), 5);
        assert!(is_bold_font("Helvetica-BOLD"));
        assert!(is_bold_font("ABCDEF+Arial,Bold"));
        assert!(!is_bold_font("Times-Roman"));
        assert!(!is_bold_font(""));
    }

    #[test]
    fn test_document_average_font_size() {
        let elements = vec![
            text("a", 10.0, false),
            text("b", 20.0, false),
            ImageElement::new(1, BoundingBox::new(0.0, 0.0, 10.0, 10.0), "i.png").into(),
        ];
        assert_eq!(FeatureDeriver::new(&elements).avg_font_size(), 15.0);
        assert_eq!(FeatureDeriver::new(&[]).avg_font_size(), DEFAULT_AVG_FONT_SIZE);
    }

    #[test]
    fn test_text_row() {
        let deriver = FeatureDeriver::with_avg_font_size(12.0);
        let row = deriver.derive(&text("1. INTRO", 18.0, true));

        assert_eq!(row.kind, ElementKind::Text);
        assert_eq!(row.font_size_relative, 1.5);
        assert_eq!(row.is_bold, 1);
        assert_eq!(row.uppercase_ratio, 1.0);
        assert_eq!(row.text_length, 8);
        assert_eq!(row.contains_numbering, 1);
        assert_eq!(row.y_position, 100.0);
        assert_eq!(row.block_width, 300.0);
        assert_eq!(row.image_area, 0.0);
        assert_eq!(row.table_rows, 0);
        assert!(row.label.is_none());
    }

    #[test]
    fn test_zero_average_gives_zero_relative_size() {
        let row = FeatureDeriver::with_avg_font_size(0.0).derive(&text("x", 12.0, false));
        assert_eq!(row.font_size_relative, 0.0);
    }

    #[test]
    fn test_image_and_table_rows_use_element_width() {
        let deriver = FeatureDeriver::with_avg_font_size(12.0);

        let image = ImageElement::new(2, BoundingBox::new(0.0, 50.0, 200.0, 150.0), "i.png");
        let row = deriver.derive(&image.into());
        assert_eq!(row.kind, ElementKind::Image);
        assert_eq!(row.page_number, 2);
        assert_eq!(row.block_width, 200.0);
        assert_eq!(row.image_area, 20000.0);
        assert_eq!(row.image_aspect_ratio, 2.0);
        assert_eq!(row.font_size, 0.0);
        assert_eq!(row.content, "i.png");

        let table = TableElement::new(1, BoundingBox::new(0.0, 0.0, 100.0, 50.0), "t.csv", 2, 3);
        let row = deriver.derive(&table.into());
        assert_eq!(row.block_width, 100.0);
        assert_eq!((row.table_rows, row.table_columns), (2, 3));
        assert_eq!(row.image_area, 0.0);
    }

    #[test]
    fn test_kind_counts() {
        let rows = derive_features(&[text("a", 12.0, false), text("b", 12.0, false)]);
        assert_eq!(kind_counts(&rows)[0], (ElementKind::Text, 2));
        assert_eq!(kind_counts(&rows)[1], (ElementKind::Image, 0));
    }
}
