//! Feature rows: the flat per-element record consumed by labeling and
//! classification.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::ElementKind;

/// Structural role assigned to a layout element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    /// Top-level heading
    Heading,
    /// Secondary heading
    Subheading,
    /// Body text
    Paragraph,
    /// Page footer
    Footer,
    /// Image
    Image,
    /// Table
    Table,
}

impl Label {
    /// All labels, in declaration order.
    pub const ALL: [Label; 6] = [
        Label::Heading,
        Label::Subheading,
        Label::Paragraph,
        Label::Footer,
        Label::Image,
        Label::Table,
    ];

    /// Label name as written to feature tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Heading => "Heading",
            Label::Subheading => "Subheading",
            Label::Paragraph => "Paragraph",
            Label::Footer => "Footer",
            Label::Image => "Image",
            Label::Table => "Table",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Label::ALL
            .iter()
            .copied()
            .find(|label| label.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown label: {}", s))
    }
}

/// One row of the feature table.
///
/// Every row carries every column; columns that do not apply to the row's
/// element type are zero. `content` holds the line text for text rows and the
/// exported file path for image and table rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Element type
    #[serde(rename = "type")]
    pub kind: ElementKind,
    /// Page number (1-indexed)
    #[serde(default)]
    pub page_number: u32,
    /// Text or artifact path
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,

    /// Largest span size on the line
    #[serde(default)]
    pub font_size: f32,
    /// `font_size` over the document-wide average
    #[serde(default)]
    pub font_size_relative: f32,
    /// 1 when bold
    #[serde(default)]
    pub is_bold: u8,

    /// Uppercase letters over alphabetic characters
    #[serde(default)]
    pub uppercase_ratio: f32,
    /// Trimmed character count
    #[serde(default)]
    pub text_length: usize,
    /// 1 when the text starts with a heading number
    #[serde(default)]
    pub contains_numbering: u8,

    /// Top edge on the page
    #[serde(default)]
    pub y_position: f32,
    /// Block width for text, element width otherwise
    #[serde(default)]
    pub block_width: f32,

    /// Image placement area
    #[serde(default)]
    pub image_area: f32,
    /// Image width / height
    #[serde(default)]
    pub image_aspect_ratio: f32,

    /// Table row count
    #[serde(default)]
    pub table_rows: usize,
    /// Table column count
    #[serde(default)]
    pub table_columns: usize,

    /// Assigned label, if any
    #[serde(default)]
    pub label: Option<Label>,
}

impl FeatureRow {
    /// A zero-filled row of the given kind.
    pub fn empty(kind: ElementKind, page_number: u32) -> Self {
        Self {
            kind,
            page_number,
            content: String::new(),
            font_size: 0.0,
            font_size_relative: 0.0,
            is_bold: 0,
            uppercase_ratio: 0.0,
            text_length: 0,
            contains_numbering: 0,
            y_position: 0.0,
            block_width: 0.0,
            image_area: 0.0,
            image_aspect_ratio: 0.0,
            table_rows: 0,
            table_columns: 0,
            label: None,
        }
    }
}

/// Feature tables written by other tools carry `null` content for images and tables.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip_names() {
        for label in Label::ALL {
            assert_eq!(label.as_str().parse::<Label>().unwrap(), label);
        }
        assert_eq!("heading".parse::<Label>().unwrap(), Label::Heading);
        assert!("Caption".parse::<Label>().is_err());
    }

    #[test]
    fn test_unlabeled_row_serializes_null_label() {
        let row = FeatureRow::empty(ElementKind::Image, 3);
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"type\":\"Image\""));
        assert!(json.contains("\"label\":null"));
    }

    #[test]
    fn test_row_without_optional_columns_deserializes() {
        // Table rows from older exports have no image_aspect_ratio column.
        let json = r#"{"type":"Table","page_number":1,"content":"t.csv",
            "table_rows":2,"table_columns":3,"label":"Table"}"#;
        let row: FeatureRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.kind, ElementKind::Table);
        assert_eq!(row.image_aspect_ratio, 0.0);
        assert_eq!(row.label, Some(Label::Table));
    }
}
