//! Rule-based labeling.
//!
//! Rules are evaluated in order and the first match wins:
//!
//! 1. Image rows are [`Label::Image`].
//! 2. Table rows are [`Label::Table`].
//! 3. Bold text clearly larger than average is a [`Label::Heading`].
//! 4. Bold text somewhat larger than average is a [`Label::Subheading`].
//! 5. Short text near the bottom of the page is a [`Label::Footer`].
//! 6. Everything else is a [`Label::Paragraph`].

use std::path::Path;

use crate::error::Result;
use crate::model::{ElementKind, FeatureRow, Label};
use crate::policy::LabelPolicy;
use crate::render::{read_features_json, write_features_json, JsonFormat};

/// Applies the labeling rules with tunable thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RuleLabeler {
    policy: LabelPolicy,
}

impl RuleLabeler {
    /// Create a labeler with the default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a labeler with custom thresholds.
    pub fn with_policy(policy: LabelPolicy) -> Self {
        Self { policy }
    }

    /// The thresholds in use.
    pub fn policy(&self) -> &LabelPolicy {
        &self.policy
    }

    /// Label for one row.
    pub fn label(&self, row: &FeatureRow) -> Label {
        let p = &self.policy;
        match row.kind {
            ElementKind::Image => Label::Image,
            ElementKind::Table => Label::Table,
            ElementKind::Text => {
                let bold = row.is_bold != 0;
                if bold && row.font_size_relative > p.heading_min_relative_size {
                    Label::Heading
                } else if bold && row.font_size_relative > p.subheading_min_relative_size {
                    Label::Subheading
                } else if row.text_length < p.footer_max_text_length
                    && row.y_position > p.footer_min_y_position
                {
                    Label::Footer
                } else {
                    Label::Paragraph
                }
            }
        }
    }

    /// Set the label of every row, replacing any previous label.
    pub fn label_rows(&self, rows: &mut [FeatureRow]) {
        for row in rows.iter_mut() {
            row.label = Some(self.label(row));
        }
    }
}

/// Label rows in place with the default thresholds.
pub fn label_rows(rows: &mut [FeatureRow]) {
    RuleLabeler::new().label_rows(rows);
}

/// Load a feature table, label it, and write the labeled table.
///
/// Returns the number of labeled rows.
pub fn label_file(input: &Path, output: &Path, labeler: &RuleLabeler) -> Result<usize> {
    let mut rows = read_features_json(input)?;
    labeler.label_rows(&mut rows);
    write_features_json(output, &rows, JsonFormat::Pretty)?;

    log::info!(
        "Labeled {} rows from {} into {}",
        rows.len(),
        input.display(),
        output.display()
    );
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(relative: f32, bold: bool, length: usize, y: f32) -> FeatureRow {
        let mut row = FeatureRow::empty(ElementKind::Text, 1);
        row.font_size_relative = relative;
        row.is_bold = u8::from(bold);
        row.text_length = length;
        row.y_position = y;
        row
    }

    #[test]
    fn test_image_and_table_rows() {
        let labeler = RuleLabeler::new();
        assert_eq!(labeler.label(&FeatureRow::empty(ElementKind::Image, 1)), Label::Image);
        assert_eq!(labeler.label(&FeatureRow::empty(ElementKind::Table, 1)), Label::Table);
    }

    #[test]
    fn test_heading_thresholds_are_strict() {
        let labeler = RuleLabeler::new();
        assert_eq!(labeler.label(&text_row(1.5, true, 10, 100.0)), Label::Heading);
        assert_eq!(labeler.label(&text_row(1.4, true, 10, 100.0)), Label::Subheading);
        assert_eq!(labeler.label(&text_row(1.2, true, 10, 100.0)), Label::Subheading);
        assert_eq!(labeler.label(&text_row(1.1, true, 10, 100.0)), Label::Paragraph);
        assert_eq!(labeler.label(&text_row(2.0, false, 60, 100.0)), Label::Paragraph);
    }

    #[test]
    fn test_footer_rule() {
        let labeler = RuleLabeler::new();
        assert_eq!(labeler.label(&text_row(1.0, false, 3, 780.0)), Label::Footer);
        assert_eq!(labeler.label(&text_row(1.0, false, 40, 780.0)), Label::Paragraph);
        assert_eq!(labeler.label(&text_row(1.0, false, 3, 750.0)), Label::Paragraph);
        // Headings win over the footer zone
        assert_eq!(labeler.label(&text_row(2.0, true, 3, 780.0)), Label::Heading);
    }

    #[test]
    fn test_custom_policy() {
        let labeler = RuleLabeler::with_policy(LabelPolicy::new().with_footer_zone(10, 500.0));
        assert_eq!(labeler.label(&text_row(1.0, false, 5, 600.0)), Label::Footer);
        assert_eq!(labeler.label(&text_row(1.0, false, 12, 600.0)), Label::Paragraph);
    }

    #[test]
    fn test_label_rows_overwrites() {
        let mut rows = vec![text_row(1.0, false, 100, 10.0)];
        rows[0].label = Some(Label::Heading);
        label_rows(&mut rows);
        assert_eq!(rows[0].label, Some(Label::Paragraph));
    }
}
