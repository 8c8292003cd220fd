//! Classifier boundary.
//!
//! A trained model sees the feature table as an ordered numeric matrix:
//! identifying and noisy columns (`page_number`, `content`, `type`,
//! `contains_numbering`) are dropped and the remaining columns always come in
//! [`CLASSIFIER_COLUMNS`] order.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};
use crate::label::RuleLabeler;
use crate::model::{ElementKind, FeatureRow, Label};

/// Column order expected by trained classifiers.
pub const CLASSIFIER_COLUMNS: [&str; 11] = [
    "font_size",
    "font_size_relative",
    "is_bold",
    "uppercase_ratio",
    "text_length",
    "y_position",
    "block_width",
    "image_area",
    "table_rows",
    "table_columns",
    "image_aspect_ratio",
];

/// Number of classifier columns.
pub const CLASSIFIER_WIDTH: usize = CLASSIFIER_COLUMNS.len();

/// Ordered numeric view of a feature table, with the labels alongside.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureMatrix {
    rows: Vec<[f32; CLASSIFIER_WIDTH]>,
    labels: Vec<Option<Label>>,
}

impl FeatureMatrix {
    /// Build the matrix from feature rows; non-finite values become 0.
    pub fn from_rows(rows: &[FeatureRow]) -> Self {
        let values = rows.iter().map(row_values).collect();
        let labels = rows.iter().map(|r| r.label).collect();
        Self {
            rows: values,
            labels,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Matrix rows in [`CLASSIFIER_COLUMNS`] order.
    pub fn rows(&self) -> &[[f32; CLASSIFIER_WIDTH]] {
        &self.rows
    }

    /// Labels of the source rows.
    pub fn labels(&self) -> &[Option<Label>] {
        &self.labels
    }

    /// One column by name.
    pub fn column(&self, name: &str) -> Option<Vec<f32>> {
        let index = CLASSIFIER_COLUMNS.iter().position(|c| *c == name)?;
        Some(self.rows.iter().map(|r| r[index]).collect())
    }

    /// Rescale every column to [0, 1]; constant columns become 0.
    pub fn min_max_scaled(&self) -> Self {
        let mut scaled = self.clone();
        for col in 0..CLASSIFIER_WIDTH {
            let (min, max) = self
                .rows
                .iter()
                .map(|r| r[col])
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                });
            let range = max - min;
            for row in &mut scaled.rows {
                row[col] = if range > 0.0 { (row[col] - min) / range } else { 0.0 };
            }
        }
        scaled
    }

    /// Write the matrix as CSV, with a trailing `label` column.
    pub fn write_csv_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);

        let mut header: Vec<&str> = CLASSIFIER_COLUMNS.to_vec();
        header.push("label");
        writer.write_record(&header)?;

        for (values, label) in self.rows.iter().zip(&self.labels) {
            let mut record: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            record.push(label.map(|l| l.to_string()).unwrap_or_default());
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write the matrix to a CSV file.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        self.write_csv_to(fs::File::create(path)?)
    }
}

fn row_values(row: &FeatureRow) -> [f32; CLASSIFIER_WIDTH] {
    let values = [
        row.font_size,
        row.font_size_relative,
        f32::from(row.is_bold),
        row.uppercase_ratio,
        row.text_length as f32,
        row.y_position,
        row.block_width,
        row.image_area,
        row.table_rows as f32,
        row.table_columns as f32,
        row.image_aspect_ratio,
    ];
    values.map(|v| if v.is_finite() { v } else { 0.0 })
}

/// A model predicting one label per matrix row.
pub trait Classifier {
    /// Predict labels, one per row of `matrix`, in order.
    fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<Label>>;
}

/// Predict labels for `rows` and store them in place.
///
/// Fails without touching the rows if the classifier returns the wrong number
/// of labels.
pub fn apply_classifier<C: Classifier + ?Sized>(classifier: &C, rows: &mut [FeatureRow]) -> Result<()> {
    let matrix = FeatureMatrix::from_rows(rows);
    let labels = classifier.predict(&matrix)?;

    if labels.len() != rows.len() {
        return Err(Error::Classifier(format!(
            "expected {} predictions, got {}",
            rows.len(),
            labels.len()
        )));
    }

    for (row, label) in rows.iter_mut().zip(labels) {
        row.label = Some(label);
    }
    Ok(())
}

/// The rule labeler behind the [`Classifier`] interface.
///
/// Works on an unscaled matrix. Rows without font size and text length are
/// tables when they have table columns, images otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleClassifier {
    labeler: RuleLabeler,
}

impl RuleClassifier {
    /// Wrap a rule labeler.
    pub fn new(labeler: RuleLabeler) -> Self {
        Self { labeler }
    }
}

impl Classifier for RuleClassifier {
    fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<Label>> {
        Ok(matrix
            .rows()
            .iter()
            .map(|values| self.labeler.label(&row_from_values(values)))
            .collect())
    }
}

fn row_from_values(values: &[f32; CLASSIFIER_WIDTH]) -> FeatureRow {
    // Text rows always carry a font size and a length
    let kind = if values[0] > 0.0 || values[4] > 0.0 {
        ElementKind::Text
    } else if values[8] > 0.0 || values[9] > 0.0 {
        ElementKind::Table
    } else {
        ElementKind::Image
    };

    let mut row = FeatureRow::empty(kind, 0);
    row.font_size = values[0];
    row.font_size_relative = values[1];
    row.is_bold = u8::from(values[2] > 0.0);
    row.uppercase_ratio = values[3];
    row.text_length = values[4] as usize;
    row.y_position = values[5];
    row.block_width = values[6];
    row.image_area = values[7];
    row.table_rows = values[8] as usize;
    row.table_columns = values[9] as usize;
    row.image_aspect_ratio = values[10];
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(size: f32, relative: f32, bold: bool, y: f32) -> FeatureRow {
        let mut row = FeatureRow::empty(ElementKind::Text, 1);
        row.content = "ignored".to_string();
        row.font_size = size;
        row.font_size_relative = relative;
        row.is_bold = u8::from(bold);
        row.text_length = 7;
        row.y_position = y;
        row.block_width = 300.0;
        row.contains_numbering = 1;
        row
    }

    fn image_row() -> FeatureRow {
        let mut row = FeatureRow::empty(ElementKind::Image, 1);
        row.image_area = 20000.0;
        row.image_aspect_ratio = 2.0;
        row.block_width = 200.0;
        row
    }

    fn table_row() -> FeatureRow {
        let mut row = FeatureRow::empty(ElementKind::Table, 1);
        row.table_rows = 2;
        row.table_columns = 3;
        row
    }

    struct Fixed(Vec<Label>);

    impl Classifier for Fixed {
        fn predict(&self, _matrix: &FeatureMatrix) -> Result<Vec<Label>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_matrix_column_order() {
        let matrix = FeatureMatrix::from_rows(&[text_row(24.0, 2.0, true, 50.0)]);
        assert_eq!(
            matrix.rows()[0],
            [24.0, 2.0, 1.0, 0.0, 7.0, 50.0, 300.0, 0.0, 0.0, 0.0, 0.0]
        );
        assert_eq!(matrix.labels(), &[None::<Label>]);
    }

    #[test]
    fn test_non_finite_values_become_zero() {
        let mut row = text_row(12.0, 1.0, false, 10.0);
        row.image_aspect_ratio = f32::NAN;
        row.uppercase_ratio = f32::INFINITY;
        let matrix = FeatureMatrix::from_rows(&[row]);
        assert_eq!(matrix.column("image_aspect_ratio"), Some(vec![0.0]));
        assert_eq!(matrix.column("uppercase_ratio"), Some(vec![0.0]));
        assert!(matrix.column("content").is_none());
    }

    #[test]
    fn test_min_max_scaling() {
        let matrix = FeatureMatrix::from_rows(&[
            text_row(10.0, 1.0, false, 100.0),
            text_row(20.0, 2.0, true, 300.0),
            text_row(15.0, 1.5, false, 200.0),
        ]);
        let scaled = matrix.min_max_scaled();

        assert_eq!(scaled.column("font_size"), Some(vec![0.0, 1.0, 0.5]));
        assert_eq!(scaled.column("y_position"), Some(vec![0.0, 1.0, 0.5]));
        // Constant column
        assert_eq!(scaled.column("block_width"), Some(vec![0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_write_csv() {
        let mut row = text_row(12.0, 1.0, false, 10.0);
        row.label = Some(Label::Paragraph);
        let matrix = FeatureMatrix::from_rows(&[row]);

        let mut buf = Vec::new();
        matrix.write_csv_to(&mut buf).unwrap();
        let csv = String::from_utf8(buf).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next().unwrap(),
            "font_size,font_size_relative,is_bold,uppercase_ratio,text_length,y_position,\
             block_width,image_area,table_rows,table_columns,image_aspect_ratio,label"
        );
        assert_eq!(lines.next().unwrap(), "12,1,0,0,7,10,300,0,0,0,0,Paragraph");
    }

    #[test]
    fn test_apply_classifier() {
        let mut rows = vec![text_row(12.0, 1.0, false, 10.0), image_row()];
        apply_classifier(&Fixed(vec![Label::Footer, Label::Image]), &mut rows).unwrap();
        assert_eq!(rows[0].label, Some(Label::Footer));
        assert_eq!(rows[1].label, Some(Label::Image));
    }

    #[test]
    fn test_apply_classifier_length_mismatch() {
        let mut rows = vec![text_row(12.0, 1.0, false, 10.0), image_row()];
        let err = apply_classifier(&Fixed(vec![Label::Footer]), &mut rows).unwrap_err();
        assert!(matches!(err, Error::Classifier(_)));
        assert!(rows.iter().all(|r| r.label.is_none()));
    }

    #[test]
    fn test_rule_classifier_matches_rule_labeler() {
        let mut rows = vec![
            text_row(24.0, 2.0, true, 50.0),
            text_row(12.0, 1.0, false, 100.0),
            image_row(),
            table_row(),
        ];
        apply_classifier(&RuleClassifier::default(), &mut rows).unwrap();

        let labels: Vec<Option<Label>> = rows.iter().map(|r| r.label).collect();
        assert_eq!(
            labels,
            vec![
                Some(Label::Heading),
                Some(Label::Paragraph),
                Some(Label::Image),
                Some(Label::Table)
            ]
        );
    }

    #[test]
    fn test_rule_classifier_zero_area_image() {
        let mut image = FeatureRow::empty(ElementKind::Image, 1);
        image.y_position = 780.0;
        image.block_width = 200.0;
        let expected = RuleLabeler::new().label(&image);

        let mut rows = vec![image];
        apply_classifier(&RuleClassifier::default(), &mut rows).unwrap();
        assert_eq!(expected, Label::Image);
        assert_eq!(rows[0].label, Some(Label::Image));
    }
}
