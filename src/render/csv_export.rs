//! CSV export of feature tables.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::FeatureRow;

/// Write feature rows as CSV (header row first, empty label when unlabeled).
pub fn write_features_csv_to<W: Write>(writer: W, rows: &[FeatureRow]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Feature rows as a CSV string.
pub fn to_csv(rows: &[FeatureRow]) -> Result<String> {
    let mut buf = Vec::new();
    write_features_csv_to(&mut buf, rows)?;
    String::from_utf8(buf).map_err(|e| Error::Other(format!("CSV output is not UTF-8: {}", e)))
}

/// Write feature rows to a CSV file.
pub fn write_features_csv(path: &Path, rows: &[FeatureRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_features_csv_to(fs::File::create(path)?, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ElementKind, Label};

    #[test]
    fn test_to_csv_header_and_rows() {
        let mut text = FeatureRow::empty(ElementKind::Text, 1);
        text.content = "Hello, world".to_string();
        text.font_size = 12.0;
        text.label = Some(Label::Paragraph);
        let image = FeatureRow::empty(ElementKind::Image, 2);

        let csv = to_csv(&[text, image]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("type,page_number,content,font_size,font_size_relative,is_bold"));
        assert!(lines[0].ends_with("table_rows,table_columns,label"));
        assert!(lines[1].starts_with("Text,1,\"Hello, world\",12.0,"));
        assert!(lines[1].ends_with(",Paragraph"));
        assert!(lines[2].starts_with("Image,2,,"));
        assert!(lines[2].ends_with(','));
    }

    #[test]
    fn test_empty_table_writes_nothing() {
        assert_eq!(to_csv(&[]).unwrap(), "");
    }
}
