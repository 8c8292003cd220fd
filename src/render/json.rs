//! JSON rendering and loading of feature tables.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::model::FeatureRow;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert feature rows to a JSON array.
pub fn to_json(rows: &[FeatureRow], format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(rows)?,
        JsonFormat::Compact => serde_json::to_string(rows)?,
    };
    Ok(json)
}

/// Parse feature rows from a JSON array.
///
/// Missing numeric fields default to 0 and a missing label to none.
pub fn from_json(json: &str) -> Result<Vec<FeatureRow>> {
    Ok(serde_json::from_str(json)?)
}

/// Write feature rows to a JSON file.
pub fn write_features_json(path: &Path, rows: &[FeatureRow], format: JsonFormat) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, to_json(rows, format)?)?;
    Ok(())
}

/// Read feature rows from a JSON file.
pub fn read_features_json(path: &Path) -> Result<Vec<FeatureRow>> {
    let json = fs::read_to_string(path)?;
    from_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ElementKind, Label};

    fn sample() -> Vec<FeatureRow> {
        let mut text = FeatureRow::empty(ElementKind::Text, 1);
        text.content = "Introduction".to_string();
        text.font_size = 18.0;
        let mut image = FeatureRow::empty(ElementKind::Image, 1);
        image.label = Some(Label::Image);
        vec![text, image]
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&sample(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"type\": \"Text\""));
        assert!(json.contains("\"label\": null"));
        assert!(json.contains("\"label\": \"Image\""));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&sample(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let rows = from_json(r#"[{"type": "Text", "content": "Hi", "font_size": 12}]"#).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].content, "Hi");
        assert_eq!(rows[0].font_size, 12.0);
        assert_eq!(rows[0].page_number, 0);
        assert_eq!(rows[0].y_position, 0.0);
        assert!(rows[0].label.is_none());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("features.json");
        write_features_json(&path, &sample(), JsonFormat::Pretty).unwrap();

        let rows = read_features_json(&path).unwrap();
        assert_eq!(rows, sample());
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_features_json(&dir.path().join("nope.json")).is_err());
    }
}
