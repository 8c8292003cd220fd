//! End-to-end tests of the extraction pipeline over mock backends.

use std::fs;
use std::path::Path;

use pdfstruct::error::Result;
use pdfstruct::parser::{DetectedTable, ImageData, ImageRef, PageText, Span, TextBlock, TextLine};
use pdfstruct::render::read_features_json;
use pdfstruct::{
    BoundingBox, ContentModel, ElementKind, Error, ExtractOptions, FeatureRow, JsonFormat,
    Label, LayoutElement, Metadata, PageSelection, Pipeline, TableFlavor, TableProvider,
};

/// Two pages: a title, a paragraph, an image and a footer on page 1, one
/// paragraph on page 2. Page 2 text fails when `broken` is set.
struct MockDocument {
    broken: bool,
}

fn line(text: &str, font: &str, size: f32, x0: f32, y0: f32) -> TextLine {
    let width = text.chars().count() as f32 * size * 0.5;
    TextLine::new(vec![Span::new(
        text,
        font,
        size,
        BoundingBox::new(x0, y0, x0 + width, y0 + size),
    )])
}

impl ContentModel for MockDocument {
    fn page_count(&self) -> u32 {
        2
    }

    fn metadata(&self) -> Result<Metadata> {
        let mut metadata = Metadata::new("1.7", 2);
        metadata.title = Some("Mock".to_string());
        Ok(metadata)
    }

    fn page_text(&self, page_index: u32) -> Result<PageText> {
        let blocks = match page_index {
            0 => vec![
                TextBlock::from_lines(vec![line("TITLE", "Helvetica-Bold", 24.0, 72.0, 50.0)]),
                TextBlock::from_lines(vec![line(
                    "The quick brown fox jumps over the lazy dog again.",
                    "Helvetica",
                    12.0,
                    72.0,
                    100.0,
                )]),
                TextBlock::from_lines(vec![line("Page 1", "Helvetica", 10.0, 290.0, 770.0)]),
            ],
            1 if self.broken => return Err(Error::TextExtract("bad font".to_string())),
            1 => vec![TextBlock::from_lines(vec![line(
                "Second page body text that is long enough to be a paragraph.",
                "Times-Roman",
                12.0,
                72.0,
                80.0,
            )])],
            _ => return Err(Error::PageOutOfRange(page_index + 1, 2)),
        };
        Ok(PageText { page_index, blocks })
    }

    fn page_images(&self, page_index: u32) -> Result<Vec<ImageRef>> {
        if page_index != 0 {
            return Ok(Vec::new());
        }
        Ok(vec![ImageRef {
            page_index,
            name: "Im1".to_string(),
            object: (10, 0),
            bbox: BoundingBox::new(72.0, 200.0, 272.0, 300.0),
        }])
    }

    fn image_data(&self, image: &ImageRef) -> Result<ImageData> {
        if self.broken {
            return Err(Error::ImageExtract(format!("{}: bad stream", image.name)));
        }
        Ok(ImageData {
            bytes: b"\xFF\xD8\xFF\xE0jpeg".to_vec(),
            extension: "jpg".to_string(),
        })
    }
}

/// Detections: a blank table, a 2x3 table of area 5000 on page 1, and a tiny
/// table on page 2.
struct MockTables;

impl TableProvider for MockTables {
    fn detect(
        &self,
        _path: &Path,
        pages: &PageSelection,
        _flavor: TableFlavor,
    ) -> Result<Vec<DetectedTable>> {
        let tables = vec![
            DetectedTable::new(
                1,
                BoundingBox::new(0.0, 0.0, 200.0, 200.0),
                vec![vec![String::new(); 2]; 2],
            ),
            DetectedTable::new(
                1,
                BoundingBox::new(72.0, 400.0, 172.0, 450.0),
                vec![
                    vec!["Name".into(), "Qty".into(), "Price".into()],
                    vec!["Widget, large".into(), "2".into(), "9.50".into()],
                ],
            ),
            DetectedTable::new(
                2,
                BoundingBox::new(0.0, 0.0, 10.0, 10.0),
                vec![vec!["a".into(), "b".into()]],
            ),
        ];
        Ok(tables
            .into_iter()
            .filter(|t| pages.includes(t.page_number))
            .collect())
    }
}

fn pipeline(dir: &Path) -> Pipeline {
    Pipeline::new(dir).with_table_provider(Box::new(MockTables))
}

#[test]
fn test_end_to_end_labels_in_reading_order() {
    let dir = tempfile::tempdir().unwrap();
    let output = pipeline(dir.path())
        .with_labels(true)
        .run_with_model(&MockDocument { broken: false }, Path::new("mock.pdf"))
        .unwrap();

    let labels: Vec<Option<Label>> = output.features.iter().map(|r| r.label).collect();
    assert_eq!(
        labels,
        vec![
            Some(Label::Heading),
            Some(Label::Paragraph),
            Some(Label::Image),
            Some(Label::Table),
            Some(Label::Footer),
            Some(Label::Paragraph),
        ]
    );

    let pages: Vec<u32> = output.features.iter().map(|r| r.page_number).collect();
    assert_eq!(pages, vec![1, 1, 1, 1, 1, 2]);
    assert_eq!(output.metadata.title.as_deref(), Some("Mock"));
}

#[test]
fn test_feature_values() {
    let dir = tempfile::tempdir().unwrap();
    let output = pipeline(dir.path())
        .run_with_model(&MockDocument { broken: false }, Path::new("mock.pdf"))
        .unwrap();

    // Average over the four text lines: (24 + 12 + 10 + 12) / 4
    let title = &output.features[0];
    assert_eq!(title.kind, ElementKind::Text);
    assert_eq!(title.content, "TITLE");
    assert!((title.font_size_relative - 24.0 / 14.5).abs() < 1e-5);
    assert_eq!(title.is_bold, 1);
    assert_eq!(title.uppercase_ratio, 1.0);

    let image = &output.features[2];
    assert_eq!(image.image_area, 20000.0);
    assert_eq!(image.image_aspect_ratio, 2.0);
    assert_eq!(image.block_width, 200.0);
    assert_eq!(image.font_size, 0.0);

    let table = &output.features[3];
    assert_eq!((table.table_rows, table.table_columns), (2, 3));
    assert_eq!(table.y_position, 400.0);
    assert!(table.label.is_none());
}

#[test]
fn test_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let output = pipeline(dir.path())
        .with_csv(true)
        .run_with_model(&MockDocument { broken: false }, Path::new("mock.pdf"))
        .unwrap();

    let image_path = dir.path().join("images").join("page1_img1.jpg");
    assert_eq!(fs::read(&image_path).unwrap(), b"\xFF\xD8\xFF\xE0jpeg");

    // The blank detection keeps its index, so the kept table is the second
    let tables_dir = dir.path().join("tables");
    assert!(!tables_dir.join("table_1.csv").exists());
    assert!(!tables_dir.join("table_3.csv").exists());
    let csv = fs::read_to_string(tables_dir.join("table_2.csv")).unwrap();
    assert_eq!(csv, "Name,Qty,Price\n\"Widget, large\",2,9.50\n");

    let table = output
        .elements
        .iter()
        .find_map(|e| match e {
            LayoutElement::Table(t) => Some(t),
            _ => None,
        })
        .unwrap();
    assert_eq!(table.table_path, tables_dir.join("table_2.csv"));
    assert_eq!(table.area, 5000.0);

    let rows = read_features_json(&output.features_path).unwrap();
    assert_eq!(rows.len(), output.features.len());
    assert_eq!(rows[0].content, "TITLE");
    assert_eq!(rows[3].kind, ElementKind::Table);
    assert!(output.csv_path.unwrap().exists());
}

#[test]
fn test_page_selection() {
    let dir = tempfile::tempdir().unwrap();
    let output = pipeline(dir.path())
        .with_options(ExtractOptions::new().with_pages(PageSelection::Pages(vec![2])))
        .run_with_model(&MockDocument { broken: false }, Path::new("mock.pdf"))
        .unwrap();

    assert_eq!(output.elements.len(), 1);
    assert_eq!(output.elements[0].page_number(), 2);
    assert!(!dir.path().join("images").exists());
}

#[test]
fn test_text_only() {
    let dir = tempfile::tempdir().unwrap();
    let output = pipeline(dir.path())
        .with_options(ExtractOptions::new().text_only())
        .run_with_model(&MockDocument { broken: false }, Path::new("mock.pdf"))
        .unwrap();

    assert_eq!(output.count(ElementKind::Text), 4);
    assert_eq!(output.count(ElementKind::Image), 0);
    assert_eq!(output.count(ElementKind::Table), 0);
}

#[test]
fn test_strict_mode_propagates_failures() {
    let dir = tempfile::tempdir().unwrap();
    let result = pipeline(dir.path())
        .run_with_model(&MockDocument { broken: true }, Path::new("mock.pdf"));
    assert!(matches!(result, Err(Error::TextExtract(_))));
}

#[test]
fn test_lenient_mode_skips_failures() {
    let dir = tempfile::tempdir().unwrap();
    let output = pipeline(dir.path())
        .with_options(ExtractOptions::new().lenient())
        .with_labels(true)
        .run_with_model(&MockDocument { broken: true }, Path::new("mock.pdf"))
        .unwrap();

    // Page 2 text and the undecodable image are skipped
    assert_eq!(output.count(ElementKind::Text), 3);
    assert_eq!(output.count(ElementKind::Image), 0);
    assert_eq!(output.count(ElementKind::Table), 1);
}

#[test]
fn test_parallel_matches_sequential() {
    let dir = tempfile::tempdir().unwrap();
    let sequential = pipeline(&dir.path().join("seq"))
        .run_with_model(&MockDocument { broken: false }, Path::new("mock.pdf"))
        .unwrap();
    let parallel = pipeline(&dir.path().join("par"))
        .with_options(ExtractOptions::new().with_parallel(true))
        .run_with_model(&MockDocument { broken: false }, Path::new("mock.pdf"))
        .unwrap();

    let text = |rows: &[FeatureRow]| -> Vec<(u32, String)> {
        rows.iter()
            .filter(|r| r.kind == ElementKind::Text)
            .map(|r| (r.page_number, r.content.clone()))
            .collect()
    };
    assert_eq!(text(&sequential.features), text(&parallel.features));
    assert_eq!(sequential.features.len(), parallel.features.len());
}

#[test]
fn test_compact_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = pipeline(dir.path())
        .with_json_format(JsonFormat::Compact)
        .run_with_model(&MockDocument { broken: false }, Path::new("mock.pdf"))
        .unwrap();

    let json = fs::read_to_string(output.features_path).unwrap();
    assert!(!json.contains('\n'));
    assert!(json.starts_with("[{\"type\":\"Text\""));
}
