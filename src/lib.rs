//! # pdfstruct
//!
//! Layout feature extraction for PDF documents.
//!
//! This library turns a PDF into a flat, ordered table of layout elements
//! (text lines, images and tables) with one uniform feature row per element,
//! ready for rule-based labeling or for a trained structure classifier.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfstruct::extract_features;
//!
//! fn main() -> pdfstruct::Result<()> {
//!     // Writes images/, tables/ and features.json below "paper_output"
//!     let output = extract_features("paper.pdf", "paper_output")?;
//!
//!     for row in &output.features {
//!         println!("{:?} p{} {}", row.kind, row.page_number, row.content);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Three element streams**: text lines, placed images, detected tables
//! - **Reading order**: elements merged by page, then vertical position
//! - **Uniform features**: font size relative to the document average,
//!   boldness, casing, numbering, geometry
//! - **Labeling**: deterministic rules or any [`Classifier`]
//! - **Table detection**: stream (text alignment) and lattice (ruling lines)
//! - **Parallel processing**: optional Rayon page parallelism

pub mod classify;
pub mod collect;
pub mod detect;
pub mod error;
pub mod features;
pub mod label;
pub mod merge;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod policy;
pub mod render;

// Re-export commonly used types
pub use classify::{apply_classifier, Classifier, FeatureMatrix, RuleClassifier};
pub use detect::{detect_format_from_bytes, detect_format_from_path, validate_pdf_path, PdfFormat};
pub use error::{Error, Result};
pub use features::{derive_features, FeatureDeriver};
pub use label::{label_file, label_rows, RuleLabeler};
pub use merge::merge_elements;
pub use model::{
    BoundingBox, ElementKind, FeatureRow, ImageElement, Label, LayoutElement, Metadata,
    TableElement, TextElement,
};
pub use parser::{
    ContentModel, ErrorMode, ExtractOptions, LopdfBackend, LopdfTableProvider, PageSelection,
    TableFlavor, TableProvider,
};
pub use pipeline::{Pipeline, PipelineOutput};
pub use policy::LabelPolicy;
pub use render::JsonFormat;

use std::path::{Path, PathBuf};

/// Extract the feature table of a PDF file into `output_dir`.
///
/// Uses the default options: all pages, stream tables, strict errors,
/// no labels.
///
/// # Example
///
/// ```no_run
/// use pdfstruct::extract_features;
///
/// let output = extract_features("document.pdf", "document_output").unwrap();
/// println!("Rows: {}", output.features.len());
/// ```
pub fn extract_features<P: AsRef<Path>, O: Into<PathBuf>>(
    path: P,
    output_dir: O,
) -> Result<PipelineOutput> {
    Pipeline::new(output_dir).run(path)
}

/// Extract the feature table with custom options.
///
/// # Example
///
/// ```no_run
/// use pdfstruct::{extract_features_with_options, ExtractOptions, TableFlavor};
///
/// let options = ExtractOptions::new()
///     .lenient()
///     .with_table_flavor(TableFlavor::Lattice);
/// let output = extract_features_with_options("document.pdf", "out", options).unwrap();
/// ```
pub fn extract_features_with_options<P: AsRef<Path>, O: Into<PathBuf>>(
    path: P,
    output_dir: O,
    options: ExtractOptions,
) -> Result<PipelineOutput> {
    Pipeline::new(output_dir).with_options(options).run(path)
}

/// Extract and auto-label the feature table of a PDF file.
///
/// # Example
///
/// ```no_run
/// use pdfstruct::{extract_labeled, Label};
///
/// let output = extract_labeled("document.pdf", "out").unwrap();
/// let headings = output
///     .features
///     .iter()
///     .filter(|r| r.label == Some(Label::Heading))
///     .count();
/// println!("{} headings", headings);
/// ```
pub fn extract_labeled<P: AsRef<Path>, O: Into<PathBuf>>(
    path: P,
    output_dir: O,
) -> Result<PipelineOutput> {
    Pipeline::new(output_dir).with_labels(true).run(path)
}

/// Read the metadata of a PDF file without extracting anything.
pub fn read_metadata<P: AsRef<Path>>(path: P) -> Result<Metadata> {
    LopdfBackend::open(path)?.metadata()
}
