//! PDF parsing module.
//!
//! The content model ([`ContentModel`]) is the only view of a PDF the
//! collectors depend on; [`LopdfBackend`] provides it with lopdf. Table
//! detection sits behind [`TableProvider`].

mod backend;
mod content;
mod grouping;
mod lopdf_backend;
mod options;
mod table_detector;

pub use backend::{
    decode_text_simple, ContentModel, ImageData, ImageRef, ObjectRef, PageText, Span, TextBlock,
    TextLine,
};
pub use content::{Orientation, Ruling};
pub use grouping::{group_lines_into_blocks, group_spans_into_lines};
pub use lopdf_backend::{LopdfBackend, PageLayout};
pub use options::{ErrorMode, ExtractOptions, PageSelection, TableFlavor};
pub use table_detector::{
    DetectedTable, LatticeDetector, LatticeDetectorConfig, LopdfTableProvider, StreamDetector,
    StreamDetectorConfig, TableProvider,
};
