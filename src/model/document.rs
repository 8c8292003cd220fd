//! Document-level metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Info dictionary entries and page count of the source document.
///
/// Returned by [`crate::read_metadata`] and carried in
/// [`crate::PipelineOutput`]; encrypted documents never get this far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Header version, e.g. "1.7"
    pub pdf_version: String,
    pub page_count: u32,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    /// Authoring application
    pub creator: Option<String>,
    /// Application that wrote the PDF
    pub producer: Option<String>,
    /// `CreationDate`, when it parses
    pub created: Option<DateTime<Utc>>,
}

impl Metadata {
    /// Metadata with only the version and page count filled in.
    pub fn new(pdf_version: impl Into<String>, page_count: u32) -> Self {
        Self {
            pdf_version: pdf_version.into(),
            page_count,
            ..Default::default()
        }
    }

    /// Title, falling back to `fallback` (usually the file stem).
    pub fn title_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(fallback)
    }
}
