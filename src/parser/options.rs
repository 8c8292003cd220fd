//! Extraction options and configuration.

use std::ops::RangeInclusive;

use crate::error::{Error, Result};

/// Options for extracting layout elements from a document.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Page selection (which pages to extract)
    pub pages: PageSelection,

    /// Table detection flavor
    pub table_flavor: TableFlavor,

    /// Whether to extract images
    pub extract_images: bool,

    /// Whether to detect tables
    pub extract_tables: bool,

    /// Whether to collect text pages in parallel
    pub parallel: bool,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (skip elements that fail to extract).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Set the table detection flavor.
    pub fn with_table_flavor(mut self, flavor: TableFlavor) -> Self {
        self.table_flavor = flavor;
        self
    }

    /// Enable or disable image extraction.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.extract_images = extract;
        self
    }

    /// Enable or disable table detection.
    pub fn with_tables(mut self, extract: bool) -> Self {
        self.extract_tables = extract;
        self
    }

    /// Enable or disable parallel text collection.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Text only: no images, no tables.
    pub fn text_only(mut self) -> Self {
        self.extract_images = false;
        self.extract_tables = false;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            pages: PageSelection::All,
            table_flavor: TableFlavor::Stream,
            extract_images: true,
            extract_tables: true,
            parallel: false,
        }
    }
}

/// Error handling mode during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any error
    #[default]
    Strict,
    /// Skip the failing page or element, log it, and continue
    Lenient,
}

/// Table detection flavor, chosen by the caller from the document style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableFlavor {
    /// Tables drawn with ruling lines
    Lattice,
    /// Borderless tables recognized from text alignment
    #[default]
    Stream,
}

impl TableFlavor {
    /// Flavor name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableFlavor::Lattice => "lattice",
            TableFlavor::Stream => "stream",
        }
    }
}

impl std::str::FromStr for TableFlavor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lattice" => Ok(TableFlavor::Lattice),
            "stream" => Ok(TableFlavor::Stream),
            other => Err(Error::Other(format!("Unknown table flavor: {}", other))),
        }
    }
}

/// Page selection (1-indexed page numbers).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// All pages
    #[default]
    All,
    /// A range of pages (inclusive)
    Range(RangeInclusive<u32>),
    /// Specific pages
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Selected page numbers of a document with `page_count` pages.
    pub fn page_numbers(&self, page_count: u32) -> Vec<u32> {
        (1..=page_count).filter(|p| self.includes(*p)).collect()
    }

    /// Parse a page selection string (e.g., "all", "1-10", "1,3,5-7").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        let invalid = || Error::InvalidPageRange(s.to_string());

        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                let start: u32 = start.trim().parse().map_err(|_| invalid())?;
                let end: u32 = end.trim().parse().map_err(|_| invalid())?;
                if start == 0 || start > end {
                    return Err(invalid());
                }
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if let Some((start, end)) = part.split_once('-') {
                let start: u32 = start.trim().parse().map_err(|_| invalid())?;
                let end: u32 = end.trim().parse().map_err(|_| invalid())?;
                pages.extend(start..=end);
            } else {
                pages.push(part.parse().map_err(|_| invalid())?);
            }
        }

        if pages.contains(&0) {
            return Err(invalid());
        }
        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_options_builder() {
        let options = ExtractOptions::new()
            .lenient()
            .with_table_flavor(TableFlavor::Lattice)
            .with_parallel(true)
            .text_only();

        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert_eq!(options.table_flavor, TableFlavor::Lattice);
        assert!(options.parallel);
        assert!(!options.extract_images);
        assert!(!options.extract_tables);
    }

    #[test]
    fn test_default_options() {
        let options = ExtractOptions::default();
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert_eq!(options.table_flavor, TableFlavor::Stream);
        assert!(!options.parallel);
        assert!(options.extract_images);
    }

    #[test]
    fn test_page_selection_includes() {
        assert!(PageSelection::All.includes(100));

        let range = PageSelection::Range(5..=10);
        assert!(!range.includes(4));
        assert!(range.includes(10));

        let pages = PageSelection::Pages(vec![1, 3]);
        assert!(pages.includes(3));
        assert!(!pages.includes(2));
    }

    #[test]
    fn test_page_selection_parse() {
        assert_eq!(PageSelection::parse("all").unwrap(), PageSelection::All);
        assert_eq!(
            PageSelection::parse("2-4").unwrap(),
            PageSelection::Range(2..=4)
        );
        assert_eq!(
            PageSelection::parse("1,3,5-7,3").unwrap(),
            PageSelection::Pages(vec![1, 3, 5, 6, 7])
        );
        assert!(PageSelection::parse("0").is_err());
        assert!(PageSelection::parse("x-2").is_err());
    }

    #[test]
    fn test_page_numbers() {
        let pages = PageSelection::Range(2..=9).page_numbers(4);
        assert_eq!(pages, vec![2, 3, 4]);
    }

    #[test]
    fn test_flavor_parse() {
        assert_eq!("Lattice".parse::<TableFlavor>().unwrap(), TableFlavor::Lattice);
        assert_eq!("stream".parse::<TableFlavor>().unwrap(), TableFlavor::Stream);
        assert!("grid".parse::<TableFlavor>().is_err());
    }
}
