//! Tunable domain constants.
//!
//! Everything that decides what counts as bold, numbered, degenerate or a
//! heading lives here so it can be adjusted in one place.

/// Case-insensitive font-name keyword that marks a span as bold.
pub const BOLD_FONT_KEYWORD: &str = "bold";

/// Heading numbering prefix: `1.`, `1.2)`, `A.`, `IV)`.
pub const NUMBERING_PATTERN: &str = r"^(\d+(\.\d+)*|[A-Z]|[IVX]+)[.)]";

/// Relative font size above which a bold line is a heading.
pub const HEADING_MIN_RELATIVE_SIZE: f32 = 1.4;

/// Relative font size above which a bold line is a subheading.
pub const SUBHEADING_MIN_RELATIVE_SIZE: f32 = 1.1;

/// Lines shorter than this (in characters) may be footers.
pub const FOOTER_MAX_TEXT_LENGTH: usize = 40;

/// Lines starting below this y position (page units) may be footers.
pub const FOOTER_MIN_Y_POSITION: f32 = 750.0;

/// Tables with a smaller bounding-box area (page units squared) are discarded.
pub const MIN_TABLE_AREA: f32 = 1000.0;

/// Average font size used when a document has no text at all.
pub const DEFAULT_AVG_FONT_SIZE: f32 = 1.0;

/// Thresholds used by the rule labeler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelPolicy {
    /// Strict lower bound on `font_size_relative` for [`Label::Heading`](crate::Label::Heading)
    pub heading_min_relative_size: f32,
    /// Strict lower bound on `font_size_relative` for [`Label::Subheading`](crate::Label::Subheading)
    pub subheading_min_relative_size: f32,
    /// Strict upper bound on `text_length` for footers
    pub footer_max_text_length: usize,
    /// Strict lower bound on `y_position` for footers
    pub footer_min_y_position: f32,
}

impl LabelPolicy {
    /// Create a policy with the default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the heading threshold.
    pub fn with_heading_threshold(mut self, ratio: f32) -> Self {
        self.heading_min_relative_size = ratio;
        self
    }

    /// Set the subheading threshold.
    pub fn with_subheading_threshold(mut self, ratio: f32) -> Self {
        self.subheading_min_relative_size = ratio;
        self
    }

    /// Set the footer zone (max text length, min y position).
    pub fn with_footer_zone(mut self, max_text_length: usize, min_y_position: f32) -> Self {
        self.footer_max_text_length = max_text_length;
        self.footer_min_y_position = min_y_position;
        self
    }
}

impl Default for LabelPolicy {
    fn default() -> Self {
        Self {
            heading_min_relative_size: HEADING_MIN_RELATIVE_SIZE,
            subheading_min_relative_size: SUBHEADING_MIN_RELATIVE_SIZE,
            footer_max_text_length: FOOTER_MAX_TEXT_LENGTH,
            footer_min_y_position: FOOTER_MIN_Y_POSITION,
        }
    }
}
