//! Text line collection.

use rayon::prelude::*;
use unicode_normalization::UnicodeNormalization;

use crate::error::Result;
use crate::features::is_bold_font;
use crate::model::{BoundingBox, TextElement};
use crate::parser::{ContentModel, ExtractOptions, PageText, Span, TextLine};

use super::handle_failure;

/// Emits one [`TextElement`] per non-empty line of the selected pages.
pub struct TextLineCollector<'a> {
    options: &'a ExtractOptions,
}

impl<'a> TextLineCollector<'a> {
    /// Create a collector.
    pub fn new(options: &'a ExtractOptions) -> Self {
        Self { options }
    }

    /// Collect text lines in page order.
    pub fn collect(&self, model: &dyn ContentModel) -> Result<Vec<TextElement>> {
        let pages = self.options.pages.page_numbers(model.page_count());

        let per_page: Vec<Result<Vec<TextElement>>> = if self.options.parallel {
            pages
                .par_iter()
                .map(|&page| self.collect_page(model, page))
                .collect()
        } else {
            pages
                .iter()
                .map(|&page| self.collect_page(model, page))
                .collect()
        };

        let mut elements = Vec::new();
        for page in per_page {
            elements.extend(page?);
        }
        log::debug!("Collected {} text lines", elements.len());
        Ok(elements)
    }

    /// Lines of one page (1-based page number).
    fn collect_page(&self, model: &dyn ContentModel, page_number: u32) -> Result<Vec<TextElement>> {
        let page = handle_failure(
            self.options.error_mode,
            &format!("text of page {}", page_number),
            model.page_text(page_number - 1),
        )?;

        Ok(page.map(|p| lines_from_page(&p)).unwrap_or_default())
    }
}

/// Convert one page's blocks into text elements.
///
/// Pages without spans yield nothing. Blank spans are ignored; lines left
/// empty are dropped.
pub fn lines_from_page(page: &PageText) -> Vec<TextElement> {
    if page.is_empty() {
        return Vec::new();
    }

    let page_number = page.page_index + 1;
    page.blocks
        .iter()
        .flat_map(|block| {
            let block_width = block.bbox.normalized().width();
            block
                .lines
                .iter()
                .filter_map(move |line| line_element(page_number, line, block_width))
        })
        .collect()
}

fn line_element(page_number: u32, line: &TextLine, block_width: f32) -> Option<TextElement> {
    let spans: Vec<&Span> = line
        .spans
        .iter()
        .filter(|s| !s.text.trim().is_empty())
        .collect();
    let first = spans.first()?;

    let content = spans
        .iter()
        .map(|s| s.text.trim())
        .collect::<Vec<_>>()
        .join(" ");
    let content: String = content.nfc().collect();

    let font_size = spans.iter().map(|s| s.size).fold(0.0, f32::max);
    let is_bold = spans.iter().any(|s| is_bold_font(&s.font));
    let bbox = spans
        .iter()
        .map(|s| s.bbox.normalized())
        .reduce(|acc, b| acc.union(&b))
        .unwrap_or_default();

    Some(TextElement::new(
        page_number,
        bbox,
        first.bbox.normalized().y0,
        content,
        font_size,
        is_bold,
        block_width,
    ))
}
