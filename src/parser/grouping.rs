//! Grouping of positioned spans into lines and blocks.

use std::cmp::Ordering;

use super::backend::{Span, TextBlock, TextLine};

/// Baseline variance allowed within one line, as a fraction of the font size.
const LINE_TOLERANCE_FACTOR: f32 = 0.3;
/// Line spacing used when a page has fewer than two lines.
const DEFAULT_LINE_SPACING: f32 = 12.0;
/// A gap this many times the average spacing starts a new block.
const BLOCK_SPACING_FACTOR: f32 = 1.5;
/// Font size change that starts a new block.
const BLOCK_FONT_SIZE_DELTA: f32 = 1.0;
/// Left margin change that starts a new block.
const BLOCK_INDENT_DELTA: f32 = 20.0;

/// Group spans into lines, top to bottom, each line left to right.
pub fn group_spans_into_lines(mut spans: Vec<Span>) -> Vec<TextLine> {
    if spans.is_empty() {
        return vec![];
    }

    // Bottom edge tracks the baseline in top-left coordinates.
    spans.sort_by(|a, b| {
        let y_cmp = a.bbox.y1.total_cmp(&b.bbox.y1);
        if y_cmp == Ordering::Equal {
            a.bbox.x0.total_cmp(&b.bbox.x0)
        } else {
            y_cmp
        }
    });

    let mut lines: Vec<TextLine> = Vec::new();
    let mut current_line_spans: Vec<Span> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in spans {
        let y_tolerance = span.size * LINE_TOLERANCE_FACTOR;

        match current_y {
            Some(y) if (span.bbox.y1 - y).abs() <= y_tolerance => {
                current_line_spans.push(span);
            }
            _ => {
                if !current_line_spans.is_empty() {
                    lines.push(finish_line(std::mem::take(&mut current_line_spans)));
                }
                current_y = Some(span.bbox.y1);
                current_line_spans.push(span);
            }
        }
    }

    if !current_line_spans.is_empty() {
        lines.push(finish_line(current_line_spans));
    }

    lines
}

fn finish_line(mut spans: Vec<Span>) -> TextLine {
    spans.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
    TextLine::new(spans)
}

/// Group lines (already top to bottom) into blocks.
pub fn group_lines_into_blocks(lines: Vec<TextLine>) -> Vec<TextBlock> {
    if lines.is_empty() {
        return vec![];
    }

    let avg_spacing = average_line_spacing(&lines);
    let mut blocks: Vec<TextBlock> = Vec::new();
    let mut current_block_lines: Vec<TextLine> = Vec::new();

    for line in lines {
        let should_break = current_block_lines
            .last()
            .is_some_and(|prev| should_break_block(prev, &line, avg_spacing));

        if should_break {
            blocks.push(TextBlock::from_lines(std::mem::take(
                &mut current_block_lines,
            )));
        }
        current_block_lines.push(line);
    }

    if !current_block_lines.is_empty() {
        blocks.push(TextBlock::from_lines(current_block_lines));
    }

    blocks
}

/// Baseline, largest size and left margin of a line.
fn line_metrics(line: &TextLine) -> (f32, f32, f32) {
    let baseline = line.spans.first().map(|s| s.bbox.y1).unwrap_or(0.0);
    let size = line.spans.iter().map(|s| s.size).fold(0.0, f32::max);
    let left = line
        .spans
        .iter()
        .map(|s| s.bbox.x0)
        .fold(f32::INFINITY, f32::min);
    (baseline, size, if left.is_finite() { left } else { 0.0 })
}

fn average_line_spacing(lines: &[TextLine]) -> f32 {
    if lines.len() < 2 {
        return DEFAULT_LINE_SPACING;
    }

    let spacings: Vec<f32> = lines
        .windows(2)
        .map(|w| (line_metrics(&w[1]).0 - line_metrics(&w[0]).0).abs())
        .filter(|s| *s > 0.1)
        .collect();

    if spacings.is_empty() {
        return DEFAULT_LINE_SPACING;
    }

    spacings.iter().sum::<f32>() / spacings.len() as f32
}

fn should_break_block(prev: &TextLine, curr: &TextLine, avg_spacing: f32) -> bool {
    let (prev_y, prev_size, prev_x) = line_metrics(prev);
    let (curr_y, curr_size, curr_x) = line_metrics(curr);

    (curr_y - prev_y).abs() > avg_spacing * BLOCK_SPACING_FACTOR
        || (prev_size - curr_size).abs() > BLOCK_FONT_SIZE_DELTA
        || (prev_x - curr_x).abs() > BLOCK_INDENT_DELTA
}
