//! Table detection.
//!
//! Two flavors, chosen by the caller:
//!
//! - **Stream**: borderless tables recognized from text alignment, after
//!   Camelot's Stream mode. Rows come from baselines, columns from left edges
//!   that line up across rows.
//! - **Lattice**: tables drawn with ruling lines. Horizontal and vertical
//!   rulings are intersected, cells are built from complete corner sets, and
//!   cells sharing an edge are grouped into tables.
//!
//! Both work on the top-left coordinate system of [`PageLayout`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use crate::error::Result;
use crate::model::BoundingBox;

use super::backend::{ContentModel, Span};
use super::content::{Orientation, Ruling};
use super::lopdf_backend::{LopdfBackend, PageLayout};
use super::options::{PageSelection, TableFlavor};

/// A table found on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedTable {
    /// Page number (1-based)
    pub page_number: u32,
    /// Region covered by the table
    pub bbox: BoundingBox,
    /// Cell text, row by row
    pub cells: Vec<Vec<String>>,
}

impl DetectedTable {
    /// Create a detected table.
    pub fn new(page_number: u32, bbox: BoundingBox, cells: Vec<Vec<String>>) -> Self {
        Self {
            page_number,
            bbox,
            cells,
        }
    }

    /// (rows, columns); the column count is the widest row.
    pub fn shape(&self) -> (usize, usize) {
        let columns = self.cells.iter().map(Vec::len).max().unwrap_or(0);
        (self.cells.len(), columns)
    }

    /// Whether every cell is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.cells
            .iter()
            .flat_map(|row| row.iter())
            .all(|cell| cell.trim().is_empty())
    }
}

/// Source of detected tables for a document.
///
/// Tables are returned in detection order: page by page, top to bottom.
pub trait TableProvider: Sync {
    /// Detect tables on the selected pages of a document.
    fn detect(
        &self,
        path: &Path,
        pages: &PageSelection,
        flavor: TableFlavor,
    ) -> Result<Vec<DetectedTable>>;
}

/// Built-in provider running the stream and lattice detectors over lopdf
/// page layouts.
#[derive(Debug, Clone, Default)]
pub struct LopdfTableProvider {
    stream: StreamDetectorConfig,
    lattice: LatticeDetectorConfig,
}

impl LopdfTableProvider {
    /// Create a provider with default detector settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the stream detector settings.
    pub fn with_stream_config(mut self, config: StreamDetectorConfig) -> Self {
        self.stream = config;
        self
    }

    /// Override the lattice detector settings.
    pub fn with_lattice_config(mut self, config: LatticeDetectorConfig) -> Self {
        self.lattice = config;
        self
    }

    /// Detect tables on already extracted page layouts.
    pub fn detect_layouts(&self, layouts: &[PageLayout], flavor: TableFlavor) -> Vec<DetectedTable> {
        layouts
            .iter()
            .flat_map(|layout| match flavor {
                TableFlavor::Stream => StreamDetector::with_config(self.stream.clone())
                    .detect(layout.page_number, &layout.spans),
                TableFlavor::Lattice => LatticeDetector::with_config(self.lattice.clone())
                    .detect(layout.page_number, &layout.rulings, &layout.spans),
            })
            .collect()
    }
}

impl TableProvider for LopdfTableProvider {
    fn detect(
        &self,
        path: &Path,
        pages: &PageSelection,
        flavor: TableFlavor,
    ) -> Result<Vec<DetectedTable>> {
        let backend = LopdfBackend::open(path)?;
        let layouts = pages
            .page_numbers(backend.page_count())
            .into_iter()
            .map(|page| backend.page_layout(page - 1))
            .collect::<Result<Vec<_>>>()?;

        let tables = self.detect_layouts(&layouts, flavor);
        log::debug!(
            "{} flavor found {} tables in {}",
            flavor.as_str(),
            tables.len(),
            path.display()
        );
        Ok(tables)
    }
}

// ---------------------------------------------------------------------------
// Stream flavor
// ---------------------------------------------------------------------------

/// Stream detector configuration.
#[derive(Debug, Clone)]
pub struct StreamDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Maximum number of columns (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Y tolerance for grouping spans into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// Minimum column alignment ratio (0.0-1.0)
    pub min_alignment_ratio: f32,
    /// Minimum gap between columns (points)
    pub min_column_gap: f32,
}

impl Default for StreamDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 6,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
        }
    }
}

/// Spans sharing a baseline.
#[derive(Debug, Clone)]
struct RowData<'a> {
    spans: Vec<&'a Span>,
}

/// Width of the buckets used to count aligned left edges.
const EDGE_BUCKET: f32 = 5.0;
/// Distance from a column edge still counted as aligned.
const ALIGNMENT_TOLERANCE: f32 = 5.0;

/// Detects borderless tables from text alignment.
#[derive(Debug, Clone, Default)]
pub struct StreamDetector {
    config: StreamDetectorConfig,
}

impl StreamDetector {
    /// Create a detector with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector with custom configuration.
    pub fn with_config(config: StreamDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect tables among the spans of one page.
    pub fn detect(&self, page_number: u32, spans: &[Span]) -> Vec<DetectedTable> {
        if spans.len() < self.config.min_rows * self.config.min_columns {
            return vec![];
        }

        let rows = self.group_into_rows(spans);
        if rows.len() < self.config.min_rows {
            return vec![];
        }

        let columns = self.detect_columns(&rows);
        log::debug!(
            "StreamDetector: page {}: {} rows, columns at {:?}",
            page_number,
            rows.len(),
            columns
        );
        if columns.len() < self.config.min_columns {
            return vec![];
        }

        let mut tables = Vec::new();
        for (start_row, end_row) in self.find_table_regions(&rows, &columns) {
            let table_rows = &rows[start_row..=end_row];

            // Re-detect columns for this specific region
            let table_columns = self.detect_columns(table_rows);
            if table_columns.len() < self.config.min_columns {
                continue;
            }
            if table_columns.len() > self.config.max_columns {
                log::debug!(
                    "StreamDetector: skipping region with {} columns",
                    table_columns.len()
                );
                continue;
            }
            if self.is_list_pattern(table_rows, &table_columns) {
                log::debug!("StreamDetector: skipping list-like region");
                continue;
            }

            let bbox = table_rows
                .iter()
                .flat_map(|r| r.spans.iter())
                .map(|s| s.bbox)
                .reduce(|acc, b| acc.union(&b))
                .unwrap_or_default();

            let cells = self.fill_cells(table_rows, &table_columns, bbox.x1);
            tables.push(DetectedTable::new(page_number, bbox, cells));
        }

        tables
    }

    /// Group spans into rows by baseline, top to bottom.
    fn group_into_rows<'a>(&self, spans: &'a [Span]) -> Vec<RowData<'a>> {
        let mut sorted: Vec<&Span> = spans.iter().collect();
        sorted.sort_by(|a, b| {
            a.bbox
                .y1
                .total_cmp(&b.bbox.y1)
                .then_with(|| a.bbox.x0.total_cmp(&b.bbox.x0))
        });

        let mut rows: Vec<RowData> = Vec::new();
        let mut current: Vec<&Span> = Vec::new();
        let mut current_y: Option<f32> = None;

        for span in sorted {
            let y_tolerance = span.size * self.config.y_tolerance_factor;
            match current_y {
                Some(y) if (span.bbox.y1 - y).abs() <= y_tolerance => current.push(span),
                _ => {
                    if !current.is_empty() {
                        rows.push(make_row(std::mem::take(&mut current)));
                    }
                    current_y = Some(span.bbox.y1);
                    current.push(span);
                }
            }
        }

        if !current.is_empty() {
            rows.push(make_row(current));
        }

        rows
    }

    /// Left edges that line up across rows.
    ///
    /// Rows holding two or more spans are the evidence; when too few rows
    /// have several spans, every row counts.
    fn detect_columns(&self, rows: &[RowData]) -> Vec<f32> {
        if rows.is_empty() {
            return vec![];
        }

        let multi_span_rows: Vec<&RowData> = rows.iter().filter(|r| r.spans.len() >= 2).collect();
        let evidence: Vec<&RowData> = if multi_span_rows.len() >= self.config.min_rows {
            multi_span_rows
        } else {
            rows.iter().collect()
        };

        let mut edge_counts: HashMap<i32, usize> = HashMap::new();
        for row in &evidence {
            // Each bucket counts once per row
            let buckets: HashSet<i32> = row
                .spans
                .iter()
                .map(|s| (s.bbox.x0 / EDGE_BUCKET).round() as i32)
                .collect();
            for bucket in buckets {
                *edge_counts.entry(bucket).or_insert(0) += 1;
            }
        }

        let min_occurrences =
            ((evidence.len() as f32 * self.config.min_alignment_ratio) as usize).max(2);

        let mut column_edges: Vec<f32> = edge_counts
            .iter()
            .filter(|(_, count)| **count >= min_occurrences)
            .map(|(bucket, _)| *bucket as f32 * EDGE_BUCKET)
            .collect();
        column_edges.sort_by(f32::total_cmp);

        let mut merged: Vec<f32> = Vec::new();
        for edge in column_edges {
            match merged.last() {
                Some(last) if edge - last < self.config.min_column_gap => {}
                _ => merged.push(edge),
            }
        }
        merged
    }

    /// Contiguous runs of well-aligned rows.
    fn find_table_regions(&self, rows: &[RowData], columns: &[f32]) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut current_start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            if alignment_score(row, columns) >= self.config.min_alignment_ratio {
                current_start.get_or_insert(i);
            } else if let Some(start) = current_start.take() {
                if i - start >= self.config.min_rows {
                    regions.push((start, i - 1));
                }
            }
        }

        if let Some(start) = current_start {
            if rows.len() - start >= self.config.min_rows {
                regions.push((start, rows.len() - 1));
            }
        }

        regions
    }

    /// Numbered or bulleted lists look like two-column tables.
    fn is_list_pattern(&self, rows: &[RowData], columns: &[f32]) -> bool {
        if columns.len() < 2 || rows.is_empty() {
            return false;
        }

        let mut bullet_count = 0;
        let mut number_count = 0;
        for row in rows {
            // Spans are sorted left to right
            if let Some(first) = row.spans.first() {
                let text = first.text.trim();
                if is_bullet_marker(text) {
                    bullet_count += 1;
                } else if is_number_marker(text) {
                    number_count += 1;
                }
            }
        }

        let bullet_ratio = bullet_count as f32 / rows.len() as f32;
        let total_ratio = (bullet_count + number_count) as f32 / rows.len() as f32;

        bullet_ratio >= 0.5 || (columns.len() == 2 && total_ratio >= 0.5)
    }

    fn fill_cells(&self, rows: &[RowData], columns: &[f32], right_x: f32) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| {
                let mut contents: Vec<Vec<&str>> = vec![Vec::new(); columns.len()];
                for span in &row.spans {
                    let col = find_column_for_span(span.bbox.x0, columns, right_x);
                    contents[col].push(span.text.trim());
                }
                contents.into_iter().map(|parts| parts.join(" ")).collect()
            })
            .collect()
    }
}

fn make_row(mut spans: Vec<&Span>) -> RowData<'_> {
    spans.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
    RowData { spans }
}

fn alignment_score(row: &RowData, columns: &[f32]) -> f32 {
    if row.spans.is_empty() || columns.is_empty() {
        return 0.0;
    }
    let aligned = row
        .spans
        .iter()
        .filter(|s| columns.iter().any(|c| (s.bbox.x0 - c).abs() <= ALIGNMENT_TOLERANCE))
        .count();
    aligned as f32 / row.spans.len() as f32
}

/// Column whose range holds `x`, else the nearest column start.
fn find_column_for_span(x: f32, columns: &[f32], right_x: f32) -> usize {
    for (i, &start) in columns.iter().enumerate() {
        let end = columns.get(i + 1).copied().unwrap_or(right_x + 100.0);
        // Spans may start slightly before their column edge.
        if x >= start - 10.0 && x < end - 10.0 {
            return i;
        }
    }

    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (x - **a).abs().total_cmp(&(x - **b).abs()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Check if text is a bullet marker (•, -, etc.).
fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "►" | "■" | "●" | "□" | "◆" | "▶" | "➤"
    )
}

/// Check if text is a number-style list marker (1., 2), a., etc.).
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }

    if let Some(pos) = cleaned.find(|c: char| !c.is_ascii_digit()) {
        let (prefix, suffix) = cleaned.split_at(pos);
        if !prefix.is_empty() && (suffix == "." || suffix == ")") {
            return true;
        }
    }

    if cleaned.parse::<u32>().is_ok() {
        return true;
    }

    let chars: Vec<char> = cleaned.chars().collect();
    chars.len() == 2 && chars[0].is_alphabetic() && (chars[1] == '.' || chars[1] == ')')
}

// ---------------------------------------------------------------------------
// Lattice flavor
// ---------------------------------------------------------------------------

/// Lattice detector configuration.
#[derive(Debug, Clone)]
pub struct LatticeDetectorConfig {
    /// Slack when testing whether two rulings cross
    pub intersection_tolerance: f32,
    /// Distance under which two intersection coordinates are the same
    pub snap_tolerance: f32,
    /// Minimum number of cells in a table
    pub min_cells: usize,
}

impl Default for LatticeDetectorConfig {
    fn default() -> Self {
        Self {
            intersection_tolerance: 3.0,
            snap_tolerance: 1.0,
            min_cells: 1,
        }
    }
}

/// Detects ruled tables from line intersections.
#[derive(Debug, Clone, Default)]
pub struct LatticeDetector {
    config: LatticeDetectorConfig,
}

impl LatticeDetector {
    /// Create a detector with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector with custom configuration.
    pub fn with_config(config: LatticeDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect tables on one page from its rulings, filling cells from spans.
    pub fn detect(&self, page_number: u32, rulings: &[Ruling], spans: &[Span]) -> Vec<DetectedTable> {
        let points = self.intersections(rulings);
        let cells = self.cells_from_intersections(&points, rulings);
        log::debug!(
            "LatticeDetector: page {}: {} rulings, {} intersections, {} cells",
            page_number,
            rulings.len(),
            points.len(),
            cells.len()
        );

        group_cells(cells)
            .into_iter()
            .filter(|group| group.len() >= self.config.min_cells)
            .map(|group| build_table(page_number, &group, spans))
            .collect()
    }

    fn intersections(&self, rulings: &[Ruling]) -> Vec<(f32, f32)> {
        let tol = self.config.intersection_tolerance;
        let horizontals = rulings
            .iter()
            .filter(|r| r.orientation == Orientation::Horizontal);

        let mut points = Vec::new();
        for h in horizontals {
            for v in rulings
                .iter()
                .filter(|r| r.orientation == Orientation::Vertical)
            {
                if v.x0 >= h.x0 - tol && v.x0 <= h.x1 + tol && h.y0 >= v.y0 - tol && h.y0 <= v.y1 + tol {
                    points.push((v.x0, h.y0));
                }
            }
        }

        let snap = self.config.snap_tolerance;
        let xs = cluster(points.iter().map(|p| p.0).collect(), snap);
        let ys = cluster(points.iter().map(|p| p.1).collect(), snap);

        let mut snapped: Vec<(f32, f32)> = points
            .into_iter()
            .map(|(x, y)| (nearest(&xs, x), nearest(&ys, y)))
            .collect();
        snapped.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.total_cmp(&b.1)));
        snapped.dedup();
        snapped
    }

    /// Cells whose four corners are intersections and whose sides are drawn.
    fn cells_from_intersections(&self, points: &[(f32, f32)], rulings: &[Ruling]) -> Vec<BoundingBox> {
        let mut xs: Vec<f32> = points.iter().map(|p| p.0).collect();
        let mut ys: Vec<f32> = points.iter().map(|p| p.1).collect();
        xs.sort_by(f32::total_cmp);
        xs.dedup();
        ys.sort_by(f32::total_cmp);
        ys.dedup();

        let corners: HashSet<(u32, u32)> = points
            .iter()
            .map(|(x, y)| (x.to_bits(), y.to_bits()))
            .collect();
        let has = |x: f32, y: f32| corners.contains(&(x.to_bits(), y.to_bits()));

        let mut cells = Vec::new();
        for yw in ys.windows(2) {
            for xw in xs.windows(2) {
                let (x0, x1, top, bottom) = (xw[0], xw[1], yw[0], yw[1]);
                if has(x0, top)
                    && has(x1, top)
                    && has(x0, bottom)
                    && has(x1, bottom)
                    && self.sides_drawn(x0, top, x1, bottom, rulings)
                {
                    cells.push(BoundingBox::new(x0, top, x1, bottom));
                }
            }
        }
        cells
    }

    fn sides_drawn(&self, x0: f32, top: f32, x1: f32, bottom: f32, rulings: &[Ruling]) -> bool {
        let tol = self.config.intersection_tolerance;
        let horizontal = |y: f32| {
            rulings.iter().any(|r| {
                r.orientation == Orientation::Horizontal
                    && (r.y0 - y).abs() <= tol
                    && r.x0 <= x0 + tol
                    && r.x1 >= x1 - tol
            })
        };
        let vertical = |x: f32| {
            rulings.iter().any(|r| {
                r.orientation == Orientation::Vertical
                    && (r.x0 - x).abs() <= tol
                    && r.y0 <= top + tol
                    && r.y1 >= bottom - tol
            })
        };
        horizontal(top) && horizontal(bottom) && vertical(x0) && vertical(x1)
    }
}

/// Sorted representative values, one per cluster of nearby inputs.
fn cluster(mut values: Vec<f32>, tolerance: f32) -> Vec<f32> {
    values.sort_by(f32::total_cmp);
    let mut out: Vec<f32> = Vec::new();
    for v in values {
        match out.last() {
            Some(last) if v - last <= tolerance => {}
            _ => out.push(v),
        }
    }
    out
}

fn nearest(reps: &[f32], v: f32) -> f32 {
    reps.iter()
        .copied()
        .min_by(|a, b| (a - v).abs().total_cmp(&(b - v).abs()))
        .unwrap_or(v)
}

/// Group cells sharing an edge (union-find), ordered top to bottom.
fn group_cells(cells: Vec<BoundingBox>) -> Vec<Vec<BoundingBox>> {
    let n = cells.len();
    let mut parent: Vec<usize> = (0..n).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for i in 0..n {
        for j in (i + 1)..n {
            if share_edge(&cells[i], &cells[j]) {
                let (ra, rb) = (find(&mut parent, i), find(&mut parent, j));
                if ra != rb {
                    parent[rb] = ra;
                }
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<BoundingBox>> = BTreeMap::new();
    for (i, cell) in cells.into_iter().enumerate() {
        let root = find(&mut parent, i);
        groups.entry(root).or_default().push(cell);
    }

    let mut tables: Vec<Vec<BoundingBox>> = groups.into_values().collect();
    tables.sort_by(|a, b| {
        let (ta, tb) = (a[0].y0, b[0].y0);
        ta.total_cmp(&tb).then_with(|| a[0].x0.total_cmp(&b[0].x0))
    });
    tables
}

fn share_edge(a: &BoundingBox, b: &BoundingBox) -> bool {
    let eps = 1e-3;
    let vertical = ((a.x1 - b.x0).abs() < eps || (a.x0 - b.x1).abs() < eps)
        && a.y0 < b.y1 + eps
        && b.y0 < a.y1 + eps;
    let horizontal = ((a.y1 - b.y0).abs() < eps || (a.y0 - b.y1).abs() < eps)
        && a.x0 < b.x1 + eps
        && b.x0 < a.x1 + eps;
    vertical || horizontal
}

/// Lay a group of cells on a grid and fill each with the spans centered in it.
fn build_table(page_number: u32, cells: &[BoundingBox], spans: &[Span]) -> DetectedTable {
    let mut tops: Vec<f32> = cells.iter().map(|c| c.y0).collect();
    let mut lefts: Vec<f32> = cells.iter().map(|c| c.x0).collect();
    tops.sort_by(f32::total_cmp);
    tops.dedup();
    lefts.sort_by(f32::total_cmp);
    lefts.dedup();

    let mut grid = vec![vec![String::new(); lefts.len()]; tops.len()];
    for cell in cells {
        let row = tops.iter().position(|t| *t == cell.y0).unwrap_or(0);
        let col = lefts.iter().position(|l| *l == cell.x0).unwrap_or(0);

        let mut inside: Vec<&Span> = spans
            .iter()
            .filter(|s| {
                let (cx, cy) = s.bbox.center();
                cell.contains_point(cx, cy)
            })
            .collect();
        inside.sort_by(|a, b| {
            a.bbox
                .y1
                .total_cmp(&b.bbox.y1)
                .then_with(|| a.bbox.x0.total_cmp(&b.bbox.x0))
        });

        grid[row][col] = inside
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
    }

    let bbox = cells
        .iter()
        .copied()
        .reduce(|acc, c| acc.union(&c))
        .unwrap_or_default();

    DetectedTable::new(page_number, bbox, grid)
}
