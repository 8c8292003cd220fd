//! Content-stream interpretation.
//!
//! Walks the operators of one page and records positioned text spans, image
//! XObject placements and stroked/filled ruling segments. All output boxes use
//! the top-left page origin.

use std::collections::{BTreeMap, HashMap};

use lopdf::{Dictionary, Document as LopdfDocument, Object};

use crate::error::{Error, Result};
use crate::model::BoundingBox;

use super::backend::{decode_text_simple, Span};

/// Rough advance width of one glyph, as a fraction of the font size.
const GLYPH_WIDTH_FACTOR: f32 = 0.5;
/// Ascender height, as a fraction of the font size.
const ASCENT_FACTOR: f32 = 0.8;
/// Descender depth, as a fraction of the font size.
const DESCENT_FACTOR: f32 = 0.2;
/// TJ adjustment (thousandths of an em) treated as a word space.
const TJ_SPACE_THRESHOLD: f32 = 200.0;
/// Segments thinner than this are rulings rather than filled areas.
const RULING_THICKNESS: f32 = 2.0;
/// Slack when deciding whether a segment is axis-aligned.
const AXIS_TOLERANCE: f32 = 1.0;

/// An XObject drawn with `Do`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Placement {
    pub name: Vec<u8>,
    pub bbox: BoundingBox,
}

/// Orientation of a ruling segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Constant y
    Horizontal,
    /// Constant x
    Vertical,
}

/// An axis-aligned line drawn on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ruling {
    /// Left end (or x for verticals)
    pub x0: f32,
    /// Top end (or y for horizontals)
    pub y0: f32,
    /// Right end
    pub x1: f32,
    /// Bottom end
    pub y1: f32,
    /// Orientation
    pub orientation: Orientation,
}

impl Ruling {
    /// Build a ruling from two points, or `None` for diagonal segments.
    pub fn between(a: (f32, f32), b: (f32, f32)) -> Option<Self> {
        let (x0, x1) = (a.0.min(b.0), a.0.max(b.0));
        let (y0, y1) = (a.1.min(b.1), a.1.max(b.1));
        let orientation = if y1 - y0 <= AXIS_TOLERANCE {
            Orientation::Horizontal
        } else if x1 - x0 <= AXIS_TOLERANCE {
            Orientation::Vertical
        } else {
            return None;
        };

        match orientation {
            Orientation::Horizontal => {
                let y = (y0 + y1) / 2.0;
                Some(Self { x0, y0: y, x1, y1: y, orientation })
            }
            Orientation::Vertical => {
                let x = (x0 + x1) / 2.0;
                Some(Self { x0: x, y0, x1: x, y1, orientation })
            }
        }
    }
}

/// Everything recorded from one page's content stream.
#[derive(Debug, Clone, Default)]
pub(crate) struct PageContent {
    pub spans: Vec<Span>,
    pub placements: Vec<Placement>,
    pub rulings: Vec<Ruling>,
}

/// Affine transform `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }
}

impl Matrix {
    fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self` applied first, then `other`.
    fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn transform(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Length of the transformed unit y vector.
    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }

    /// Length of the transformed unit x vector.
    fn horizontal_scale(&self) -> f32 {
        (self.a * self.a + self.b * self.b).sqrt()
    }
}

/// Text object state (`BT` .. `ET`).
#[derive(Debug, Clone, Default)]
struct TextState {
    matrix: Matrix,
    line_matrix: Matrix,
    leading: f32,
}

impl TextState {
    fn begin(&mut self) {
        self.matrix = Matrix::default();
        self.line_matrix = Matrix::default();
    }

    fn set(&mut self, m: Matrix) {
        self.matrix = m;
        self.line_matrix = m;
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).then(&self.line_matrix);
        self.matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = if self.leading == 0.0 { 12.0 } else { self.leading };
        self.move_line(0.0, -leading);
    }

    fn advance(&mut self, tx: f32) {
        self.matrix = Matrix::translation(tx, 0.0).then(&self.matrix);
    }
}

/// Interprets one page's content stream.
pub(crate) struct ContentInterpreter<'a> {
    doc: &'a LopdfDocument,
    fonts: BTreeMap<Vec<u8>, &'a Dictionary>,
    base_fonts: HashMap<Vec<u8>, String>,
    page_height: f32,
}

impl<'a> ContentInterpreter<'a> {
    /// Create an interpreter for a page.
    pub fn new(
        doc: &'a LopdfDocument,
        fonts: BTreeMap<Vec<u8>, &'a Dictionary>,
        page_height: f32,
    ) -> Self {
        let base_fonts = fonts
            .iter()
            .map(|(name, dict)| {
                let base_font = dict
                    .get(b"BaseFont")
                    .ok()
                    .and_then(|o| o.as_name().ok())
                    .map(|n| String::from_utf8_lossy(n).to_string())
                    .unwrap_or_else(|| String::from_utf8_lossy(name).to_string());
                (name.clone(), base_font)
            })
            .collect();

        Self {
            doc,
            fonts,
            base_fonts,
            page_height,
        }
    }

    /// Decode and interpret raw content stream bytes.
    pub fn run(&self, content: &[u8]) -> Result<PageContent> {
        let content =
            lopdf::content::Content::decode(content).map_err(|e| Error::PdfParse(e.to_string()))?;

        let mut out = PageContent::default();
        let mut ctm = Matrix::default();
        let mut ctm_stack: Vec<Matrix> = Vec::new();
        let mut text = TextState::default();
        let mut in_text_block = false;
        let mut font_key: Vec<u8> = Vec::new();
        let mut font_size: f32 = 12.0;
        let mut path: Vec<(f32, f32, f32, f32)> = Vec::new();
        let mut cursor: Option<(f32, f32)> = None;
        let mut subpath_start: Option<(f32, f32)> = None;

        for op in content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => ctm_stack.push(ctm),
                "Q" => {
                    if let Some(saved) = ctm_stack.pop() {
                        ctm = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix_operand(operands) {
                        ctm = m.then(&ctm);
                    }
                }
                "BT" => {
                    in_text_block = true;
                    text.begin();
                }
                "ET" => in_text_block = false,
                "Tf" => {
                    if operands.len() >= 2 {
                        if let Object::Name(name) = &operands[0] {
                            font_key = name.clone();
                        }
                        font_size = get_number(&operands[1]).unwrap_or(12.0);
                    }
                }
                "TL" => {
                    if let Some(leading) = operands.first().and_then(get_number) {
                        text.leading = leading;
                    }
                }
                "Td" | "TD" => {
                    if operands.len() >= 2 {
                        let tx = get_number(&operands[0]).unwrap_or(0.0);
                        let ty = get_number(&operands[1]).unwrap_or(0.0);
                        if op.operator == "TD" {
                            text.leading = -ty;
                        }
                        text.move_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = matrix_operand(operands) {
                        text.set(m);
                    }
                }
                "T*" => text.next_line(),
                "Tj" | "TJ" | "'" | "\"" => {
                    if op.operator == "'" || op.operator == "\"" {
                        text.next_line();
                    }
                    if !in_text_block {
                        continue;
                    }
                    let decoded = match op.operator.as_str() {
                        "TJ" => match operands.first() {
                            Some(Object::Array(items)) => self.decode_array(&font_key, items),
                            _ => String::new(),
                        },
                        "\"" => self.decode_operand(&font_key, operands.get(2)),
                        _ => self.decode_operand(&font_key, operands.first()),
                    };
                    if let Some(span) = self.make_span(&decoded, &font_key, font_size, &text, &ctm) {
                        out.spans.push(span);
                    }
                    let glyphs = decoded.chars().count() as f32;
                    text.advance(glyphs * font_size * GLYPH_WIDTH_FACTOR);
                }
                "Do" => {
                    if let Some(Object::Name(name)) = operands.first() {
                        out.placements.push(Placement {
                            name: name.clone(),
                            bbox: self.unit_square_bbox(&ctm),
                        });
                    }
                }
                "m" => {
                    if let Some(p) = point_operand(operands, &ctm) {
                        cursor = Some(p);
                        subpath_start = Some(p);
                    }
                }
                "l" => {
                    if let (Some(from), Some(to)) = (cursor, point_operand(operands, &ctm)) {
                        path.push((from.0, from.1, to.0, to.1));
                        cursor = Some(to);
                    }
                }
                "h" => {
                    if let (Some(from), Some(to)) = (cursor, subpath_start) {
                        path.push((from.0, from.1, to.0, to.1));
                        cursor = Some(to);
                    }
                }
                "re" => {
                    if operands.len() >= 4 {
                        let x = get_number(&operands[0]).unwrap_or(0.0);
                        let y = get_number(&operands[1]).unwrap_or(0.0);
                        let w = get_number(&operands[2]).unwrap_or(0.0);
                        let h = get_number(&operands[3]).unwrap_or(0.0);
                        let corners = [
                            ctm.transform(x, y),
                            ctm.transform(x + w, y),
                            ctm.transform(x + w, y + h),
                            ctm.transform(x, y + h),
                        ];
                        if w.abs() * ctm.horizontal_scale() < RULING_THICKNESS
                            || h.abs() * ctm.vertical_scale() < RULING_THICKNESS
                        {
                            // A thin filled bar is a single ruling along its long axis.
                            let (c0, c2) = (corners[0], corners[2]);
                            let mid_x = (c0.0 + c2.0) / 2.0;
                            let mid_y = (c0.1 + c2.1) / 2.0;
                            if (c0.0 - c2.0).abs() > (c0.1 - c2.1).abs() {
                                path.push((c0.0, mid_y, c2.0, mid_y));
                            } else {
                                path.push((mid_x, c0.1, mid_x, c2.1));
                            }
                        } else {
                            for i in 0..4 {
                                let (a, b) = (corners[i], corners[(i + 1) % 4]);
                                path.push((a.0, a.1, b.0, b.1));
                            }
                        }
                        cursor = Some(corners[0]);
                        subpath_start = Some(corners[0]);
                    }
                }
                "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" => {
                    for (x0, y0, x1, y1) in path.drain(..) {
                        let a = (x0, self.page_height - y0);
                        let b = (x1, self.page_height - y1);
                        if let Some(ruling) = Ruling::between(a, b) {
                            out.rulings.push(ruling);
                        }
                    }
                    cursor = None;
                    subpath_start = None;
                }
                "n" => {
                    path.clear();
                    cursor = None;
                    subpath_start = None;
                }
                _ => {}
            }
        }

        Ok(out)
    }

    fn decode_operand(&self, font_key: &[u8], operand: Option<&Object>) -> String {
        match operand {
            Some(Object::String(bytes, _)) => self.decode_bytes(font_key, bytes),
            _ => String::new(),
        }
    }

    /// TJ: strings interleaved with kerning adjustments. Large negative
    /// adjustments are word breaks.
    fn decode_array(&self, font_key: &[u8], items: &[Object]) -> String {
        let mut combined = String::new();
        for item in items {
            match item {
                Object::String(bytes, _) => combined.push_str(&self.decode_bytes(font_key, bytes)),
                Object::Integer(_) | Object::Real(_) => {
                    let adjustment = -get_number(item).unwrap_or(0.0);
                    if adjustment > TJ_SPACE_THRESHOLD
                        && !combined.is_empty()
                        && !combined.ends_with(' ')
                    {
                        combined.push(' ');
                    }
                }
                _ => {}
            }
        }
        combined
    }

    fn decode_bytes(&self, font_key: &[u8], bytes: &[u8]) -> String {
        let encoding = self
            .fonts
            .get(font_key)
            .and_then(|f| f.get_font_encoding(self.doc).ok());
        match encoding {
            Some(ref enc) => LopdfDocument::decode_text(enc, bytes)
                .unwrap_or_else(|_| decode_text_simple(bytes)),
            None => decode_text_simple(bytes),
        }
    }

    fn make_span(
        &self,
        text: &str,
        font_key: &[u8],
        font_size: f32,
        state: &TextState,
        ctm: &Matrix,
    ) -> Option<Span> {
        if text.trim().is_empty() {
            return None;
        }

        let rendering = state.matrix.then(ctm);
        let (x, baseline) = rendering.transform(0.0, 0.0);
        let size = font_size * rendering.vertical_scale();
        let width = text.chars().count() as f32 * size * GLYPH_WIDTH_FACTOR;

        let font = self
            .base_fonts
            .get(font_key)
            .cloned()
            .unwrap_or_else(|| String::from_utf8_lossy(font_key).to_string());

        let bbox = BoundingBox::new(
            x,
            self.page_height - (baseline + size * ASCENT_FACTOR),
            x + width,
            self.page_height - (baseline - size * DESCENT_FACTOR),
        );

        Some(Span::new(text, font, size, bbox))
    }

    /// Image XObjects occupy the unit square mapped through the CTM.
    fn unit_square_bbox(&self, ctm: &Matrix) -> BoundingBox {
        let corners = [
            ctm.transform(0.0, 0.0),
            ctm.transform(1.0, 0.0),
            ctm.transform(0.0, 1.0),
            ctm.transform(1.0, 1.0),
        ];
        let min_x = corners.iter().map(|p| p.0).fold(f32::INFINITY, f32::min);
        let max_x = corners.iter().map(|p| p.0).fold(f32::NEG_INFINITY, f32::max);
        let min_y = corners.iter().map(|p| p.1).fold(f32::INFINITY, f32::min);
        let max_y = corners.iter().map(|p| p.1).fold(f32::NEG_INFINITY, f32::max);

        BoundingBox::new(
            min_x,
            self.page_height - max_y,
            max_x,
            self.page_height - min_y,
        )
    }
}

fn matrix_operand(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let n: Vec<f32> = operands[..6].iter().filter_map(get_number).collect();
    if n.len() != 6 {
        return None;
    }
    Some(Matrix::new(n[0], n[1], n[2], n[3], n[4], n[5]))
}

fn point_operand(operands: &[Object], ctm: &Matrix) -> Option<(f32, f32)> {
    let x = get_number(operands.first()?)?;
    let y = get_number(operands.get(1)?)?;
    Some(ctm.transform(x, y))
}

/// Helper to extract number from PDF object.
pub(crate) fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_then() {
        let scale = Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let shift = Matrix::translation(10.0, 20.0);
        // Scale first, then shift.
        let m = scale.then(&shift);
        assert_eq!(m.transform(1.0, 1.0), (12.0, 22.0));
        // Shift first, then scale.
        let m = shift.then(&scale);
        assert_eq!(m.transform(1.0, 1.0), (22.0, 42.0));
    }

    #[test]
    fn test_text_state_line_movement() {
        let mut state = TextState::default();
        state.begin();
        state.move_line(100.0, 700.0);
        state.advance(30.0);
        assert_eq!(state.matrix.transform(0.0, 0.0), (130.0, 700.0));

        state.leading = 14.0;
        state.next_line();
        assert_eq!(state.matrix.transform(0.0, 0.0), (100.0, 686.0));
    }

    #[test]
    fn test_ruling_classification() {
        let h = Ruling::between((10.0, 50.0), (200.0, 50.5)).unwrap();
        assert_eq!(h.orientation, Orientation::Horizontal);
        assert_eq!((h.x0, h.x1), (10.0, 200.0));

        let v = Ruling::between((30.0, 100.0), (30.0, 10.0)).unwrap();
        assert_eq!(v.orientation, Orientation::Vertical);
        assert_eq!((v.y0, v.y1), (10.0, 100.0));

        assert!(Ruling::between((0.0, 0.0), (50.0, 50.0)).is_none());
    }

    #[test]
    fn test_get_number() {
        assert_eq!(get_number(&Object::Integer(42)), Some(42.0));
        assert_eq!(get_number(&Object::Real(3.5)), Some(3.5));
        assert_eq!(get_number(&Object::Null), None);
    }
}
