//! Merging of the per-kind element streams into reading order.

use crate::model::{ImageElement, LayoutElement, TableElement, TextElement};

/// Merge text, image and table elements into one `(page, y)` ordered stream.
///
/// The sort is stable: elements at the same position keep the order text,
/// image, table, and their collection order within a kind. Non-finite
/// positions are treated as 0. No element is ever dropped.
pub fn merge_elements(
    text: Vec<TextElement>,
    images: Vec<ImageElement>,
    tables: Vec<TableElement>,
) -> Vec<LayoutElement> {
    let elements: Vec<LayoutElement> = text
        .into_iter()
        .map(LayoutElement::from)
        .chain(images.into_iter().map(LayoutElement::from))
        .chain(tables.into_iter().map(LayoutElement::from))
        .collect();

    sort_elements(elements)
}

/// Stable-sort already combined elements by `(page_number, y_position)`.
pub fn sort_elements(mut elements: Vec<LayoutElement>) -> Vec<LayoutElement> {
    for element in &mut elements {
        element.normalize_position();
    }

    elements.sort_by(|a, b| {
        a.page_number()
            .cmp(&b.page_number())
            .then_with(|| a.y_position().total_cmp(&b.y_position()))
    });
    elements
}
