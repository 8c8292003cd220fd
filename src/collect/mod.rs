//! Collectors turning content-model primitives into layout elements.
//!
//! Each collector is independent: text lines come from the span structure,
//! images from placements (their bytes are written to disk), tables from a
//! [`TableProvider`](crate::parser::TableProvider) (exported as CSV).

mod image;
mod table;
mod text;

pub use image::{image_file_name, ImageCollector, IMAGES_DIR};
pub use table::{is_degenerate, table_file_name, TableCollector, TABLES_DIR};
pub use text::{lines_from_page, TextLineCollector};

use crate::error::Result;
use crate::parser::ErrorMode;

/// Apply the error mode to a per-page or per-element failure.
///
/// Strict mode propagates the error; lenient mode logs it and yields `None`.
pub(crate) fn handle_failure<T>(mode: ErrorMode, what: &str, result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if mode == ErrorMode::Lenient => {
            log::warn!("Skipping {}: {}", what, e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
