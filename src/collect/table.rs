//! Table collection: filters degenerate detections and exports CSV.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::TableElement;
use crate::parser::{DetectedTable, ExtractOptions, TableProvider};
use crate::policy::MIN_TABLE_AREA;

use super::handle_failure;

/// Subdirectory of the output directory holding table exports.
pub const TABLES_DIR: &str = "tables";

/// File name of the table at detection index `index` (0-based).
pub fn table_file_name(index: usize) -> String {
    format!("table_{}.csv", index + 1)
}

/// Whether a detection carries no usable table.
///
/// Degenerate: no rows, no columns, only blank cells, or a region smaller
/// than [`MIN_TABLE_AREA`].
pub fn is_degenerate(table: &DetectedTable) -> bool {
    let (rows, columns) = table.shape();
    rows == 0 || columns == 0 || table.is_blank() || table.bbox.normalized().area() < MIN_TABLE_AREA
}

/// Exports the tables found by a [`TableProvider`] under `<output>/tables/`.
pub struct TableCollector<'a> {
    options: &'a ExtractOptions,
    tables_dir: PathBuf,
}

impl<'a> TableCollector<'a> {
    /// Create a collector writing below `output_dir`.
    pub fn new(options: &'a ExtractOptions, output_dir: &Path) -> Self {
        Self {
            options,
            tables_dir: output_dir.join(TABLES_DIR),
        }
    }

    /// Detect, filter and export the tables of `pdf_path`.
    ///
    /// File names follow the detection index, so discarded tables leave gaps.
    pub fn collect(&self, provider: &dyn TableProvider, pdf_path: &Path) -> Result<Vec<TableElement>> {
        let detected = match handle_failure(
            self.options.error_mode,
            "table detection",
            provider.detect(pdf_path, &self.options.pages, self.options.table_flavor),
        )? {
            Some(tables) => tables,
            None => return Ok(Vec::new()),
        };

        let mut elements = Vec::new();
        for (idx, table) in detected.iter().enumerate() {
            if is_degenerate(table) {
                log::debug!(
                    "Discarding degenerate table {} on page {} (shape {:?})",
                    idx + 1,
                    table.page_number,
                    table.shape()
                );
                continue;
            }

            fs::create_dir_all(&self.tables_dir)?;
            let path = self.tables_dir.join(table_file_name(idx));
            write_table_csv(&path, table)?;

            let (rows, columns) = table.shape();
            elements.push(TableElement::new(
                table.page_number,
                table.bbox.normalized(),
                path,
                rows,
                columns,
            ));
        }

        log::debug!(
            "Kept {} of {} detected tables",
            elements.len(),
            detected.len()
        );
        Ok(elements)
    }
}

fn write_table_csv(path: &Path, table: &DetectedTable) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    for row in &table.cells {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
