//! Image collection: persists image bytes and emits placement elements.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::ImageElement;
use crate::parser::{ContentModel, ExtractOptions};

use super::handle_failure;

/// Subdirectory of the output directory holding extracted images.
pub const IMAGES_DIR: &str = "images";

/// File name of the `index`-th (1-based) image on a page.
pub fn image_file_name(page_number: u32, index: usize, extension: &str) -> String {
    format!("page{}_img{}.{}", page_number, index, extension)
}

/// Writes every placed image of the selected pages under `<output>/images/`.
pub struct ImageCollector<'a> {
    options: &'a ExtractOptions,
    images_dir: PathBuf,
}

impl<'a> ImageCollector<'a> {
    /// Create a collector writing below `output_dir`.
    pub fn new(options: &'a ExtractOptions, output_dir: &Path) -> Self {
        Self {
            options,
            images_dir: output_dir.join(IMAGES_DIR),
        }
    }

    /// Collect images in page order, then placement order.
    ///
    /// Write failures always propagate; decode failures follow the error mode.
    pub fn collect(&self, model: &dyn ContentModel) -> Result<Vec<ImageElement>> {
        let mode = self.options.error_mode;
        let mut elements = Vec::new();

        for page_number in self.options.pages.page_numbers(model.page_count()) {
            let placements = match handle_failure(
                mode,
                &format!("images of page {}", page_number),
                model.page_images(page_number - 1),
            )? {
                Some(placements) => placements,
                None => continue,
            };

            for (i, image) in placements.iter().enumerate() {
                let index = i + 1;
                let data = match handle_failure(
                    mode,
                    &format!("image {} on page {}", index, page_number),
                    model.image_data(image),
                )? {
                    Some(data) => data,
                    None => continue,
                };

                fs::create_dir_all(&self.images_dir)?;
                let path = self
                    .images_dir
                    .join(image_file_name(page_number, index, &data.extension));
                fs::write(&path, &data.bytes)?;

                elements.push(ImageElement::new(page_number, image.bbox.normalized(), path));
            }
        }

        log::debug!("Collected {} images", elements.len());
        Ok(elements)
    }
}
