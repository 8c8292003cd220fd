//! End-to-end extraction pipeline.
//!
//! A run collects text lines, images and tables from one document, merges
//! them into reading order, derives the feature table and writes it below the
//! output directory:
//!
//! ```text
//! <output>/
//! ├── images/page{N}_img{M}.{ext}
//! ├── tables/table_{idx}.csv
//! ├── features.json
//! └── features.csv        (optional)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::classify::{apply_classifier, Classifier};
use crate::collect::{ImageCollector, TableCollector, TextLineCollector};
use crate::error::Result;
use crate::features::{kind_counts, FeatureDeriver};
use crate::label::RuleLabeler;
use crate::merge::merge_elements;
use crate::model::{ElementKind, FeatureRow, LayoutElement, Metadata};
use crate::parser::{
    ContentModel, ExtractOptions, LopdfBackend, LopdfTableProvider, TableProvider,
};
use crate::policy::LabelPolicy;
use crate::render::{write_features_csv, write_features_json, JsonFormat};

/// File name of the feature table.
pub const FEATURES_JSON: &str = "features.json";

/// File name of the optional CSV copy of the feature table.
pub const FEATURES_CSV: &str = "features.csv";

enum Labeling {
    None,
    Rules(RuleLabeler),
    Model(Box<dyn Classifier>),
}

/// Configurable extraction pipeline.
///
/// # Example
///
/// ```no_run
/// use pdfstruct::{ExtractOptions, Pipeline};
///
/// let output = Pipeline::new("report_output")
///     .with_options(ExtractOptions::new().lenient())
///     .with_labels(true)
///     .run("report.pdf")?;
/// println!("{} rows", output.features.len());
/// # Ok::<(), pdfstruct::Error>(())
/// ```
pub struct Pipeline {
    output_dir: PathBuf,
    options: ExtractOptions,
    labeling: Labeling,
    write_csv: bool,
    json_format: JsonFormat,
    table_provider: Box<dyn TableProvider>,
}

impl Pipeline {
    /// Create a pipeline writing below `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            options: ExtractOptions::default(),
            labeling: Labeling::None,
            write_csv: false,
            json_format: JsonFormat::Pretty,
            table_provider: Box::new(LopdfTableProvider::default()),
        }
    }

    /// Set extraction options.
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Label rows with the default rules (or stop labeling).
    pub fn with_labels(mut self, label: bool) -> Self {
        self.labeling = if label {
            Labeling::Rules(RuleLabeler::new())
        } else {
            Labeling::None
        };
        self
    }

    /// Label rows with the rules and custom thresholds.
    pub fn with_policy(mut self, policy: LabelPolicy) -> Self {
        self.labeling = Labeling::Rules(RuleLabeler::with_policy(policy));
        self
    }

    /// Label rows with an external classifier.
    pub fn with_classifier(mut self, classifier: Box<dyn Classifier>) -> Self {
        self.labeling = Labeling::Model(classifier);
        self
    }

    /// Also write the feature table as CSV.
    pub fn with_csv(mut self, write_csv: bool) -> Self {
        self.write_csv = write_csv;
        self
    }

    /// Set the JSON format of the feature table.
    pub fn with_json_format(mut self, format: JsonFormat) -> Self {
        self.json_format = format;
        self
    }

    /// Use a different table detector.
    pub fn with_table_provider(mut self, provider: Box<dyn TableProvider>) -> Self {
        self.table_provider = provider;
        self
    }

    /// Output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Extraction options in use.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Open `pdf_path` with the lopdf backend and run the pipeline on it.
    pub fn run<P: AsRef<Path>>(&self, pdf_path: P) -> Result<PipelineOutput> {
        let pdf_path = pdf_path.as_ref();
        let backend = LopdfBackend::open(pdf_path)?;
        log::info!("Extracting {}", pdf_path.display());
        self.run_with_model(&backend, pdf_path)
    }

    /// Run the pipeline on an already opened content model.
    ///
    /// `pdf_path` is handed to the table provider.
    pub fn run_with_model(
        &self,
        model: &dyn ContentModel,
        pdf_path: &Path,
    ) -> Result<PipelineOutput> {
        fs::create_dir_all(&self.output_dir)?;
        let metadata = model.metadata()?;

        let text = TextLineCollector::new(&self.options).collect(model)?;

        let images = if self.options.extract_images {
            ImageCollector::new(&self.options, &self.output_dir).collect(model)?
        } else {
            Vec::new()
        };

        let tables = if self.options.extract_tables {
            TableCollector::new(&self.options, &self.output_dir)
                .collect(self.table_provider.as_ref(), pdf_path)?
        } else {
            Vec::new()
        };

        let elements = merge_elements(text, images, tables);
        let mut features = FeatureDeriver::new(&elements).derive_all(&elements);

        match &self.labeling {
            Labeling::None => {}
            Labeling::Rules(labeler) => labeler.label_rows(&mut features),
            Labeling::Model(classifier) => apply_classifier(classifier.as_ref(), &mut features)?,
        }

        let features_path = self.output_dir.join(FEATURES_JSON);
        write_features_json(&features_path, &features, self.json_format)?;

        let csv_path = if self.write_csv {
            let path = self.output_dir.join(FEATURES_CSV);
            write_features_csv(&path, &features)?;
            Some(path)
        } else {
            None
        };

        let [(_, text_count), (_, image_count), (_, table_count)] = kind_counts(&features);
        log::info!(
            "Wrote {} rows ({} text, {} image, {} table) to {}",
            features.len(),
            text_count,
            image_count,
            table_count,
            features_path.display()
        );

        Ok(PipelineOutput {
            elements,
            features,
            metadata,
            features_path,
            csv_path,
        })
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Merged elements in reading order
    pub elements: Vec<LayoutElement>,
    /// One feature row per element, same order
    pub features: Vec<FeatureRow>,
    /// Document metadata
    pub metadata: Metadata,
    /// Path of the written feature table
    pub features_path: PathBuf,
    /// Path of the CSV copy, if written
    pub csv_path: Option<PathBuf>,
}

impl PipelineOutput {
    /// Number of elements of one kind.
    pub fn count(&self, kind: ElementKind) -> usize {
        self.elements.iter().filter(|e| e.kind() == kind).count()
    }
}
