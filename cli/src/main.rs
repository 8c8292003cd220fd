//! pdfstruct CLI - PDF layout feature extraction tool

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfstruct::classify::FeatureMatrix;
use pdfstruct::features::kind_counts;
use pdfstruct::render::read_features_json;
use pdfstruct::{
    label_file, read_metadata, ExtractOptions, JsonFormat, PageSelection, Pipeline,
    PipelineOutput, RuleLabeler, TableFlavor,
};

#[derive(Parser)]
#[command(name = "pdfstruct")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Extract layout elements and features from PDF documents", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text lines, images and tables into a feature table
    Extract {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory (default: <FILE stem>_output)
        #[arg(short, long, value_name = "DIR", env = "PDFSTRUCT_OUTPUT")]
        output: Option<PathBuf>,

        /// Table detection flavor
        #[arg(long, value_enum, default_value = "stream", env = "PDFSTRUCT_FLAVOR")]
        flavor: Flavor,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Auto-label rows with the heuristic rules
        #[arg(long)]
        label: bool,

        /// Also write features.csv
        #[arg(long)]
        csv: bool,

        /// Write compact JSON
        #[arg(long)]
        compact: bool,

        /// Skip pages and elements that fail to extract
        #[arg(long)]
        lenient: bool,

        /// Collect text pages in parallel
        #[arg(long)]
        parallel: bool,

        /// Do not extract images
        #[arg(long)]
        no_images: bool,

        /// Do not detect tables
        #[arg(long)]
        no_tables: bool,
    },

    /// Auto-label a previously extracted feature table
    Label {
        /// Input feature table (JSON)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file (default: <INPUT stem>_labeled.json)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Export the classifier input matrix of a feature table as CSV
    Matrix {
        /// Input feature table (JSON)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file (default: <INPUT stem>_matrix.csv)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Min-max scale every column to [0, 1]
        #[arg(long)]
        scale: bool,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print metadata as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Flavor {
    /// Ruling-line based detection
    Lattice,
    /// Text-alignment based detection
    Stream,
}

impl From<Flavor> for TableFlavor {
    fn from(flavor: Flavor) -> Self {
        match flavor {
            Flavor::Lattice => TableFlavor::Lattice,
            Flavor::Stream => TableFlavor::Stream,
        }
    }
}

/// Flags of the `extract` command.
struct ExtractArgs {
    flavor: Flavor,
    pages: Option<String>,
    label: bool,
    csv: bool,
    compact: bool,
    lenient: bool,
    parallel: bool,
    images: bool,
    tables: bool,
}

impl Default for ExtractArgs {
    fn default() -> Self {
        Self {
            flavor: Flavor::Stream,
            pages: None,
            label: false,
            csv: false,
            compact: false,
            lenient: false,
            parallel: false,
            images: true,
            tables: true,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Extract {
            input,
            output,
            flavor,
            pages,
            label,
            csv,
            compact,
            lenient,
            parallel,
            no_images,
            no_tables,
        }) => cmd_extract(
            &input,
            output.as_deref(),
            ExtractArgs {
                flavor,
                pages,
                label,
                csv,
                compact,
                lenient,
                parallel,
                images: !no_images,
                tables: !no_tables,
            },
        ),
        Some(Commands::Label { input, output }) => cmd_label(&input, output.as_deref()),
        Some(Commands::Matrix {
            input,
            output,
            scale,
        }) => cmd_matrix(&input, output.as_deref(), scale),
        Some(Commands::Info { input, json }) => cmd_info(&input, json),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: extract if input is provided
            if let Some(input) = cli.input {
                cmd_extract(&input, cli.output.as_deref(), ExtractArgs::default())
            } else {
                println!("{}", "Usage: pdfstruct <FILE> [OUTPUT]".yellow());
                println!("       pdfstruct --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn default_output_dir(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    PathBuf::from(format!("{}_output", stem))
}

fn sibling_path(input: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    input.with_file_name(format!("{}_{}.{}", stem, suffix, extension))
}

fn cmd_extract(
    input: &Path,
    output: Option<&Path>,
    args: ExtractArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| default_output_dir(input));

    let page_selection = if let Some(p) = args.pages.as_deref() {
        PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e))?
    } else {
        PageSelection::All
    };

    let mut options = ExtractOptions::new()
        .with_pages(page_selection)
        .with_table_flavor(args.flavor.into())
        .with_images(args.images)
        .with_tables(args.tables)
        .with_parallel(args.parallel);
    if args.lenient {
        options = options.lenient();
    }

    let format = if args.compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let pipeline = Pipeline::new(&output_dir)
        .with_options(options)
        .with_labels(args.label)
        .with_csv(args.csv)
        .with_json_format(format);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Extracting {}...", input.display()));

    let result = pipeline.run(input);
    match &result {
        Ok(_) => pb.finish_with_message("Done!"),
        Err(_) => pb.abandon(),
    }
    let out = result?;

    print_summary(&out, args.label);

    println!("\n{}", "Output files:".green().bold());
    println!("  {} {}", "├─".dimmed(), out.features_path.display());
    if let Some(ref csv_path) = out.csv_path {
        println!("  {} {}", "├─".dimmed(), csv_path.display());
    }
    println!("  {} {}", "├─".dimmed(), output_dir.join("images").display());
    println!("  {} {}", "└─".dimmed(), output_dir.join("tables").display());

    Ok(())
}

fn print_summary(out: &PipelineOutput, labeled: bool) {
    println!();
    println!("{}", "Elements".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for (kind, count) in kind_counts(&out.features) {
        println!("{}: {}", kind.to_string().bold(), count);
    }

    if labeled {
        println!();
        println!("{}", "Labels".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        for label in pdfstruct::Label::ALL {
            let count = out
                .features
                .iter()
                .filter(|r| r.label == Some(label))
                .count();
            if count > 0 {
                println!("{}: {}", label.as_str().bold(), count);
            }
        }
    }
}

fn cmd_label(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let output = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| sibling_path(input, "labeled", "json"));

    let count = label_file(input, &output, &RuleLabeler::new())?;

    println!("{} {} rows", "Labeled".green(), count);
    println!("{} {}", "Saved to".green(), output.display());
    Ok(())
}

fn cmd_matrix(
    input: &Path,
    output: Option<&Path>,
    scale: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| sibling_path(input, "matrix", "csv"));

    let rows = read_features_json(input)?;
    let mut matrix = FeatureMatrix::from_rows(&rows);
    if scale {
        matrix = matrix.min_max_scaled();
    }
    matrix.write_csv(&output)?;

    println!("{} {} rows", "Exported".green(), matrix.len());
    println!("{} {}", "Saved to".green(), output.display());
    Ok(())
}

fn cmd_info(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let metadata = read_metadata(input)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
        return Ok(());
    }

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), metadata.pdf_version);
    println!("{}: {}", "Pages".bold(), metadata.page_count);
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    println!("{}: {}", "Title".bold(), metadata.title_or(stem));
    if let Some(ref author) = metadata.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref subject) = metadata.subject {
        println!("{}: {}", "Subject".bold(), subject);
    }
    if let Some(ref creator) = metadata.creator {
        println!("{}: {}", "Creator".bold(), creator);
    }
    if let Some(ref producer) = metadata.producer {
        println!("{}: {}", "Producer".bold(), producer);
    }
    if let Some(ref created) = metadata.created {
        println!("{}: {}", "Created".bold(), created);
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfstruct".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF layout feature extraction tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/pdfstruct".dimmed());
    println!("License: MIT");
}
