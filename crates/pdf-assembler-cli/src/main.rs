//! PDF Assembler CLI - Command line tool for merging PDFs, images and text into one PDF.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf_assembler_core::{
    render_preview, validate_office_extension, AppConfig, Assembler, FileCollection, InputFile,
    OfficeConverter, OutputArtifact, PreviewEntry, SofficeConverter, TargetFormat, TextOverflow,
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "pdf-assemble")]
#[command(author, version, about = "Merge PDFs, images and text files into one PDF", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to the LibreOffice binary used for office conversion
    #[arg(long, global = true, env = "SOFFICE_PATH")]
    soffice: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble the given files, in order, into one PDF
    Assemble {
        /// Input files (PDF, JPEG, PNG, plain text)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output file name (default: converted.pdf)
        #[arg(short, long)]
        output: Option<String>,

        /// Directory to write the output into
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Remove the file at this 1-based position before assembling (repeatable)
        #[arg(long = "remove", value_name = "N")]
        remove: Vec<usize>,

        /// Flow long text files onto as many pages as needed
        #[arg(long)]
        paginate_text: bool,
    },

    /// List the files as they would be assembled
    Preview {
        /// Input files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert an office document (.doc, .docx, .xls, .xlsx, .ppt, .pptx) to PDF
    Convert {
        /// Office document
        input: PathBuf,

        /// Output PDF file (default: input with a .pdf extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Read every path and add them to a fresh collection as one batch.
async fn load_collection(paths: &[PathBuf]) -> Result<FileCollection> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = InputFile::from_path(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        files.push(file);
    }

    let mut collection = FileCollection::new();
    collection.add_batch(files).context("Batch rejected")?;
    Ok(collection)
}

/// Remove entries by 1-based position, one after another.
///
/// Each position refers to the listing as it stands after the previous removal.
fn apply_removals(collection: &mut FileCollection, positions: &[usize]) -> Result<()> {
    for &position in positions {
        let index = position
            .checked_sub(1)
            .context("File positions start at 1")?;
        let removed = collection
            .remove_at(index)
            .with_context(|| format!("Cannot remove file {position}"))?;
        info!("Removed {}", removed.name());
    }
    Ok(())
}

fn format_preview_line(entry: &PreviewEntry) -> String {
    format!(
        "{:>3}. [{}] {} ({})",
        entry.index + 1,
        entry.icon.tag(),
        entry.name,
        entry.size
    )
}

fn default_convert_output(input: &Path) -> PathBuf {
    input.with_extension("pdf")
}

fn print_preview(collection: &FileCollection, json: bool) -> Result<()> {
    let entries = render_preview(collection);

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        if json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        } else {
            for entry in &entries {
                println!("{}", format_preview_line(entry));
            }
        }
    }
    Ok(())
}

async fn run_assemble(
    config: AppConfig,
    files: &[PathBuf],
    output: Option<&str>,
    dir: &Path,
    remove: &[usize],
) -> Result<()> {
    let mut collection = load_collection(files).await?;
    apply_removals(&mut collection, remove)?;
    print_preview(&collection, false)?;

    #[allow(clippy::cast_possible_truncation)]
    let pb = ProgressBar::new(collection.len() as u64);
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let assembler = Assembler::new(config.text.clone());
    let progress_bar = pb.clone();
    let document = tokio::task::spawn_blocking(move || {
        assembler.assemble_with_progress(collection.files(), &move |done, _total| {
            progress_bar.set_position(done as u64);
        })
    })
    .await
    .context("Assembly task panicked")?
    .context("Failed to assemble PDF")?;

    pb.finish_with_message("done");

    for outcome in document.skipped() {
        pb.println(format!(
            "Skipped {}: {}",
            outcome.name,
            outcome.error.as_deref().unwrap_or("unknown error")
        ));
    }

    let artifact = OutputArtifact::with_default(output, &config.output_name, document.bytes);
    let path = artifact
        .write_to_dir(dir)
        .await
        .with_context(|| format!("Failed to write output into {}", dir.display()))?;

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        println!(
            "Assembled {} pages into: {}",
            document.page_count,
            path.display()
        );
    }

    Ok(())
}

async fn run_convert(config: &AppConfig, input: &Path, output: Option<PathBuf>) -> Result<()> {
    let file_name = input
        .file_name()
        .and_then(|s| s.to_str())
        .context("Input path has no file name")?;
    let format = validate_office_extension(file_name)?;

    let bytes = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let converter = SofficeConverter::from_config(&config.converter);
    info!("Converting {} with {}", input.display(), converter.name());
    let pdf = converter
        .convert(&bytes, format, TargetFormat::Pdf)
        .await
        .context("Conversion failed")?;

    let output_path = output.unwrap_or_else(|| default_convert_output(input));
    tokio::fs::write(&output_path, pdf)
        .await
        .with_context(|| format!("Failed to write output: {}", output_path.display()))?;

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        println!("Converted PDF saved to: {}", output_path.display());
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Load or create config
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    // Override config with CLI arguments
    if let Some(soffice) = args.soffice {
        config.converter.binary = soffice;
    }

    match args.command {
        Command::Assemble {
            files,
            output,
            dir,
            remove,
            paginate_text,
        } => {
            if paginate_text {
                config.text.overflow = TextOverflow::Paginate;
            }
            run_assemble(config, &files, output.as_deref(), &dir, &remove).await
        }
        Command::Preview { files, json } => {
            let collection = load_collection(&files).await?;
            print_preview(&collection, json)
        }
        Command::Convert { input, output } => run_convert(&config, &input, output).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn collection_of(names: &[&str]) -> FileCollection {
        let mut collection = FileCollection::new();
        collection
            .add_batch(
                names
                    .iter()
                    .map(|n| InputFile::new(*n, "text/plain", n.as_bytes().to_vec())),
            )
            .unwrap();
        collection
    }

    fn names(collection: &FileCollection) -> Vec<&str> {
        collection.iter().map(InputFile::name).collect()
    }

    #[test]
    fn test_removals_apply_in_sequence() {
        let mut collection = collection_of(&["a", "b", "c", "d"]);
        // Removing 2 shifts "c" into position 2.
        apply_removals(&mut collection, &[2, 2]).unwrap();
        assert_eq!(names(&collection), ["a", "d"]);
    }

    #[test]
    fn test_removal_out_of_range() {
        let mut collection = collection_of(&["a"]);
        assert!(apply_removals(&mut collection, &[0]).is_err());
        assert!(apply_removals(&mut collection, &[2]).is_err());
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_preview_line() {
        let collection = collection_of(&["notes.txt"]);
        let entries = render_preview(&collection);
        assert_eq!(
            format_preview_line(&entries[0]),
            "  1. [fa-file-alt] notes.txt (9.00 Bytes)"
        );
    }

    #[test]
    fn test_convert_output_path() {
        assert_eq!(
            default_convert_output(Path::new("/tmp/Deck.PPTX")),
            PathBuf::from("/tmp/Deck.pdf")
        );
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "pdf-assemble",
            "-vv",
            "assemble",
            "a.pdf",
            "b.png",
            "--remove",
            "1",
            "-o",
            "out.pdf",
        ])
        .unwrap();
        assert_eq!(args.verbose, 2);
        match args.command {
            Command::Assemble {
                files,
                output,
                remove,
                ..
            } => {
                assert_eq!(files.len(), 2);
                assert_eq!(output.as_deref(), Some("out.pdf"));
                assert_eq!(remove, [1]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
