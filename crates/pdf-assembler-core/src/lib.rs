//! PDF Assembler Core Library
//!
//! This library provides the core functionality for merging mixed inputs into
//! a single PDF:
//! - Input classification and the ordered file collection
//! - Preview listing with human-readable sizes
//! - Sequential document assembly (PDF pages, images, plain text)
//! - Office document conversion through a headless converter

pub mod assembler;
pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod input;
pub mod output;
pub mod preview;
pub mod util;

pub use assembler::{AssembledDocument, Assembler, FileOutcome, ProcessingState, Progress};
pub use config::{
    AppConfig, ConverterConfig, ServerConfig, TextLayoutConfig, TextOverflow,
    DEFAULT_OUTPUT_NAME, DEFAULT_PORT,
};
pub use convert::{
    create_converter, validate_office_extension, OfficeConverter, OfficeFormat, SofficeConverter,
    TargetFormat, OFFICE_EXTENSIONS,
};
pub use document::{DocumentBuilder, LopdfBuilder};
pub use error::{Error, Result};
pub use input::{classify, media_type_for_path, Category, FileCollection, ImageKind, InputFile};
pub use output::{resolve_output_name, OutputArtifact, PDF_MEDIA_TYPE};
pub use preview::{format_file_size, render_preview, FileIcon, PreviewEntry};

use tracing::debug;

/// Assemble `collection` and name the result.
///
/// This is the "Convert to PDF" action: one assembly run followed by output
/// naming. `output_name` falls back to `converted.pdf` when blank.
pub fn assemble_collection(
    assembler: &Assembler,
    collection: &FileCollection,
    output_name: Option<&str>,
    progress: Option<Progress<'_>>,
) -> Result<(OutputArtifact, Vec<FileOutcome>)> {
    let document = assembler.assemble_with::<LopdfBuilder>(collection.files(), progress)?;
    let artifact = OutputArtifact::new(output_name, document.bytes);

    debug!(
        "Assembled {} ({} pages from {} files)",
        artifact.file_name,
        document.page_count,
        collection.len()
    );
    Ok((artifact, document.outcomes))
}
