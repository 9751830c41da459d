use thiserror::Error;

/// Unified error type for pdf-assembler-core
///
/// Variants fall into a few groups:
/// - user input (empty collection, rejected batch, bad index, busy assembler)
/// - per-file processing (malformed PDF, undecodable image, unreadable text)
/// - whole-run failure (nothing contributed a page)
/// - office conversion (bad extension, converter failures)
/// - configuration and general I/O
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Input Errors
    // ==========================================================================
    /// Assembly was requested on an empty collection
    #[error("no files to assemble")]
    NoFiles,

    /// An incoming batch contained unsupported files and was discarded
    #[error("unsupported file type(s): {}", .rejected.join(", "))]
    UnsupportedBatch { rejected: Vec<String> },

    /// Collection index out of range
    #[error("invalid file index {index} (collection has {len} files)")]
    InvalidIndex { index: usize, len: usize },

    /// Another assembly run is already in progress on this assembler
    #[error("an assembly run is already in progress")]
    AlreadyProcessing,

    // ==========================================================================
    // Per-file Errors
    // ==========================================================================
    /// Failed to load or parse a source PDF
    #[error("failed to load PDF: {0}")]
    PdfLoad(String),

    /// Failed to decode an image
    #[error("failed to decode image: {0}")]
    ImageDecode(String),

    /// Image media type that cannot be embedded
    #[error("unsupported image type: {0}")]
    UnsupportedImage(String),

    /// Text file is not valid UTF-8
    #[error("failed to read text: {0}")]
    TextDecode(String),

    /// Character that the standard PDF font encoding cannot represent
    #[error("cannot encode character {0:?} with WinAnsiEncoding")]
    TextEncoding(char),

    // ==========================================================================
    // Run Errors
    // ==========================================================================
    /// No file in the run contributed a page
    #[error("no valid content to convert")]
    NoValidContent,

    // ==========================================================================
    // Document Backend Errors
    // ==========================================================================
    /// Error from the lopdf library
    #[error("lopdf error: {0}")]
    Lopdf(String),

    /// Failed to serialize the output PDF
    #[error("failed to save PDF: {0}")]
    PdfSave(String),

    // ==========================================================================
    // Conversion Errors
    // ==========================================================================
    /// File extension not in the office allow-list
    #[error("unsupported office file type: {0}")]
    UnsupportedOfficeFormat(String),

    /// Converter binary could not be started
    #[error("office converter unavailable: {0}")]
    ConverterUnavailable(String),

    /// Converter ran but did not produce a PDF
    #[error("office conversion failed: {0}")]
    ConversionFailed(String),

    /// Converter did not finish in time
    #[error("office conversion timed out after {0} seconds")]
    ConversionTimeout(u64),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
