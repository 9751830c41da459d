//! Office document conversion.
//!
//! Only the extension allow-list lives here; the conversion itself is done by
//! an [`OfficeConverter`], normally [`SofficeConverter`].

mod soffice;

pub use soffice::SofficeConverter;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ConverterConfig;
use crate::error::{Error, Result};

/// Accepted office extensions (lowercase, with leading dot)
pub const OFFICE_EXTENSIONS: [&str; 6] = [".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx"];

/// Office formats accepted for conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OfficeFormat {
    Doc,
    Docx,
    Xls,
    Xlsx,
    Ppt,
    Pptx,
}

impl OfficeFormat {
    /// Extension without the leading dot
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Doc => "doc",
            Self::Docx => "docx",
            Self::Xls => "xls",
            Self::Xlsx => "xlsx",
            Self::Ppt => "ppt",
            Self::Pptx => "pptx",
        }
    }

    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "doc" => Some(Self::Doc),
            "docx" => Some(Self::Docx),
            "xls" => Some(Self::Xls),
            "xlsx" => Some(Self::Xlsx),
            "ppt" => Some(Self::Ppt),
            "pptx" => Some(Self::Pptx),
            _ => None,
        }
    }
}

/// Output format requested from the converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetFormat {
    #[default]
    Pdf,
}

impl TargetFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
        }
    }
}

/// Check a file name against the office allow-list (case-insensitive).
pub fn validate_office_extension(file_name: &str) -> Result<OfficeFormat> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .and_then(|ext| OfficeFormat::from_extension(&ext))
        .ok_or_else(|| Error::UnsupportedOfficeFormat(file_name.to_string()))
}

/// Capability for converting office documents
#[async_trait]
pub trait OfficeConverter: Send + Sync {
    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Convert `input` (a document of `format`) to `target`
    async fn convert(&self, input: &[u8], format: OfficeFormat, target: TargetFormat)
    -> Result<Vec<u8>>;
}

/// Create the converter described by configuration
pub fn create_converter(config: &ConverterConfig) -> Arc<dyn OfficeConverter> {
    Arc::new(SofficeConverter::from_config(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list() {
        for ext in OFFICE_EXTENSIONS {
            let name = format!("file{ext}");
            let format = validate_office_extension(&name).unwrap();
            assert_eq!(format!(".{}", format.extension()), ext);
        }
    }

    #[test]
    fn test_extension_case_insensitive() {
        assert_eq!(validate_office_extension("Budget.XLSX").unwrap(), OfficeFormat::Xlsx);
    }

    #[test]
    fn test_rejected_extensions() {
        for name in ["notes.txt", "scan.pdf", "noextension", ".docx", "archive.docx.zip"] {
            assert!(
                matches!(validate_office_extension(name), Err(Error::UnsupportedOfficeFormat(_))),
                "{name} should be rejected"
            );
        }
    }
}
