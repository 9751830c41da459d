//! Output artifact naming and emission.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::DEFAULT_OUTPUT_NAME;
use crate::error::Result;

/// Media type of every emitted artifact
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// The user-supplied output name, or `default` when blank.
pub fn resolve_output_name(requested: Option<&str>, default: &str) -> String {
    requested
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// A finished PDF ready to be offered for download or written to disk
#[derive(Clone)]
pub struct OutputArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl OutputArtifact {
    /// Create an artifact named after `requested`, falling back to `converted.pdf`.
    pub fn new(requested: Option<&str>, bytes: Vec<u8>) -> Self {
        Self::with_default(requested, DEFAULT_OUTPUT_NAME, bytes)
    }

    pub fn with_default(requested: Option<&str>, default: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: resolve_output_name(requested, default),
            bytes,
        }
    }

    pub const fn media_type(&self) -> &'static str {
        PDF_MEDIA_TYPE
    }

    /// `Content-Disposition` value that triggers a download under the file name.
    pub fn content_disposition(&self) -> String {
        let escaped: String = self
            .file_name
            .chars()
            .filter(|c| !c.is_control())
            .map(|c| if c == '"' { '\'' } else { c })
            .collect();
        format!("attachment; filename=\"{escaped}\"")
    }

    /// Write into `dir`, using only the final path component of the file name.
    pub async fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let file_name = Path::new(&self.file_name)
            .file_name()
            .map_or_else(|| PathBuf::from(DEFAULT_OUTPUT_NAME), PathBuf::from);
        let path = dir.as_ref().join(file_name);

        tokio::fs::write(&path, &self.bytes).await?;
        info!("Wrote {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

impl std::fmt::Debug for OutputArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputArtifact")
            .field("file_name", &self.file_name)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}
