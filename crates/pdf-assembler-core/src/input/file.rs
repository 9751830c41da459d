use std::path::Path;

use bytes::Bytes;

use super::classify::{classify, media_type_for_path};
use crate::error::Result;

/// Image formats distinguished by the assembler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Jpeg,
    Png,
    /// Accepted as `image/*` but not embeddable
    Other,
}

/// Accepted input categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Pdf,
    Image(ImageKind),
    Text,
}

/// A named byte blob with a declared media type.
///
/// Cloning is O(1): the content is reference-counted.
#[derive(Clone, PartialEq, Eq)]
pub struct InputFile {
    name: String,
    media_type: String,
    bytes: Bytes,
}

impl InputFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, deriving the media type from its extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

        Ok(Self::new(name, media_type_for_path(path), bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Category of this file, or `None` if its media type is not accepted
    pub fn category(&self) -> Option<Category> {
        classify(&self.media_type)
    }
}

impl std::fmt::Debug for InputFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputFile")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_size_and_category() {
        let file = InputFile::new("notes.txt", "text/plain", b"hello".to_vec());
        assert_eq!(file.size(), 5);
        assert_eq!(file.category(), Some(Category::Text));
    }

    #[tokio::test]
    async fn test_from_path_uses_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.PNG");
        std::fs::write(&path, b"not really a png").unwrap();

        let file = InputFile::from_path(&path).await.unwrap();
        assert_eq!(file.name(), "scan.PNG");
        assert_eq!(file.media_type(), "image/png");
        assert_eq!(file.category(), Some(Category::Image(ImageKind::Png)));
    }

    #[tokio::test]
    async fn test_from_path_missing_file() {
        let result = InputFile::from_path("/definitely/not/here.pdf").await;
        assert!(matches!(result, Err(crate::Error::Io(_))));
    }
}
