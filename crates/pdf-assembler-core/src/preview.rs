//! Display projection of a file collection.

use serde::Serialize;

use crate::input::{Category, FileCollection, InputFile};

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Icon shown next to a file in the list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileIcon {
    Pdf,
    Image,
    Text,
}

impl FileIcon {
    /// Icon for a file's declared media type
    pub fn for_file(file: &InputFile) -> Self {
        match file.category() {
            Some(Category::Pdf) => Self::Pdf,
            Some(Category::Image(_)) => Self::Image,
            Some(Category::Text) | None => Self::Text,
        }
    }

    /// Icon font class
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Pdf => "fa-file-pdf",
            Self::Image => "fa-file-image",
            Self::Text => "fa-file-alt",
        }
    }
}

/// One line of the file list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewEntry {
    /// Position in the collection (0-based)
    pub index: usize,
    pub icon: FileIcon,
    pub name: String,
    /// Human-readable size
    pub size: String,
}

/// Human-readable size: `0 Bytes`, `1.00 KB`, `1.50 MB`, ...
#[allow(clippy::cast_precision_loss)]
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{value:.2} {}", SIZE_UNITS[unit])
}

/// Project the collection into display entries, in collection order.
pub fn render_preview(collection: &FileCollection) -> Vec<PreviewEntry> {
    collection
        .iter()
        .enumerate()
        .map(|(index, file)| PreviewEntry {
            index,
            icon: FileIcon::for_file(file),
            name: file.name().to_string(),
            size: format_file_size(file.size()),
        })
        .collect()
}
