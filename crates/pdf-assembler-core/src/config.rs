use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Default name of the assembled output file
pub const DEFAULT_OUTPUT_NAME: &str = "converted.pdf";

/// Default port for the conversion server
pub const DEFAULT_PORT: u16 = 3000;

/// What to do with text that does not fit on one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextOverflow {
    /// Draw everything on a single page; lines past the bottom edge are lost
    #[default]
    SinglePage,
    /// Continue on additional pages of the same size
    Paginate,
}

/// Layout of plain-text pages (PDF units, origin bottom-left)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextLayoutConfig {
    pub page_width: f32,
    pub page_height: f32,
    /// Left edge of the text block
    pub x: f32,
    /// Baseline of the first line
    pub y: f32,
    pub font_size: f32,
    pub line_height: f32,
    /// Wrap width
    pub max_width: f32,
    /// Lowest baseline used when paginating
    pub bottom_margin: f32,
    pub overflow: TextOverflow,
}

impl Default for TextLayoutConfig {
    fn default() -> Self {
        // US Letter
        Self {
            page_width: 612.0,
            page_height: 792.0,
            x: 50.0,
            y: 750.0,
            font_size: 12.0,
            line_height: 15.0,
            max_width: 512.0,
            bottom_margin: 42.0,
            overflow: TextOverflow::SinglePage,
        }
    }
}

impl TextLayoutConfig {
    /// Number of lines that fit on one page between `y` and `bottom_margin`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn lines_per_page(&self) -> usize {
        let usable = (self.y - self.bottom_margin).max(0.0);
        // Values are validated positive, truncation is intended
        ((usable / self.line_height).floor() as usize) + 1
    }

    fn validate(&self) -> Result<()> {
        let positive = [
            ("text.page_width", self.page_width),
            ("text.page_height", self.page_height),
            ("text.font_size", self.font_size),
            ("text.line_height", self.line_height),
            ("text.max_width", self.max_width),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::ConfigInvalid {
                    field: field.to_string(),
                    reason: format!("must be a positive number, got {value}"),
                });
            }
        }
        if self.y > self.page_height {
            return Err(Error::ConfigInvalid {
                field: "text.y".to_string(),
                reason: "first baseline is above the page".to_string(),
            });
        }
        Ok(())
    }
}

/// Office converter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Path or name of the LibreOffice binary
    pub binary: PathBuf,
    /// Maximum time one conversion may take
    pub timeout_seconds: u64,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("soffice"),
            timeout_seconds: 120,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Request body limit in megabytes
    pub max_upload_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            max_upload_mb: 100,
        }
    }
}

fn default_output_name() -> String {
    DEFAULT_OUTPUT_NAME.to_string()
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// File name used when the user leaves the output name blank
    #[serde(default = "default_output_name")]
    pub output_name: String,

    /// Plain-text page layout
    #[serde(default)]
    pub text: TextLayoutConfig,

    /// Office converter
    #[serde(default)]
    pub converter: ConverterConfig,

    /// Conversion server
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_name: default_output_name(),
            text: TextLayoutConfig::default(),
            converter: ConverterConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse config: {e}")))?;
        config.text.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Load from default locations (~/.config/pdf-assembler/config.toml, ./config.toml)
    pub fn load() -> Self {
        let candidates = crate::util::config_dir()
            .map(|dir| dir.join("pdf-assembler").join("config.toml"))
            .into_iter()
            .chain(std::iter::once(PathBuf::from("config.toml")));

        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::from_file(&path) {
                Ok(config) => {
                    tracing::debug!("Loaded config from {}", path.display());
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load {}: {}", path.display(), e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }
}
