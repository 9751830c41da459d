use std::sync::Arc;

use pdf_assembler_core::{create_converter, AppConfig, OfficeConverter};

/// Global application state
///
/// Requests share nothing mutable: each assembly builds its own collection and
/// assembler, and each conversion gets its own scratch directory.
pub struct AppState {
    pub config: AppConfig,
    pub converter: Arc<dyn OfficeConverter>,
}

impl AppState {
    /// Create state with the converter described by `config`
    pub fn new(config: AppConfig) -> Self {
        let converter = create_converter(&config.converter);
        Self::with_converter(config, converter)
    }

    /// Create state with a custom converter
    pub fn with_converter(config: AppConfig, converter: Arc<dyn OfficeConverter>) -> Self {
        Self { config, converter }
    }

    /// Upload limit in bytes
    pub const fn body_limit(&self) -> usize {
        self.config.server.max_upload_mb.saturating_mul(1024 * 1024)
    }
}
