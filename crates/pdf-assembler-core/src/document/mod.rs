//! Output document construction.
//!
//! The assembler talks to a [`DocumentBuilder`]; [`LopdfBuilder`] is the
//! implementation backed by `lopdf`.

mod builder;
mod image;
pub mod text;

pub use builder::LopdfBuilder;
pub use image::{ColorSpace, EmbeddedImage, ImageEncoding};

use crate::config::TextLayoutConfig;
use crate::error::Result;

/// Placement rectangle in PDF units (origin bottom-left)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// Text drawing parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Left edge of the text block
    pub x: f32,
    /// Baseline of the first line
    pub y: f32,
    pub font_size: f32,
    pub line_height: f32,
    pub max_width: f32,
}

impl From<&TextLayoutConfig> for TextStyle {
    fn from(layout: &TextLayoutConfig) -> Self {
        Self {
            x: layout.x,
            y: layout.y,
            font_size: layout.font_size,
            line_height: layout.line_height,
            max_width: layout.max_width,
        }
    }
}

/// Capability for building one output PDF page by page.
pub trait DocumentBuilder {
    /// Handle to a page created by [`DocumentBuilder::add_page`]
    type Page: Copy;

    /// Start an empty document
    fn new_document() -> Self
    where
        Self: Sized;

    /// Append every page of `source` (a complete PDF) in its original order.
    ///
    /// Returns the number of pages appended. Nothing is added on error.
    fn append_all_pages(&mut self, source: &[u8]) -> Result<usize>;

    /// Add an empty page of the given size
    fn add_page(&mut self, width: f32, height: f32) -> Self::Page;

    /// Draw an image into `rect` on `page`
    fn draw_image(&mut self, page: Self::Page, image: EmbeddedImage, rect: Rect) -> Result<()>;

    /// Draw wrapped text on `page`
    fn draw_text(&mut self, page: Self::Page, text: &str, style: &TextStyle) -> Result<()>;

    /// Remove a page added by this builder
    fn discard_page(&mut self, page: Self::Page);

    /// Pages in the document so far
    fn page_count(&self) -> usize;

    /// Finish the document and return the PDF bytes
    fn serialize(self) -> Result<Vec<u8>>
    where
        Self: Sized;
}
