//! HTTP route handlers for the PDF assembler web application.
//!
//! `/convert` and `/api/assemble` return PDF bytes; `/` renders the upload page.

mod assemble;
mod convert;
mod pages;

pub use assemble::assemble;
pub use convert::convert;
pub use pages::index;
