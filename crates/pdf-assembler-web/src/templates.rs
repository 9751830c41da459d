//! Askama templates.

use askama::Template;
use askama_web::WebTemplate;
use pdf_assembler_core::OFFICE_EXTENSIONS;

/// Landing page with the assemble and convert forms.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    /// Placeholder for the output name field
    pub default_output_name: String,
    /// `accept` attribute for the office upload field
    pub office_accept: String,
}

impl IndexTemplate {
    pub fn new(default_output_name: &str) -> Self {
        Self {
            default_output_name: default_output_name.to_string(),
            office_accept: OFFICE_EXTENSIONS.join(","),
        }
    }
}
