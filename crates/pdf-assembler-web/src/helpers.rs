//! Helper types and traits for cleaner route handlers.
//!
//! Provides extension traits for converting `Option` and `Result` types
//! into HTTP-appropriate error responses, reducing boilerplate in routes.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use pdf_assembler_core::PDF_MEDIA_TYPE;

/// Standard result type for route handlers.
pub type RouteResult<T> = Result<T, (StatusCode, String)>;

/// Extension trait for converting `Option<T>` to `RouteResult<T>`.
pub trait OptionExt<T> {
    /// Returns the contained value or a 400 Bad Request error.
    fn or_bad_request(self, msg: &str) -> RouteResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_bad_request(self, msg: &str) -> RouteResult<T> {
        self.ok_or_else(|| (StatusCode::BAD_REQUEST, msg.to_string()))
    }
}

/// Extension trait for converting `Result<T, E>` to `RouteResult<T>`.
pub trait ResultExt<T, E: std::fmt::Display> {
    /// Converts the error to 500 Internal Server Error.
    fn or_internal_error(self) -> RouteResult<T>;

    /// Converts the error to 400 Bad Request.
    fn or_bad_request(self) -> RouteResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T, E> for Result<T, E> {
    fn or_internal_error(self) -> RouteResult<T> {
        self.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
    }

    fn or_bad_request(self) -> RouteResult<T> {
        self.map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
    }
}

/// `200 OK` response carrying PDF bytes, optionally as a download.
pub fn pdf_response(bytes: Vec<u8>, content_disposition: Option<String>) -> RouteResult<Response> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, PDF_MEDIA_TYPE);
    if let Some(disposition) = content_disposition {
        builder = builder.header(header::CONTENT_DISPOSITION, disposition);
    }
    builder.body(Body::from(bytes)).or_internal_error()
}
