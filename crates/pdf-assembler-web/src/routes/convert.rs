//! Office conversion route.

use axum::{extract::State, http::StatusCode, response::Response};
use axum_extra::extract::{multipart::MultipartRejection, Multipart};
use pdf_assembler_core::{validate_office_extension, TargetFormat};
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::helpers::{pdf_response, OptionExt, ResultExt, RouteResult};
use crate::state::AppState;

/// Convert one uploaded office document (multipart field `file`) to PDF.
///
/// Converter failures are logged and reported as a bare 500; their details
/// never reach the client.
pub async fn convert(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> RouteResult<Response> {
    let request_id = Uuid::new_v4();
    // A request that is not multipart carries no file either
    let multipart = multipart.map_err(|e| {
        info!(%request_id, "Rejected upload: {}", e);
        (StatusCode::BAD_REQUEST, "No file uploaded".to_string())
    })?;
    convert_upload(state, multipart)
        .instrument(info_span!("convert", %request_id))
        .await
}

async fn convert_upload(state: Arc<AppState>, mut multipart: Multipart) -> RouteResult<Response> {
    let field = loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => break Some(field),
            Ok(Some(_)) => {}
            _ => break None,
        }
    }
    .or_bad_request("No file uploaded")?;

    let filename = field.file_name().unwrap_or_default().to_string();
    let format = validate_office_extension(&filename).map_err(|e| {
        info!("Rejected upload: {}", e);
        (StatusCode::BAD_REQUEST, "Unsupported file type".to_string())
    })?;

    let data = field.bytes().await.or_bad_request()?;
    info!("Converting {} ({} bytes)", filename, data.len());

    let pdf = state
        .converter
        .convert(&data, format, TargetFormat::Pdf)
        .await
        .map_err(|e| {
            error!("Conversion of {} with {} failed: {}", filename, state.converter.name(), e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Conversion failed".to_string(),
            )
        })?;

    pdf_response(pdf, None)
}
