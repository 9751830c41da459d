//! Assemble route - merge uploaded files into one PDF download.

use axum::{extract::State, http::StatusCode, response::Response};
use axum_extra::extract::{multipart::MultipartRejection, Multipart};
use bytes::Bytes;
use pdf_assembler_core::{
    media_type_for_path, Assembler, Error, FileCollection, InputFile, OutputArtifact,
};
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::helpers::{pdf_response, ResultExt, RouteResult};
use crate::state::AppState;

/// Generic media type browsers send when they cannot tell
const OCTET_STREAM: &str = "application/octet-stream";

/// Assemble the uploaded `files` (in upload order) into one PDF.
///
/// The optional `output_name` field names the download; a blank name falls
/// back to the configured default.
pub async fn assemble(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> RouteResult<Response> {
    let request_id = Uuid::new_v4();
    let multipart = multipart.map_err(|e| {
        warn!(%request_id, "Rejected upload: {}", e);
        (StatusCode::BAD_REQUEST, "No files uploaded".to_string())
    })?;
    assemble_upload(state, multipart)
        .instrument(info_span!("assemble", %request_id))
        .await
}

/// Media type for an uploaded part, preferring what the client declared.
fn upload_media_type(declared: Option<&str>, file_name: &str) -> String {
    match declared {
        Some(media_type) if !media_type.is_empty() && media_type != OCTET_STREAM => {
            media_type.to_string()
        }
        _ => media_type_for_path(file_name),
    }
}

async fn assemble_upload(state: Arc<AppState>, mut multipart: Multipart) -> RouteResult<Response> {
    let mut uploads = Vec::new();
    let mut output_name = None;

    while let Some(field) = multipart.next_field().await.or_bad_request()? {
        match field.name() {
            Some("files") => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let media_type = upload_media_type(field.content_type(), &name);
                let data: Bytes = field.bytes().await.or_bad_request()?;
                // Empty file inputs still submit one nameless, empty part.
                if data.is_empty() && name.is_empty() {
                    continue;
                }
                uploads.push(InputFile::new(name, media_type, data));
            }
            Some("output_name") => {
                output_name = Some(field.text().await.or_bad_request()?);
            }
            _ => {}
        }
    }

    if uploads.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No files uploaded".to_string()));
    }

    let mut collection = FileCollection::new();
    collection.add_batch(uploads).map_err(|e| {
        warn!("Rejected batch: {}", e);
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;
    info!("Received {} file(s)", collection.len());

    let layout = state.config.text.clone();
    let document = tokio::task::spawn_blocking(move || {
        Assembler::new(layout).assemble(collection.files())
    })
    .await
    .or_internal_error()?
    .map_err(|e| match e {
        Error::NoValidContent => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "No valid content to convert".to_string(),
        ),
        Error::NoFiles => (StatusCode::BAD_REQUEST, "No files uploaded".to_string()),
        other => {
            error!("Assembly failed: {}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Assembly failed".to_string(),
            )
        }
    })?;

    for outcome in document.skipped() {
        warn!(
            "Skipped {}: {}",
            outcome.name,
            outcome.error.as_deref().unwrap_or_default()
        );
    }

    let artifact = OutputArtifact::with_default(
        output_name.as_deref(),
        &state.config.output_name,
        document.bytes,
    );
    info!(
        "Sending {} ({} pages)",
        artifact.file_name, document.page_count
    );
    let disposition = artifact.content_disposition();
    pdf_response(artifact.bytes, Some(disposition))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_media_type() {
        assert_eq!(upload_media_type(Some("image/png"), "a.bin"), "image/png");
        assert_eq!(upload_media_type(Some(OCTET_STREAM), "notes.txt"), "text/plain");
        assert_eq!(upload_media_type(None, "scan.pdf"), "application/pdf");
        assert_eq!(upload_media_type(Some(""), "unknown"), OCTET_STREAM);
    }
}
