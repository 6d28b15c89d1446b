//! File upload and text extraction endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use std::time::Instant;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::ingestion::UploadedFile;
use crate::server::state::AppState;

/// Multipart field carrying uploads
const FILES_FIELD: &str = "files";

/// Response for a batch with at least one usable extraction
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseFilesResponse {
    pub success: bool,
    pub text: String,
    pub files_processed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_files: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<String>,
}

/// POST /api/parse-files - Extract and combine the text of every uploaded file
pub async fn parse_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ParseFilesResponse>> {
    let start = Instant::now();
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        Error::bad_request(format!("Failed to read multipart field: {}", e))
    })? {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("file_{}", Uuid::new_v4()));

        let data = field.bytes().await.map_err(|e| {
            Error::bad_request(format!("Failed to read file {}: {}", filename, e))
        })?;

        tracing::info!("Received file: {} ({} bytes)", filename, data.len());
        files.push(UploadedFile::new(filename, data));
    }

    let result = state.extractor().extract_all(files).await?;

    tracing::info!(
        "Extracted text from {}/{} files in {:?}",
        result.success_count,
        result.total_files(),
        start.elapsed()
    );

    let warnings = result.warning();
    let failed_files = (!result.failures.is_empty()).then(|| result.failed_filenames());

    Ok(Json(ParseFilesResponse {
        success: true,
        text: result.combined_text,
        files_processed: result.success_count,
        failed_files,
        warnings,
    }))
}
