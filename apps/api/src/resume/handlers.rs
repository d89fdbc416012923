//! Axum route handlers for résumé text extraction.

use axum::{
    extract::{multipart::Field, Multipart},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::resume::extract::{extract_text, DocumentFormat, ExtractError, ResumeFile};

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub format: DocumentFormat,
    pub text: String,
    pub char_count: usize,
}

/// Buffers a multipart file field together with its declared name and type.
pub async fn read_file_field(field: Field<'_>) -> Result<ResumeFile, AppError> {
    let file_name = field.file_name().map(String::from);
    let content_type = field.content_type().map(String::from);
    let bytes = field.bytes().await?;

    Ok(ResumeFile {
        file_name,
        content_type,
        bytes,
    })
}

/// Runs extraction on the blocking pool. The outer error is a join failure;
/// the inner one is the extraction result the caller decides how to surface.
pub async fn extract_on_blocking_pool(
    file: ResumeFile,
) -> Result<Result<(DocumentFormat, String), ExtractError>, AppError> {
    let size = file.bytes.len();
    let outcome = tokio::task::spawn_blocking(move || extract_text(&file))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("extraction task failed: {e}")))?;

    if let Ok((format, text)) = &outcome {
        info!(
            "Extracted {} chars from {size}-byte {format:?} résumé",
            text.chars().count()
        );
    }
    Ok(outcome)
}

/// POST /api/v1/resume/extract
///
/// Accepts a multipart `file` field (PDF, DOCX or TXT) and returns its plain text.
pub async fn handle_extract(mut multipart: Multipart) -> Result<Json<ExtractResponse>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let file = read_file_field(field).await?;
        let (format, text) = extract_on_blocking_pool(file).await??;

        return Ok(Json(ExtractResponse {
            format,
            char_count: text.chars().count(),
            text,
        }));
    }

    Err(AppError::Validation(
        "multipart field 'file' is required".to_string(),
    ))
}
