//! DOCX export endpoint

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::export::{self, ExportKind, ExportedDocument};
use crate::server::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub kind: ExportKind,
}

/// GET /api/quiz/:id/export - Download the quiz or its answer key
pub async fn export_quiz(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse> {
    let quiz = state
        .db()
        .get_quiz(&id)?
        .ok_or(Error::QuizNotFound(id))?;

    let document = export::export_quiz(&quiz, query.kind)?;

    tracing::info!(
        "Exported quiz {} as {} ({} bytes)",
        quiz.id,
        document.filename,
        document.bytes.len()
    );

    let disposition = format!("attachment; filename=\"{}\"", document.filename);
    Ok((
        [
            (header::CONTENT_TYPE, ExportedDocument::CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    ))
}
