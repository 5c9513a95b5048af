use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::resume::{self, AnalyzeOutcome, PdfInfo};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeTextRequest {
    pub text: String,
    pub kind: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub session_id: String,
    pub summary: String,
    #[serde(rename = "extractedLength")]
    pub extracted_length: usize,
    pub engine: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    #[serde(rename = "pdfInfo", skip_serializing_if = "Option::is_none")]
    pub pdf_info: Option<PdfInfo>,
}

impl From<AnalyzeOutcome> for AnalyzeResponse {
    fn from(outcome: AnalyzeOutcome) -> Self {
        Self {
            session_id: outcome.session_id,
            summary: outcome.summary,
            extracted_length: outcome.extracted_length,
            engine: outcome.engine,
            model: outcome.model,
            elapsed_ms: outcome.elapsed_ms,
            pdf_info: outcome.pdf_info,
        }
    }
}

/// POST /resume/analyze
///
/// Accepts either a multipart PDF upload (field `file`, optional `kind`
/// and `session_id` fields) or a JSON body `{text, kind?, session_id?}`.
/// Both paths store the extracted text and return the same response shape.
pub async fn handle_analyze(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let outcome = if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| AppError::Validation(format!("Invalid multipart upload: {e}")))?;
        analyze_multipart(&state, multipart).await?
    } else {
        let Json(body) = Json::<AnalyzeTextRequest>::from_request(req, &())
            .await
            .map_err(|e| AppError::Validation(format!("Invalid JSON body: {e}")))?;
        resume::analyze_text(
            state.store.as_ref(),
            &state.llm,
            &body.text,
            body.kind.as_deref(),
            body.session_id,
        )
        .await?
    };

    Ok(Json(outcome.into()))
}

async fn analyze_multipart(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<AnalyzeOutcome, AppError> {
    let mut file: Option<bytes::Bytes> = None;
    let mut kind: Option<String> = None;
    let mut session_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart upload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                file = Some(field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read uploaded file: {e}"))
                })?);
            }
            "kind" => {
                kind = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Invalid 'kind' field: {e}"))
                })?);
            }
            "session_id" => {
                session_id = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Invalid 'session_id' field: {e}"))
                })?);
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| {
        AppError::Validation("Missing 'file' field in multipart upload".to_string())
    })?;

    resume::analyze_pdf(
        state.store.as_ref(),
        &state.llm,
        &file,
        kind.as_deref(),
        session_id,
    )
    .await
}

/// DELETE /resume/:session_id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.delete(&session_id).await?;
    info!(%session_id, "Session deleted");
    Ok(StatusCode::NO_CONTENT)
}
