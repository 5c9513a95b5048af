//! Resume ingestion — extraction, summarization, and the session write.
//!
//! Accepts either raw text or a PDF upload, produces a short professional
//! summary (upstream LLM when configured, local heuristic otherwise), and
//! stores the extracted text under the session id for later Q&A.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::{CallOptions, LlmClient};
use crate::store::SessionStore;

pub mod handlers;
pub mod prompts;

use prompts::summary_system_prompt;

#[derive(Debug, Clone, Serialize)]
pub struct PdfInfo {
    #[serde(rename = "pageCount")]
    pub page_count: u32,
    #[serde(rename = "extractedAt")]
    pub extracted_at: String,
}

/// Result of one analyze request, independent of the wire format.
#[derive(Debug)]
pub struct AnalyzeOutcome {
    pub session_id: String,
    pub summary: String,
    pub extracted_length: usize,
    pub engine: &'static str,
    pub model: Option<String>,
    pub elapsed_ms: Option<u64>,
    pub pdf_info: Option<PdfInfo>,
}

#[derive(Debug)]
struct SummaryOutcome {
    summary: String,
    engine: &'static str,
    model: Option<String>,
    elapsed_ms: Option<u64>,
}

/// Analyzes caller-supplied resume text and stores it under the session id.
pub async fn analyze_text(
    store: &dyn SessionStore,
    llm: &LlmClient,
    text: &str,
    kind: Option<&str>,
    session_id: Option<String>,
) -> Result<AnalyzeOutcome, AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Validation(
            "text must be a non-empty string".to_string(),
        ));
    }

    let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let summary = generate_summary(llm, text, kind).await;

    store.put(&session_id, text).await?;
    info!(
        %session_id,
        extracted_chars = text.chars().count(),
        engine = summary.engine,
        "Resume text analyzed and stored"
    );

    Ok(AnalyzeOutcome {
        session_id,
        summary: summary.summary,
        extracted_length: text.chars().count(),
        engine: summary.engine,
        model: summary.model,
        elapsed_ms: summary.elapsed_ms,
        pdf_info: None,
    })
}

/// Analyzes an uploaded PDF: validates, extracts text in memory, then
/// follows the same summarize-and-store path as raw text.
pub async fn analyze_pdf(
    store: &dyn SessionStore,
    llm: &LlmClient,
    pdf_bytes: &[u8],
    kind: Option<&str>,
    session_id: Option<String>,
) -> Result<AnalyzeOutcome, AppError> {
    if !is_pdf(pdf_bytes) {
        return Err(AppError::Validation(
            "Invalid PDF file. Please upload a valid PDF document.".to_string(),
        ));
    }

    let text = pdf_extract::extract_text_from_mem(pdf_bytes).map_err(|e| {
        warn!("PDF text extraction failed: {e}");
        AppError::Validation(
            "Failed to extract text from PDF. The file may be corrupted or password-protected."
                .to_string(),
        )
    })?;
    let text = text.trim().to_string();

    let pdf_info = PdfInfo {
        page_count: count_pdf_pages(pdf_bytes),
        extracted_at: Utc::now().to_rfc3339(),
    };

    let mut outcome = analyze_text(store, llm, &text, kind, session_id).await?;
    outcome.pdf_info = Some(pdf_info);
    Ok(outcome)
}

/// PDF magic-number check, performed before handing bytes to the extractor.
fn is_pdf(bytes: &[u8]) -> bool {
    bytes.len() >= 5 && bytes.starts_with(b"%PDF-")
}

/// Best-effort page count: scans the raw bytes for `/Type /Page` object
/// markers, excluding the `/Pages` tree nodes. Pages hidden inside
/// compressed object streams are not visible to this scan, so the count is
/// metadata only — never load-bearing.
fn count_pdf_pages(bytes: &[u8]) -> u32 {
    const TYPE_MARKER: &[u8] = b"/Type";

    let mut count = 0u32;
    let mut offset = 0;
    while let Some(pos) = find(&bytes[offset..], TYPE_MARKER) {
        let mut cursor = offset + pos + TYPE_MARKER.len();
        while bytes.get(cursor).is_some_and(|b| b.is_ascii_whitespace()) {
            cursor += 1;
        }
        let rest = &bytes[cursor.min(bytes.len())..];
        if rest.starts_with(b"/Page") && rest.get(5) != Some(&b's') {
            count += 1;
        }
        offset += pos + TYPE_MARKER.len();
    }
    count.max(1)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Generates a summary via the LLM gateway when a key is configured,
/// falling back to the local heuristic summarizer on any failure.
async fn generate_summary(llm: &LlmClient, text: &str, kind: Option<&str>) -> SummaryOutcome {
    if llm.has_api_key() {
        let system = summary_system_prompt(kind);
        let result = llm.call_with_meta(text, &system, &CallOptions::default()).await;

        match result.text {
            Some(summary) if result.success && !summary.is_empty() => {
                return SummaryOutcome {
                    summary,
                    engine: "openrouter",
                    model: Some(result.model_name),
                    elapsed_ms: Some(result.elapsed_ms),
                };
            }
            _ => {
                warn!(
                    "Upstream summary generation failed, falling back to local summarizer: {}",
                    result.error.as_deref().unwrap_or("empty response")
                );
            }
        }
    }

    SummaryOutcome {
        summary: local_summary(text),
        engine: "local-fallback",
        model: None,
        elapsed_ms: None,
    }
}

/// Heuristic local summarizer: the first 3 sentences when they carry
/// enough content, otherwise a 300-character prefix.
fn local_summary(text: &str) -> String {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let selected = first_sentences(&cleaned, 3);

    if selected.chars().count() > 30 {
        return selected;
    }

    let prefix: String = cleaned.chars().take(300).collect();
    if prefix.chars().count() < cleaned.chars().count() {
        format!("{prefix}…")
    } else {
        prefix
    }
}

/// Joins the first `n` sentences, splitting after `.`, `?`, or `!` that is
/// followed by whitespace (or ends the text).
fn first_sentences(text: &str, n: usize) -> String {
    let mut sentences = Vec::new();
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if matches!(c, '.' | '?' | '!') {
            let end = i + c.len_utf8();
            let next_is_boundary = text[end..]
                .chars()
                .next()
                .map_or(true, |next| next.is_whitespace());
            if next_is_boundary {
                let sentence = text[start..end].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                start = end;
                if sentences.len() == n {
                    break;
                }
            }
        }
    }

    if sentences.len() < n {
        let tail = text[start..].trim();
        if !tail.is_empty() {
            sentences.push(tail);
        }
    }

    sentences.join(" ")
}
