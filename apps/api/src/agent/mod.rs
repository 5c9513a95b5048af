//! Chat Orchestrator — the request-level use case "answer a question about
//! a specific resume session".
//!
//! Ties the session store, prompt construction, and the LLM gateway
//! together. Gateway failures degrade to a small fixed set of user-facing
//! strings; raw upstream errors are logged here and never propagated.

use tracing::{debug, error, warn};

use crate::errors::AppError;
use crate::llm_client::{CallOptions, LlmClient, LlmError};
use crate::store::SessionStore;

pub mod handlers;
pub mod prompts;

use prompts::{build_chat_prompts, MIN_RESUME_CHARS, NOT_FOUND_IN_RESUME};

/// Fixed response when a stored resume is empty or too short to answer
/// from. Returned without ever calling the LLM gateway.
pub const RESUME_UNREADABLE: &str =
    "This resume could not be read. Please upload it again.";

/// Fixed response when the upstream call timed out.
pub const LLM_TIMEOUT_MESSAGE: &str = "LLM timeout.";

/// Role slugs this deployment generates summaries for, surfaced by the
/// status endpoint so the frontend can render its role selector.
pub const AVAILABLE_ROLES: &[&str] = &[
    "backend-engineer",
    "frontend-engineer",
    "full-stack-developer",
    "devops-engineer",
];

pub fn is_ready() -> bool {
    true
}

/// Answers `question` from the resume stored under `session_id`.
///
/// Read-only and safely retriable: the only side effects are the store
/// read and the outbound LLM call. Errors that the caller must act on
/// (bad input, unknown session, store outage, missing credentials) come
/// back as `AppError`; transient upstream failures degrade to fixed
/// strings in the `Ok` channel instead.
pub async fn chat(
    store: &dyn SessionStore,
    llm: &LlmClient,
    session_id: &str,
    question: &str,
) -> Result<String, AppError> {
    if session_id.trim().is_empty() {
        return Err(AppError::Validation("session_id is required".to_string()));
    }
    if question.trim().is_empty() {
        return Err(AppError::Validation("message is required".to_string()));
    }

    let resume_text = store
        .get(session_id)
        .await?
        .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))?;

    let trimmed = resume_text.trim();
    if trimmed.chars().count() < MIN_RESUME_CHARS {
        warn!(
            session_id,
            chars = trimmed.chars().count(),
            "Stored resume text too short to answer from"
        );
        return Ok(RESUME_UNREADABLE.to_string());
    }

    let (system_prompt, user_prompt) = build_chat_prompts(question, trimmed);
    debug!(
        session_id,
        resume_chars = trimmed.chars().count(),
        "Dispatching chat request to LLM gateway"
    );

    match llm
        .call(&user_prompt, &system_prompt, &CallOptions::default())
        .await
    {
        Ok(answer) => Ok(answer),
        Err(LlmError::MissingApiKey) => Err(AppError::Configuration(
            "OPENROUTER_API_KEY is not set".to_string(),
        )),
        Err(e) if e.is_timeout() => {
            error!(session_id, "LLM gateway timed out: {e}");
            Ok(LLM_TIMEOUT_MESSAGE.to_string())
        }
        Err(e) => {
            // Exhausted retries or an unusable payload. The user gets the
            // canonical refusal; the real cause stays in the log.
            error!(session_id, "LLM gateway call failed: {e}");
            Ok(NOT_FOUND_IN_RESUME.to_string())
        }
    }
}
