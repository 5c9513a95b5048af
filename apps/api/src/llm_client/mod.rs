//! LLM Gateway — the single point of contact with the upstream completion API.
//!
//! ARCHITECTURAL RULE: no other module may call the provider directly.
//! All LLM interactions MUST go through this module. It owns retries,
//! per-attempt timeouts, response-shape extraction, and output cleanup,
//! so callers only ever see a clean answer string or a typed error.

use std::borrow::Cow;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

const MAX_TOKENS: u32 = 800;
/// Low temperature: factual extraction, not creative writing.
const TEMPERATURE: f32 = 0.2;

/// Backoff unit between attempts; attempt n waits n * 500ms.
const BACKOFF_STEP: Duration = Duration::from_millis(500);

/// Appended to the system prompt for the single strengthened attempt that
/// follows an answer which sanitized down to nothing.
const NON_EMPTY_SUFFIX: &str = "IMPORTANT: You MUST return a non-empty answer. \
    Answer ONLY from the resume. If the resume lacks the information, say so clearly.";

/// Fixed terminal fallback when even the strengthened attempt comes back
/// empty. Callers receive this string, never an empty one.
pub const INSUFFICIENT_INFORMATION: &str =
    "The resume does not contain enough information to answer this question.";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("OPENROUTER_API_KEY is not set")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unrecognized response shape from upstream")]
    InvalidShape,
}

impl LlmError {
    /// True when the underlying failure was a client-side timeout, so the
    /// orchestrator can surface its dedicated timeout message.
    pub fn is_timeout(&self) -> bool {
        matches!(self, LlmError::Http(e) if e.is_timeout())
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Per-call overrides for the gateway. `None` falls back to the configured
/// default for that field.
#[derive(Debug, Default, Clone)]
pub struct CallOptions {
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub model: Option<String>,
    pub timeout: Option<Duration>,
    pub retries: Option<u32>,
}

/// Call result with timing metadata, for callers that want to report which
/// model answered and how long it took. Correctness never depends on it.
#[derive(Debug, Clone, Serialize)]
pub struct ModelResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub model_name: String,
    pub elapsed_ms: u64,
}

/// The single LLM client used by all services.
/// Wraps an OpenRouter-style chat-completion endpoint with retry logic,
/// per-attempt timeouts, and output sanitization.
#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    api_key: Option<String>,
    api_url: String,
    model: String,
    timeout: Duration,
    retries: u32,
}

/// Where a top-level call currently is in its empty-answer recovery:
/// the initial pass (with retries) or the single strengthened pass.
enum Phase {
    Initial,
    Strengthened,
}

impl LlmClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::builder()
                .build()
                .expect("Failed to build HTTP client"),
            api_key: config.openrouter_api_key.clone(),
            api_url: config.openrouter_api_url.clone(),
            model: config.openrouter_model.clone(),
            timeout: config.llm_timeout,
            retries: config.llm_retries,
        }
    }

    /// True when a default API key is configured, so callers can skip the
    /// upstream path entirely instead of burning retries on a guaranteed
    /// `MissingApiKey`.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn default_model(&self) -> &str {
        &self.model
    }

    /// Calls the upstream provider and returns a sanitized, non-empty answer.
    ///
    /// Two-phase loop: the initial pass runs with the configured retry
    /// budget; if its answer sanitizes down to an empty string, exactly one
    /// strengthened pass runs with retries disabled; if that is also empty,
    /// the fixed `INSUFFICIENT_INFORMATION` string is returned. The loop
    /// never recurses and never returns an empty string.
    pub async fn call(
        &self,
        user_message: &str,
        system_prompt: &str,
        opts: &CallOptions,
    ) -> Result<String, LlmError> {
        let api_key = opts
            .api_key
            .clone()
            .or_else(|| self.api_key.clone())
            .ok_or(LlmError::MissingApiKey)?;
        let api_url = opts.api_url.as_deref().unwrap_or(&self.api_url);
        let model = opts.model.as_deref().unwrap_or(&self.model);
        let timeout = opts.timeout.unwrap_or(self.timeout);
        let retries = opts.retries.unwrap_or(self.retries);

        let mut phase = Phase::Initial;
        loop {
            let (system, phase_retries): (Cow<'_, str>, u32) = match phase {
                Phase::Initial => (Cow::Borrowed(system_prompt), retries),
                Phase::Strengthened => (
                    Cow::Owned(format!("{system_prompt}\n\n{NON_EMPTY_SUFFIX}")),
                    0,
                ),
            };

            let raw = self
                .request_with_retries(user_message, &system, &api_key, api_url, model, timeout, phase_retries)
                .await?;
            let cleaned = sanitize_output(&raw);

            if !cleaned.is_empty() {
                return Ok(cleaned);
            }

            match phase {
                Phase::Initial => {
                    warn!("Upstream answer sanitized to empty; retrying once with strengthened prompt");
                    phase = Phase::Strengthened;
                }
                Phase::Strengthened => {
                    warn!("Strengthened attempt also empty; returning fixed fallback");
                    return Ok(INSUFFICIENT_INFORMATION.to_string());
                }
            }
        }
    }

    /// Like [`call`], but never fails: errors are folded into a
    /// `ModelResponse` alongside the model name and elapsed wall-clock time.
    pub async fn call_with_meta(
        &self,
        user_message: &str,
        system_prompt: &str,
        opts: &CallOptions,
    ) -> ModelResponse {
        let started = Instant::now();
        let model_name = opts.model.clone().unwrap_or_else(|| self.model.clone());

        match self.call(user_message, system_prompt, opts).await {
            Ok(text) => ModelResponse {
                success: true,
                text: Some(text),
                error: None,
                model_name,
                elapsed_ms: started.elapsed().as_millis() as u64,
            },
            Err(e) => ModelResponse {
                success: false,
                text: None,
                error: Some(e.to_string()),
                model_name,
                elapsed_ms: started.elapsed().as_millis() as u64,
            },
        }
    }

    /// One bounded retry loop: `retries` additional attempts after the
    /// first, linear backoff between them. Timeouts, transport errors,
    /// non-success statuses, and unrecognized shapes all count as failed
    /// attempts; the last error surfaces after exhaustion.
    #[allow(clippy::too_many_arguments)]
    async fn request_with_retries(
        &self,
        user_message: &str,
        system_prompt: &str,
        api_key: &str,
        api_url: &str,
        model: &str,
        timeout: Duration,
        retries: u32,
    ) -> Result<String, LlmError> {
        let request_body = ChatCompletionRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_message,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..=retries {
            if attempt > 0 {
                let delay = BACKOFF_STEP * attempt;
                warn!(
                    "Upstream attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            match self
                .attempt(&request_body, api_key, api_url, timeout)
                .await
            {
                Ok(text) => {
                    debug!("Upstream call succeeded on attempt {}", attempt + 1);
                    return Ok(text);
                }
                Err(e) => {
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(LlmError::InvalidShape))
    }

    /// A single upstream request with its own wall-clock timeout. The
    /// per-request timeout aborts the in-flight call rather than leaving it
    /// running in the background.
    async fn attempt(
        &self,
        body: &ChatCompletionRequest<'_>,
        api_key: &str,
        api_url: &str,
        timeout: Duration,
    ) -> Result<String, LlmError> {
        let response = self
            .client
            .post(api_url)
            .timeout(timeout)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("HTTP-Referer", "http://localhost")
            .header("X-Title", "Resume Agent")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;

        if !status.is_success() {
            warn!("Upstream returned {}: {}", status, raw);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: raw,
            });
        }

        let json: Value = serde_json::from_str(&raw)?;
        extract_answer_text(&json)
            .map(str::to_string)
            .ok_or(LlmError::InvalidShape)
    }
}

/// Ordered extraction strategies over known provider response shapes.
/// The first one that yields a string wins.
const ANSWER_EXTRACTORS: &[fn(&Value) -> Option<&str>] = &[
    // OpenRouter / OpenAI chat-completion shape
    |v| v.pointer("/choices/0/message/content").and_then(Value::as_str),
    // Bare `result` field used by some proxy providers
    |v| v.get("result").and_then(Value::as_str),
    // Bare `output` field
    |v| v.get("output").and_then(Value::as_str),
];

fn extract_answer_text(body: &Value) -> Option<&str> {
    ANSWER_EXTRACTORS.iter().find_map(|extract| extract(body))
}

static MODEL_TOKEN_RE: OnceLock<Regex> = OnceLock::new();
static NEWLINE_RUN_RE: OnceLock<Regex> = OnceLock::new();

/// Cleans raw model output: strips model-internal delimiter tokens,
/// trims surrounding whitespace, and collapses runs of 3+ newlines to 2.
pub fn sanitize_output(text: &str) -> String {
    let token_re = MODEL_TOKEN_RE
        .get_or_init(|| Regex::new(r"(?i)</?s>|\[/?OUT\]|\[/?s\]").expect("valid token regex"));
    let newline_re = NEWLINE_RUN_RE
        .get_or_init(|| Regex::new(r"\n{3,}").expect("valid newline regex"));

    let stripped = token_re.replace_all(text, "");
    let collapsed = newline_re.replace_all(&stripped, "\n\n");
    collapsed.trim().to_string()
}
