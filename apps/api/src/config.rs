use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
///
/// Only `APP_ENV=production` makes `REDIS_URL` mandatory; everything else
/// has a development-friendly default so the service boots with an empty
/// environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub app_env: String,
    /// Redis connection URL. Optional in development (falls back to the
    /// in-memory session store), required in production.
    pub redis_url: Option<String>,
    pub openrouter_api_key: Option<String>,
    pub openrouter_api_url: String,
    pub openrouter_model: String,
    /// Wall-clock budget per upstream attempt.
    pub llm_timeout: Duration,
    /// Additional attempts after the first one.
    pub llm_retries: u32,
    pub session_ttl_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_MODEL: &str = "mistralai/mistral-7b-instruct";

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            app_env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            redis_url: optional_env("REDIS_URL"),
            openrouter_api_key: optional_env("OPENROUTER_API_KEY"),
            openrouter_api_url: std::env::var("OPENROUTER_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            openrouter_model: std::env::var("OPENROUTER_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            llm_timeout: Duration::from_millis(
                std::env::var("LLM_TIMEOUT_MS")
                    .unwrap_or_else(|_| "15000".to_string())
                    .parse::<u64>()
                    .context("LLM_TIMEOUT_MS must be a number of milliseconds")?,
            ),
            llm_retries: std::env::var("LLM_RETRIES")
                .unwrap_or_else(|_| "2".to_string())
                .parse::<u32>()
                .context("LLM_RETRIES must be a non-negative integer")?,
            session_ttl_secs: std::env::var("SESSION_TTL_SECS")
                .unwrap_or_else(|_| "1800".to_string())
                .parse::<u64>()
                .context("SESSION_TTL_SECS must be a number of seconds")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Strict mode: a missing or unreachable Redis aborts startup instead of
    /// degrading to the in-memory store.
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }
}

/// Reads an env var, treating an empty value the same as an unset one.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
