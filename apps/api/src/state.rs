use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::store::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Session store backend, chosen once at startup (Redis in production,
    /// in-memory fallback in development).
    pub store: Arc<dyn SessionStore>,
    pub llm: LlmClient,
    pub config: Config,
}
