mod agent;
mod config;
mod errors;
mod llm_client;
mod resume;
mod routes;
mod state;
mod store;

#[cfg(test)]
mod testutil;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{MemorySessionStore, RedisSessionStore, SessionStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting resume-agent API v{} ({})",
        env!("CARGO_PKG_VERSION"),
        config.app_env
    );

    // Initialize the session store per deployment mode
    let store = build_session_store(&config).await?;

    // Initialize LLM client
    let llm = LlmClient::new(&config);
    if llm.has_api_key() {
        info!("LLM client initialized (model: {})", llm.default_model());
    } else {
        warn!("OPENROUTER_API_KEY not set — chat requests will fail; summaries use the local fallback");
    }

    // Build app state
    let state = AppState {
        store,
        llm,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Chooses the session store backend.
///
/// Production is strict: Redis must be configured and reachable or startup
/// aborts. Any other environment degrades to the process-local map with a
/// loud warning, so a laptop run needs no infrastructure.
async fn build_session_store(config: &Config) -> Result<Arc<dyn SessionStore>> {
    match &config.redis_url {
        Some(url) => match RedisSessionStore::connect(url, config.session_ttl_secs).await {
            Ok(store) => Ok(Arc::new(store)),
            Err(e) if config.is_production() => {
                bail!("Redis connection failed in production: {e}")
            }
            Err(e) => {
                warn!("Redis connection failed ({e}) — using in-memory session store (non-durable, single-instance)");
                Ok(Arc::new(MemorySessionStore::new()))
            }
        },
        None if config.is_production() => {
            bail!("REDIS_URL is required in production")
        }
        None => {
            warn!("REDIS_URL not set — using in-memory session store (non-durable, single-instance)");
            Ok(Arc::new(MemorySessionStore::new()))
        }
    }
}
