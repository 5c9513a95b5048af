//! Session Store — maps an opaque session id to extracted resume text.
//!
//! Two backends implement the same trait: Redis (multi-instance, with TTL)
//! and an in-memory map (single-process development fallback). The backend
//! is chosen once at startup and injected into `AppState` as
//! `Arc<dyn SessionStore>`, so handlers and tests never care which one is
//! behind it.

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod redis;

pub use self::memory::MemorySessionStore;
pub use self::redis::RedisSessionStore;

/// Transport-level store failure. A missing key is NOT an error — `get`
/// returns `None` for that, so callers can tell "absent" from "down".
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Key/value mapping from session id to resume text.
///
/// `put` has overwrite semantics and applies a TTL when the backend
/// supports expiry. All operations are single atomic key commands; there
/// are no partial writes.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, session_id: &str, text: &str) -> Result<(), StoreError>;

    async fn get(&self, session_id: &str) -> Result<Option<String>, StoreError>;

    /// Idempotent removal. Deleting an absent key is a no-op.
    async fn delete(&self, session_id: &str) -> Result<(), StoreError>;
}
