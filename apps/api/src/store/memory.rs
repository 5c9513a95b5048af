use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::store::{SessionStore, StoreError};

/// Process-local session store.
///
/// Non-durable and not safe across multiple instances — resumes vanish on
/// restart and are invisible to other processes. Entries never expire.
/// Intended for development and single-instance deployments only; `main`
/// refuses to fall back to this store in production.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, session_id: &str, text: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .insert(session_id.to_string(), text.to_string());
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(session_id).cloned())
    }

    async fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(session_id);
        Ok(())
    }
}
