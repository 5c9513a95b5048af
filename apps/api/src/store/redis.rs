use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::info;

use crate::store::{SessionStore, StoreError};

/// Prefix for all session keys, shared with any other consumers of the
/// same Redis instance.
const KEY_PREFIX: &str = "resume:";

/// Redis-backed session store. Each resume is a flat string under
/// `resume:<session_id>`, written with a TTL so abandoned sessions expire
/// on their own.
pub struct RedisSessionStore {
    conn: MultiplexedConnection,
    ttl_secs: u64,
}

impl RedisSessionStore {
    /// Connects once at startup. A failure here is surfaced to `main`,
    /// which decides between aborting (production) and degrading to the
    /// in-memory store (development).
    pub async fn connect(url: &str, ttl_secs: u64) -> Result<Self, StoreError> {
        let client =
            redis::Client::open(url).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        info!("Redis session store connected (ttl: {ttl_secs}s)");
        Ok(Self { conn, ttl_secs })
    }
}

fn session_key(session_id: &str) -> String {
    format!("{KEY_PREFIX}{session_id}")
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, session_id: &str, text: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(session_key(session_id), text, self.ttl_secs)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn get(&self, session_id: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        // Redis nil maps to None; only transport failures become errors.
        conn.get::<_, Option<String>>(session_key(session_id))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(session_key(session_id))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_has_prefix() {
        assert_eq!(session_key("abc-123"), "resume:abc-123");
    }
}
