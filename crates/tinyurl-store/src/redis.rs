use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError, RedisResult};
use tracing::{debug, info, trace, warn};
use typed_builder::TypedBuilder;

use crate::error::{Result, StoreError};
use crate::store::KvStore;

/// Connection settings for [`RedisStore`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct RedisStoreSettings {
    /// Redis connection string, e.g. `redis://:secret@localhost:6379/0`.
    #[builder(setter(into))]
    pub url: String,
    /// Upper bound for every single store call.
    #[builder(default = Duration::from_secs(2))]
    pub timeout: Duration,
}

/// A Redis-backed implementation of [`KvStore`].
///
/// Uses a [`ConnectionManager`], which multiplexes requests over one
/// connection and reconnects transparently, so a `RedisStore` can be cloned
/// and shared by every request.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    timeout: Duration,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn map_redis_error(operation: &str, err: RedisError) -> StoreError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() || message.to_ascii_lowercase().contains("timed out") {
        StoreError::Timeout(message)
    } else if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
        StoreError::Unavailable(message)
    } else if message.contains("not an integer") {
        StoreError::InvalidData(message)
    } else {
        StoreError::Operation(message)
    }
}

/// Converts a TTL to the millisecond argument of `SET ... PX`.
///
/// Redis rejects `PX 0`, so anything shorter than a millisecond is rounded up.
/// Redis parses the argument as a signed 64-bit integer, so longer TTLs are
/// clamped to `i64::MAX`.
fn ttl_millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX).max(1)
}

impl RedisStore {
    /// Connects to Redis and verifies the connection with a `PING`.
    pub async fn connect(settings: RedisStoreSettings) -> Result<Self> {
        let client = redis::Client::open(settings.url.as_str()).map_err(|e| {
            StoreError::Unavailable(format!("failed to create Redis client: {e}"))
        })?;

        let connecting = ConnectionManager::new(client);
        let conn = match tokio::time::timeout(settings.timeout, connecting).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => return Err(map_redis_error("failed to connect to Redis", e)),
            Err(_) => {
                return Err(StoreError::Timeout(format!(
                    "failed to connect to Redis within {:?}",
                    settings.timeout
                )))
            }
        };

        let store = Self::from_connection(conn, settings.timeout);
        store.ping().await?;
        info!(timeout = ?settings.timeout, "connected to Redis");
        Ok(store)
    }

    /// Wraps an existing connection.
    pub fn from_connection(conn: ConnectionManager, timeout: Duration) -> Self {
        Self { conn, timeout }
    }

    /// Round-trips a `PING` to the server.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        self.bounded("failed to ping Redis", redis::cmd("PING").query_async::<()>(&mut conn))
            .await
    }

    /// Awaits a Redis call, giving up after the configured timeout.
    async fn bounded<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(map_redis_error(operation, e)),
            Err(_) => Err(StoreError::Timeout(format!(
                "{operation}: no reply within {:?}",
                self.timeout
            ))),
        }
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        trace!(key, "GET");
        let mut conn = self.conn.clone();
        let value = self
            .bounded("failed to read value from Redis", conn.get::<_, Option<String>>(key))
            .await
            .inspect_err(|e| warn!(key, error = %e, "Redis error on get"))?;

        if value.is_none() {
            trace!(key, "miss");
        }
        Ok(value)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        trace!(key, ttl = ?ttl, "SET");
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(ttl_millis(ttl));
        }

        let mut conn = self.conn.clone();
        self.bounded("failed to write value to Redis", cmd.query_async::<()>(&mut conn))
            .await
            .inspect_err(|e| warn!(key, error = %e, "Redis error on set"))
    }

    async fn set_all_with_ttl(
        &self,
        entries: &[(String, String)],
        ttl: Option<Duration>,
    ) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for (key, value) in entries {
            pipe.cmd("SET").arg(key).arg(value);
            if let Some(ttl) = ttl {
                pipe.arg("PX").arg(ttl_millis(ttl));
            }
            pipe.ignore();
        }

        let mut conn = self.conn.clone();
        self.bounded("failed to write values to Redis", pipe.query_async::<()>(&mut conn))
            .await
            .inspect_err(|e| warn!(keys = entries.len(), error = %e, "Redis error on MULTI/EXEC"))?;

        debug!(keys = entries.len(), ttl = ?ttl, "wrote entries atomically");
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<u64> {
        trace!(key, "INCR");
        let mut conn = self.conn.clone();
        self.bounded("failed to increment counter in Redis", conn.incr::<_, _, u64>(key, 1_u64))
            .await
            .inspect_err(|e| warn!(key, error = %e, "Redis error on incr"))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        self.bounded("failed to check key in Redis", conn.exists::<_, bool>(key))
            .await
    }
}
