use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// The capability surface the shortening engine consumes from its store.
///
/// Implementations must be safe to share between concurrently running
/// requests.
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    /// Reads a value.
    ///
    /// Returns `Ok(None)` if the key is absent or its TTL elapsed.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Upserts a value. With `ttl = None` the key never expires.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Upserts several values sharing one TTL as a single atomic write.
    ///
    /// Either every entry becomes visible or none does.
    async fn set_all_with_ttl(&self, entries: &[(String, String)], ttl: Option<Duration>)
        -> Result<()>;

    /// Atomically increments the integer stored at `key` and returns the new
    /// value. A missing key counts as zero, so the first call returns 1.
    async fn incr(&self, key: &str) -> Result<u64>;

    /// Checks whether a live value is stored at `key`.
    async fn exists(&self, key: &str) -> Result<bool>;
}
