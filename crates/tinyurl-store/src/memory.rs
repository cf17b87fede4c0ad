use crate::clock::{Clock, SystemClock};
use crate::error::{Result, StoreError};
use crate::store::KvStore;
use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;
use tracing::trace;

/// In-memory storage entry.
#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expire_at: Option<Timestamp>,
}

impl Entry {
    fn is_expired(&self, now: Timestamp) -> bool {
        self.expire_at.is_some_and(|expire_at| now >= expire_at)
    }
}

/// In-memory implementation of [`KvStore`].
///
/// Expiry is evaluated lazily against the injected [`Clock`]: an expired
/// entry is dropped the next time its key is touched. All mutations go
/// through one write lock, which makes `incr` and `set_all_with_ttl` atomic.
#[derive(Debug)]
pub struct InMemoryStore<C = SystemClock> {
    storage: RwLock<HashMap<String, Entry>>,
    clock: C,
}

impl InMemoryStore<SystemClock> {
    /// Creates a new in-memory store backed by the wall clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for InMemoryStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> InMemoryStore<C> {
    /// Creates a new in-memory store that reads time from `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            storage: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.storage
            .read()
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn expire_at(&self, ttl: Option<Duration>) -> Option<Timestamp> {
        let ttl = ttl?;
        // A TTL too large to represent is as good as no TTL.
        SignedDuration::try_from(ttl)
            .ok()
            .and_then(|ttl| self.clock.now().checked_add(ttl).ok())
    }

    fn live_value(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        {
            let storage = self.storage.read();
            match storage.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        let mut storage = self.storage.write();
        if storage.get(key).is_some_and(|entry| entry.is_expired(now)) {
            trace!(key, "evicting expired entry");
            storage.remove(key);
        }
        None
    }
}

#[async_trait]
impl<C: Clock> KvStore for InMemoryStore<C> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.live_value(key))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let entry = Entry {
            value: value.to_owned(),
            expire_at: self.expire_at(ttl),
        };
        self.storage.write().insert(key.to_owned(), entry);
        Ok(())
    }

    async fn set_all_with_ttl(
        &self,
        entries: &[(String, String)],
        ttl: Option<Duration>,
    ) -> Result<()> {
        let expire_at = self.expire_at(ttl);
        let mut storage = self.storage.write();
        for (key, value) in entries {
            storage.insert(
                key.clone(),
                Entry {
                    value: value.clone(),
                    expire_at,
                },
            );
        }
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<u64> {
        let now = self.clock.now();
        let mut storage = self.storage.write();

        let (current, expire_at) = match storage.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                let current = entry.value.parse::<u64>().map_err(|_| {
                    StoreError::InvalidData(format!("value at '{key}' is not an integer"))
                })?;
                (current, entry.expire_at)
            }
            _ => (0, None),
        };

        let next = current
            .checked_add(1)
            .ok_or_else(|| StoreError::InvalidData(format!("counter at '{key}' overflowed")))?;

        storage.insert(
            key.to_owned(),
            Entry {
                value: next.to_string(),
                expire_at,
            },
        );
        Ok(next)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.live_value(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::Arc;

    fn store() -> (InMemoryStore<ManualClock>, ManualClock) {
        let clock = ManualClock::new(Timestamp::from_second(1_700_000_000).unwrap());
        (InMemoryStore::with_clock(clock.clone()), clock)
    }

    #[tokio::test]
    async fn set_and_get() {
        let (store, _) = store();

        store.set_with_ttl("k", "v", None).await.unwrap();

        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert!(store.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let (store, _) = store();

        assert_eq!(store.get("nope").await.unwrap(), None);
        assert!(!store.exists("nope").await.unwrap());
    }

    #[tokio::test]
    async fn set_overwrites() {
        let (store, _) = store();

        store.set_with_ttl("k", "old", None).await.unwrap();
        store.set_with_ttl("k", "new", None).await.unwrap();

        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn entry_expires_after_ttl() {
        let (store, clock) = store();

        store
            .set_with_ttl("k", "v", Some(Duration::from_secs(60)))
            .await
            .unwrap();

        clock.advance(SignedDuration::from_secs(59));
        assert!(store.exists("k").await.unwrap());

        clock.advance(SignedDuration::from_secs(1));
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn no_ttl_never_expires() {
        let (store, clock) = store();

        store.set_with_ttl("k", "v", None).await.unwrap();
        clock.advance(SignedDuration::from_hours(24 * 365));

        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn set_all_shares_ttl() {
        let (store, clock) = store();
        let entries = vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ];

        store
            .set_all_with_ttl(&entries, Some(Duration::from_secs(10)))
            .await
            .unwrap();
        assert_eq!(store.len(), 2);

        clock.advance(SignedDuration::from_secs(10));
        assert_eq!(store.get("a").await.unwrap(), None);
        assert_eq!(store.get("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn incr_starts_at_one() {
        let (store, _) = store();

        assert_eq!(store.incr("counter").await.unwrap(), 1);
        assert_eq!(store.incr("counter").await.unwrap(), 2);
        assert_eq!(store.get("counter").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn incr_rejects_non_integer() {
        let (store, _) = store();
        store.set_with_ttl("counter", "abc", None).await.unwrap();

        let err = store.incr("counter").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[tokio::test]
    async fn concurrent_incr_yields_distinct_values() {
        let store = Arc::new(InMemoryStore::new());
        let mut handles = vec![];

        for _ in 0..50 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move { store.incr("counter").await.unwrap() }));
        }

        let mut values = vec![];
        for handle in handles {
            values.push(handle.await.unwrap());
        }
        values.sort_unstable();

        assert_eq!(values, (1..=50).collect::<Vec<u64>>());
    }
}
