use crate::keyspace::Keyspace;
use async_trait::async_trait;
use std::sync::Arc;
use tinyurl_core::{
    ExpirationPolicy, Fingerprint, LinkDetail, ShortCode, ShortenParams, Shortener, ShortenerError,
};
use tinyurl_store::{Clock, KvStore, StoreError, SystemClock};
use tracing::{debug, info, trace, warn};

/// Value a fingerprint record may hold to mark its code as expired.
const EXPIRED_MARKER: &str = "{}";

/// A concrete implementation of the `Shortener` trait.
///
/// This service wraps a [`KvStore`] to handle:
/// - URL and expiration validation
/// - Deduplication of live URLs by fingerprint
/// - Code minting from the store's atomic counter
///
/// All state lives in the store; the service itself is cheap to clone and
/// can serve any number of concurrent requests. The `created_at` of new
/// links is read from `C`.
#[derive(Debug)]
pub struct ShortenerService<S, C = SystemClock> {
    store: Arc<S>,
    keyspace: Keyspace,
    clock: C,
}

impl<S, C: Clone> Clone for ShortenerService<S, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            keyspace: self.keyspace.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<S: KvStore> ShortenerService<S> {
    /// Creates a new `ShortenerService` using the default key layout.
    pub fn new(store: S) -> Self {
        Self::with_keyspace(store, Keyspace::default())
    }

    pub fn with_keyspace(store: S, keyspace: Keyspace) -> Self {
        Self {
            store: Arc::new(store),
            keyspace,
            clock: SystemClock,
        }
    }
}

impl<S: KvStore, C: Clock> ShortenerService<S, C> {
    /// Replaces the clock new links are timestamped with.
    pub fn with_clock<T: Clock>(self, clock: T) -> ShortenerService<S, T> {
        ShortenerService {
            store: self.store,
            keyspace: self.keyspace,
            clock,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    /// Validates that the URL is an absolute http(s) URL with a host.
    ///
    /// The raw string is what gets stored and later sent back in the
    /// `Location` header, so it must not rely on the parser stripping
    /// whitespace or control characters from it.
    fn validate_url(raw: &str) -> Result<(), ShortenerError> {
        if raw.is_empty() {
            return Err(ShortenerError::InvalidInput(
                "URL cannot be empty".to_string(),
            ));
        }

        if raw.chars().any(|c| c.is_ascii_control() || c.is_whitespace()) {
            return Err(ShortenerError::InvalidInput(format!(
                "URL must not contain whitespace or control characters: {raw:?}"
            )));
        }

        let parsed = url::Url::parse(raw)
            .map_err(|e| ShortenerError::InvalidInput(format!("malformed URL '{raw}': {e}")))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ShortenerError::InvalidInput(format!(
                "URL scheme must be http or https: {}",
                parsed.scheme()
            )));
        }

        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(ShortenerError::InvalidInput(format!(
                "URL must have a host: {raw}"
            )));
        }

        Ok(())
    }

    /// Looks up the code currently minted for a fingerprint, if it is still live.
    async fn live_code(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<ShortCode>, ShortenerError> {
        let stored = self
            .store
            .get(&self.keyspace.url_hash(fingerprint))
            .await
            .map_err(store_to_shortener_error)?;

        match stored {
            Some(code) if code.is_empty() || code == EXPIRED_MARKER => {
                trace!(fingerprint = %fingerprint, "fingerprint marked as expired");
                Ok(None)
            }
            Some(code) => ShortCode::parse(&code).map(Some).map_err(|e| {
                ShortenerError::InvalidData(format!(
                    "fingerprint {fingerprint} maps to an invalid code: {e}"
                ))
            }),
            None => Ok(None),
        }
    }

    /// Mints a fresh code from the store counter.
    async fn next_code(&self) -> Result<(u64, ShortCode), ShortenerError> {
        let counter = self
            .store
            .incr(&self.keyspace.counter())
            .await
            .map_err(store_to_shortener_error)?;
        Ok((counter, ShortCode::generated(counter)))
    }
}

#[async_trait]
impl<S: KvStore, C: Clock> Shortener for ShortenerService<S, C> {
    async fn shorten(&self, params: ShortenParams) -> Result<ShortCode, ShortenerError> {
        let expiration = ExpirationPolicy::from_minutes(params.expiration_in_minutes)?;
        Self::validate_url(&params.original_url)?;

        let fingerprint = Fingerprint::of(&params.original_url);
        if let Some(code) = self.live_code(&fingerprint).await? {
            debug!(code = %code, url = %params.original_url, "reusing live short link");
            return Ok(code);
        }

        let (counter, code) = self.next_code().await?;

        let detail = LinkDetail {
            url: params.original_url.clone(),
            created_at: self.clock.now(),
            expiration_in_minutes: params.expiration_in_minutes.unsigned_abs(),
        };
        let detail = serde_json::to_string(&detail).map_err(|e| {
            ShortenerError::InvalidData(format!("failed to serialize link detail: {e}"))
        })?;

        let records = [
            (self.keyspace.short_link(code.as_str()), params.original_url),
            (self.keyspace.url_hash(&fingerprint), code.to_string()),
            (self.keyspace.detail(code.as_str()), detail),
        ];

        // The counter value is already spent; on failure it is simply skipped.
        self.store
            .set_all_with_ttl(&records, expiration.ttl())
            .await
            .map_err(|e| {
                warn!(code = %code, counter, error = %e, "failed to write short link records");
                store_to_shortener_error(e)
            })?;

        info!(code = %code, counter, expiration = ?expiration, "minted short link");
        Ok(code)
    }

    async fn unshorten(&self, code: &str) -> Result<String, ShortenerError> {
        trace!(code, "resolving short code");

        self.store
            .get(&self.keyspace.short_link(code))
            .await
            .map_err(store_to_shortener_error)?
            .ok_or_else(|| {
                debug!(code, "short code not found");
                ShortenerError::NotFound(code.to_string())
            })
    }

    async fn short_link_info(&self, code: &str) -> Result<LinkDetail, ShortenerError> {
        let raw = self
            .store
            .get(&self.keyspace.detail(code))
            .await
            .map_err(store_to_shortener_error)?
            .ok_or_else(|| ShortenerError::NotFound(code.to_string()))?;

        serde_json::from_str(&raw).map_err(|e| {
            warn!(code, error = %e, "stored link detail is corrupt");
            ShortenerError::InvalidData(format!("invalid detail document for '{code}': {e}"))
        })
    }
}

/// Converts a StoreError to a ShortenerError.
fn store_to_shortener_error(e: StoreError) -> ShortenerError {
    match e {
        StoreError::InvalidData(message) => ShortenerError::InvalidData(message),
        other => ShortenerError::StoreUnavailable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::SignedDuration;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tinyurl_core::MAX_EXPIRATION_MINUTES;
    use tinyurl_store::{InMemoryStore, ManualClock};

    type TestService = ShortenerService<InMemoryStore<ManualClock>, ManualClock>;

    fn test_service() -> (TestService, ManualClock) {
        let clock = ManualClock::default();
        let store = InMemoryStore::with_clock(clock.clone());
        let service = ShortenerService::new(store).with_clock(clock.clone());
        (service, clock)
    }

    async fn counter_value(service: &TestService) -> Option<String> {
        service
            .store()
            .get(&service.keyspace().counter())
            .await
            .unwrap()
    }

    /// A store whose backend is always down.
    struct UnreachableStore;

    #[async_trait]
    impl KvStore for UnreachableStore {
        async fn get(&self, _key: &str) -> tinyurl_store::Result<Option<String>> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn set_with_ttl(
            &self,
            _key: &str,
            _value: &str,
            _ttl: Option<Duration>,
        ) -> tinyurl_store::Result<()> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn set_all_with_ttl(
            &self,
            _entries: &[(String, String)],
            _ttl: Option<Duration>,
        ) -> tinyurl_store::Result<()> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn incr(&self, _key: &str) -> tinyurl_store::Result<u64> {
            Err(StoreError::Timeout("no reply".to_string()))
        }

        async fn exists(&self, _key: &str) -> tinyurl_store::Result<bool> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    /// Counts every call that reaches the wrapped store.
    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryStore,
        calls: AtomicUsize,
    }

    impl CountingStore {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn tick(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl KvStore for CountingStore {
        async fn get(&self, key: &str) -> tinyurl_store::Result<Option<String>> {
            self.tick();
            self.inner.get(key).await
        }

        async fn set_with_ttl(
            &self,
            key: &str,
            value: &str,
            ttl: Option<Duration>,
        ) -> tinyurl_store::Result<()> {
            self.tick();
            self.inner.set_with_ttl(key, value, ttl).await
        }

        async fn set_all_with_ttl(
            &self,
            entries: &[(String, String)],
            ttl: Option<Duration>,
        ) -> tinyurl_store::Result<()> {
            self.tick();
            self.inner.set_all_with_ttl(entries, ttl).await
        }

        async fn incr(&self, key: &str) -> tinyurl_store::Result<u64> {
            self.tick();
            self.inner.incr(key).await
        }

        async fn exists(&self, key: &str) -> tinyurl_store::Result<bool> {
            self.tick();
            self.inner.exists(key).await
        }
    }

    #[tokio::test]
    async fn shorten_then_unshorten() {
        let (service, _) = test_service();

        let code = service
            .shorten(ShortenParams::new("https://example.com", 60))
            .await
            .unwrap();

        assert_eq!(code.as_str(), "1");
        assert_eq!(service.unshorten(code.as_str()).await.unwrap(), "https://example.com");
    }

    #[tokio::test]
    async fn short_link_info_returns_detail() {
        let (service, clock) = test_service();
        clock.set("2024-01-02T03:04:05Z".parse().unwrap());

        let code = service
            .shorten(ShortenParams::new("https://example.com", 60))
            .await
            .unwrap();
        clock.advance(SignedDuration::from_mins(10));
        let detail = service.short_link_info(code.as_str()).await.unwrap();

        assert_eq!(detail.url, "https://example.com");
        assert_eq!(detail.expiration_in_minutes, 60);
        assert_eq!(detail.created_at.to_string(), "2024-01-02T03:04:05Z");
    }

    #[tokio::test]
    async fn distinct_urls_get_distinct_codes() {
        let (service, _) = test_service();

        let first = service
            .shorten(ShortenParams::new("https://example.com/a", 60))
            .await
            .unwrap();
        let second = service
            .shorten(ShortenParams::new("https://example.com/b", 60))
            .await
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(service.unshorten(first.as_str()).await.unwrap(), "https://example.com/a");
        assert_eq!(service.unshorten(second.as_str()).await.unwrap(), "https://example.com/b");
    }

    #[tokio::test]
    async fn reshortening_live_url_reuses_code() {
        let (service, _) = test_service();
        let params = ShortenParams::new("https://example.com", 60);

        let first = service.shorten(params.clone()).await.unwrap();
        let second = service.shorten(params).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(counter_value(&service).await.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn reshortening_live_url_performs_no_writes() {
        let service = ShortenerService::new(CountingStore::default());
        let params = ShortenParams::new("https://example.com", 60);

        service.shorten(params.clone()).await.unwrap();
        let after_first = service.store().calls();

        service.shorten(params).await.unwrap();

        // Only the fingerprint lookup.
        assert_eq!(service.store().calls(), after_first + 1);
    }

    #[tokio::test]
    async fn records_expire_together() {
        let (service, clock) = test_service();

        let code = service
            .shorten(ShortenParams::new("https://example.com", 1))
            .await
            .unwrap();

        clock.advance(SignedDuration::from_secs(59));
        assert!(service.unshorten(code.as_str()).await.is_ok());

        clock.advance(SignedDuration::from_secs(1));
        let err = service.unshorten(code.as_str()).await.unwrap_err();
        assert!(matches!(err, ShortenerError::NotFound(_)));
        let err = service.short_link_info(code.as_str()).await.unwrap_err();
        assert!(matches!(err, ShortenerError::NotFound(_)));
        assert!(!service
            .store()
            .exists(&service.keyspace().url_hash(&Fingerprint::of("https://example.com")))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn reshortening_after_expiry_mints_new_code() {
        let (service, clock) = test_service();
        let params = ShortenParams::new("https://example.com", 1);

        let first = service.shorten(params.clone()).await.unwrap();
        clock.advance(SignedDuration::from_mins(2));
        let second = service.shorten(params).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(second.as_str(), "2");
        assert_eq!(service.unshorten(second.as_str()).await.unwrap(), "https://example.com");
    }

    #[tokio::test]
    async fn zero_expiration_never_expires() {
        let (service, clock) = test_service();

        let code = service
            .shorten(ShortenParams::new("https://example.com", 0))
            .await
            .unwrap();
        clock.advance(SignedDuration::from_hours(24 * 365));

        assert_eq!(service.unshorten(code.as_str()).await.unwrap(), "https://example.com");
        let detail = service.short_link_info(code.as_str()).await.unwrap();
        assert_eq!(detail.expiration_in_minutes, 0);
    }

    #[tokio::test]
    async fn expired_marker_is_treated_as_miss() {
        let (service, _) = test_service();
        let url = "https://example.com";
        service
            .store()
            .set_with_ttl(
                &service.keyspace().url_hash(&Fingerprint::of(url)),
                EXPIRED_MARKER,
                None,
            )
            .await
            .unwrap();

        let code = service.shorten(ShortenParams::new(url, 60)).await.unwrap();

        assert_eq!(code.as_str(), "1");
        assert_eq!(service.unshorten("1").await.unwrap(), url);
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let (service, _) = test_service();

        let err = service.unshorten("doesNotExist").await.unwrap_err();
        assert!(matches!(err, ShortenerError::NotFound(_)));

        let err = service.short_link_info("doesNotExist").await.unwrap_err();
        assert!(matches!(err, ShortenerError::NotFound(_)));
    }

    #[tokio::test]
    async fn negative_expiration_is_rejected_before_store_access() {
        let service = ShortenerService::new(CountingStore::default());

        let err = service
            .shorten(ShortenParams::new("https://example.com", -5))
            .await
            .unwrap_err();

        assert!(matches!(err, ShortenerError::InvalidInput(_)));
        assert_eq!(service.store().calls(), 0);
    }

    #[tokio::test]
    async fn excessive_expiration_is_rejected_before_store_access() {
        let service = ShortenerService::new(CountingStore::default());

        for minutes in [MAX_EXPIRATION_MINUTES + 1, 100_000_000_000, i64::MAX] {
            let err = service
                .shorten(ShortenParams::new("https://example.com", minutes))
                .await
                .unwrap_err();
            assert!(matches!(err, ShortenerError::InvalidInput(_)), "accepted {minutes}");
        }
        assert_eq!(service.store().calls(), 0);
    }

    #[tokio::test]
    async fn longest_expiration_still_expires() {
        let (service, clock) = test_service();

        let code = service
            .shorten(ShortenParams::new("https://example.com", MAX_EXPIRATION_MINUTES))
            .await
            .unwrap();

        clock.advance(SignedDuration::from_mins(MAX_EXPIRATION_MINUTES - 1));
        assert!(service.unshorten(code.as_str()).await.is_ok());

        clock.advance(SignedDuration::from_mins(1));
        let err = service.unshorten(code.as_str()).await.unwrap_err();
        assert!(matches!(err, ShortenerError::NotFound(_)));
    }

    #[tokio::test]
    async fn urls_with_whitespace_or_control_characters_are_rejected() {
        let service = ShortenerService::new(CountingStore::default());

        for url in [
            "https://example.com/a\nb",
            "https://example.com/a\tb",
            "https://example.com/a b",
            "https://example.com/\r",
            " https://example.com",
            "https://example.com/\u{7f}",
        ] {
            let err = service
                .shorten(ShortenParams::new(url, 60))
                .await
                .unwrap_err();
            assert!(matches!(err, ShortenerError::InvalidInput(_)), "accepted {url:?}");
        }
        assert_eq!(service.store().calls(), 0);
    }

    #[tokio::test]
    async fn malformed_urls_are_rejected() {
        let service = ShortenerService::new(CountingStore::default());

        for url in ["", "not-a-valid-url", "ftp://example.com", "https://"] {
            let err = service
                .shorten(ShortenParams::new(url, 60))
                .await
                .unwrap_err();
            assert!(matches!(err, ShortenerError::InvalidInput(_)), "accepted {url:?}");
        }
        assert_eq!(service.store().calls(), 0);
    }

    #[tokio::test]
    async fn store_outage_is_store_unavailable() {
        let service = ShortenerService::new(UnreachableStore);

        let err = service
            .shorten(ShortenParams::new("https://example.com", 60))
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::StoreUnavailable(_)));

        let err = service.unshorten("abc").await.unwrap_err();
        assert!(matches!(err, ShortenerError::StoreUnavailable(_)));

        let err = service.short_link_info("abc").await.unwrap_err();
        assert!(matches!(err, ShortenerError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn corrupt_detail_is_invalid_data() {
        let (service, _) = test_service();
        service
            .store()
            .set_with_ttl(&service.keyspace().detail("abc"), "not json", None)
            .await
            .unwrap();

        let err = service.short_link_info("abc").await.unwrap_err();
        assert!(matches!(err, ShortenerError::InvalidData(_)));
    }

    #[tokio::test]
    async fn concurrent_shortening_of_distinct_urls() {
        let (service, _) = test_service();
        let mut handles = vec![];

        for i in 0..32 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .shorten(ShortenParams::new(format!("https://example{i}.com"), 60))
                    .await
                    .unwrap()
            }));
        }

        let mut codes = HashSet::new();
        for handle in handles {
            codes.insert(handle.await.unwrap());
        }
        assert_eq!(codes.len(), 32);
    }
}
