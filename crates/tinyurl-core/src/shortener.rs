use crate::error::{Result, ShortenerError};
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest lifetime a link may ask for: 100 years.
pub const MAX_EXPIRATION_MINUTES: i64 = 100 * 365 * 24 * 60;

/// Expiration policy for a shortened URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpirationPolicy {
    /// The shortened URL never expires.
    Never,
    /// The shortened URL expires after a certain duration from creation.
    AfterDuration(Duration),
}

impl ExpirationPolicy {
    /// Interprets a requested lifetime in minutes.
    ///
    /// Zero means the link never expires. Negative values and values above
    /// [`MAX_EXPIRATION_MINUTES`] are rejected.
    pub fn from_minutes(minutes: i64) -> Result<Self> {
        match minutes {
            m if m < 0 => Err(ShortenerError::InvalidInput(format!(
                "expiration must not be negative, got {m} minutes"
            ))),
            0 => Ok(Self::Never),
            m if m > MAX_EXPIRATION_MINUTES => Err(ShortenerError::InvalidInput(format!(
                "expiration must be at most {MAX_EXPIRATION_MINUTES} minutes, got {m}"
            ))),
            m => Ok(Self::AfterDuration(Duration::from_secs(m.unsigned_abs() * 60))),
        }
    }

    /// The time-to-live to attach to stored records, `None` for no expiry.
    pub fn ttl(&self) -> Option<Duration> {
        match self {
            Self::Never => None,
            Self::AfterDuration(duration) => Some(*duration),
        }
    }
}

/// Parameters for creating a shortened URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortenParams {
    /// The original URL to be shortened.
    pub original_url: String,
    /// Requested lifetime in minutes; `0` keeps the link forever.
    pub expiration_in_minutes: i64,
}

impl ShortenParams {
    pub fn new(original_url: impl Into<String>, expiration_in_minutes: i64) -> Self {
        Self {
            original_url: original_url.into(),
            expiration_in_minutes,
        }
    }
}

/// The detail document stored alongside every short link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDetail {
    pub url: String,
    /// Creation time, serialized as an RFC 3339 timestamp.
    pub created_at: Timestamp,
    pub expiration_in_minutes: u64,
}

/// The capability the HTTP layer depends on.
///
/// Lookups take the code as an opaque string: codes that were never minted
/// and codes whose records expired both fail with
/// [`ShortenerError::NotFound`].
#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Shortens a URL, reusing the live code if the same URL was shortened before.
    async fn shorten(&self, params: ShortenParams) -> Result<ShortCode>;

    /// Resolves a short code to its original URL.
    async fn unshorten(&self, code: &str) -> Result<String>;

    /// Returns the detail document of a short code.
    async fn short_link_info(&self, code: &str) -> Result<LinkDetail>;
}
