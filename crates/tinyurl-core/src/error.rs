use thiserror::Error;

/// Result type for shortener operations.
pub type Result<T> = std::result::Result<T, ShortenerError>;

#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    /// The short code was never minted or its records have expired.
    #[error("short link not found: {0}")]
    NotFound(String),
    /// The key/value store could not be reached or did not answer in time.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    /// A stored value could not be interpreted.
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}
