use crate::base62;
use crate::error::ShortenerError;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::Display;

/// A short code identifying a stored URL.
///
/// Generated codes are the base-62 encoding of a counter value. Codes
/// received from clients are parsed with [`ShortCode::parse`], which accepts
/// 1-11 characters of `[a-zA-Z0-9]`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortCode(SmolStr);

const MIN_LENGTH: usize = 1;
const MAX_LENGTH: usize = base62::MAX_ENCODED_LEN;

impl ShortCode {
    /// Creates a `ShortCode` by encoding a counter value in base 62.
    ///
    /// # Examples
    ///
    /// ```
    /// use tinyurl_core::ShortCode;
    ///
    /// assert_eq!(ShortCode::generated(62).as_str(), "10");
    /// ```
    pub fn generated(counter: u64) -> Self {
        Self(SmolStr::new(base62::encode(counter)))
    }

    /// Parses a client-supplied code after validating its shape.
    pub fn parse(code: impl AsRef<str>) -> std::result::Result<Self, ShortenerError> {
        let code = code.as_ref();
        Self::validate(code)?;
        Ok(Self(SmolStr::new(code)))
    }

    /// Returns `true` if `code` has the shape of a routable short code.
    pub fn is_valid(code: &str) -> bool {
        Self::validate(code).is_ok()
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(code: &str) -> std::result::Result<(), ShortenerError> {
        if code.len() < MIN_LENGTH || code.len() > MAX_LENGTH {
            return Err(ShortenerError::InvalidShortCode(format!(
                "length must be between {} and {}, got {}",
                MIN_LENGTH,
                MAX_LENGTH,
                code.len()
            )));
        }

        if !code.bytes().all(base62::is_symbol) {
            return Err(ShortenerError::InvalidShortCode(format!(
                "must contain only alphanumeric characters: '{}'",
                code
            )));
        }

        Ok(())
    }
}

impl AsRef<str> for ShortCode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Debug for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ShortCode").field(&self.0).finish()
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
