use sha1::{Digest, Sha1};
use std::fmt::Display;

/// A deterministic SHA-1 fingerprint of a URL, rendered as lower-case hex.
///
/// Fingerprints only deduplicate repeated shortening requests; they are not
/// used for anything security sensitive.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Computes the fingerprint of the raw URL string.
    pub fn of(url: &str) -> Self {
        let digest = Sha1::digest(url.as_bytes());
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
