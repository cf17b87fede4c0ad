use tinyurl_core::Fingerprint;

/// The prefix every key of the default layout starts with.
pub const DEFAULT_PREFIX: &str = "go_tiny_url";

/// Layout of the keys the engine reads and writes.
///
/// | Purpose | Key |
/// |---|---|
/// | Global counter | `<prefix>:next.url.id` |
/// | Code → URL | `<prefix>:short_link:<code>:url` |
/// | Fingerprint → code | `<prefix>:url_hash:<fingerprint>:url` |
/// | Code → detail | `<prefix>:shortlink:<code>:detail` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyspace {
    prefix: String,
}

impl Keyspace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn counter(&self) -> String {
        format!("{}:next.url.id", self.prefix)
    }

    pub fn short_link(&self, code: &str) -> String {
        format!("{}:short_link:{}:url", self.prefix, code)
    }

    pub fn url_hash(&self, fingerprint: &Fingerprint) -> String {
        format!("{}:url_hash:{}:url", self.prefix, fingerprint)
    }

    pub fn detail(&self, code: &str) -> String {
        format!("{}:shortlink:{}:detail", self.prefix, code)
    }
}

impl Default for Keyspace {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}
