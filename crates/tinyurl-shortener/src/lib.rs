//! The shortening engine.
//!
//! [`ShortenerService`] implements the [`Shortener`] capability on top of any
//! [`KvStore`]: it deduplicates URLs by fingerprint, mints codes from the
//! store's atomic counter and writes the link, fingerprint and detail
//! records of a new code together under one TTL.
//!
//! [`Shortener`]: tinyurl_core::Shortener
//! [`KvStore`]: tinyurl_store::KvStore

pub mod keyspace;
pub mod service;

pub use keyspace::Keyspace;
pub use service::ShortenerService;
