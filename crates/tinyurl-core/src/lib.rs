//! Core types and traits for the tinyurl shortener.
//!
//! This crate provides the pieces shared by the shortening engine and the
//! HTTP gateway: the base-62 short code, the URL fingerprint, and the
//! [`Shortener`] capability the outer layers depend on.

pub mod base62;
pub mod error;
pub mod fingerprint;
pub mod shortcode;
pub mod shortener;

pub use error::ShortenerError;
pub use fingerprint::Fingerprint;
pub use shortcode::ShortCode;
pub use shortener::MAX_EXPIRATION_MINUTES;
pub use shortener::{ExpirationPolicy, LinkDetail, ShortenParams, Shortener};
