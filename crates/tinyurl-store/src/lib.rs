//! Key/value store adapters for the tinyurl shortener.
//!
//! The shortening engine only needs a handful of primitives from its store:
//! reads that treat a miss as a normal outcome, writes with an optional
//! time-to-live, an atomic multi-key write and a native atomic counter.
//! [`KvStore`] captures that surface; [`RedisStore`] implements it on top of
//! Redis and [`InMemoryStore`] keeps everything in process for tests and
//! single-node setups.

pub mod clock;
pub mod error;
pub mod memory;
pub mod redis;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use crate::redis::{RedisStore, RedisStoreSettings};
pub use store::KvStore;
