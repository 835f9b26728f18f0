//! Route payload caching for client-side navigation.
//!
//! This crate provides:
//! - `PayloadCache` - Route-keyed fetch memoization with in-flight dedupe
//! - `EntryStatus` - Lifecycle of a single cache entry
//! - `CacheStats` - Counters for observability
//!
//! # Example
//!
//! ```ignore
//! let cache = PayloadCache::new(Rc::new(PayloadClient::new(transport)), pool.spawner());
//!
//! // Warm the cache when the pointer enters a link
//! cache.prefetch(&key);
//!
//! // Later navigations reuse the same pull
//! let tree = cache.fetch(&key).await?;
//! ```

mod entry;
mod payload;

pub use entry::*;
pub use payload::*;
