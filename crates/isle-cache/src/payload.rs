//! Deduplicating payload cache.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use futures::future::{self, FutureExt, LocalBoxFuture};
use futures::task::{LocalSpawn, LocalSpawnExt};
use isle_core::RouteKey;
use isle_fetch::{FetchError, RouteFetcher};

use crate::entry::{CacheEntry, CacheStats, EntryStatus, FetchResult};

/// Route-keyed memoization of server-rendered trees.
///
/// At most one pull is ever issued per route key. Concurrent callers share
/// the in-flight pull; once it settles, its value or error is kept for the
/// lifetime of the cache and handed to every later caller. There is no
/// expiry, eviction or automatic retry.
///
/// The cache is an ordinary value: create one per page session (or per test)
/// and hand it to the navigation controller and links.
pub struct PayloadCache {
    fetcher: Rc<dyn RouteFetcher>,
    spawner: Rc<dyn LocalSpawn>,
    entries: RefCell<HashMap<RouteKey, CacheEntry>>,
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl PayloadCache {
    /// Create a new cache pulling through `fetcher` on the event loop behind `spawner`.
    pub fn new(fetcher: Rc<dyn RouteFetcher>, spawner: impl LocalSpawn + 'static) -> Self {
        Self {
            fetcher,
            spawner: Rc::new(spawner),
            entries: RefCell::new(HashMap::new()),
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    /// Get the tree for a route, reusing in-flight or settled work.
    ///
    /// The lookup happens when this is called, not when the returned future
    /// is first polled, so two back-to-back calls always share one pull.
    pub fn fetch(&self, key: &RouteKey) -> LocalBoxFuture<'static, FetchResult> {
        if let Some(entry) = self.entries.borrow().get(key) {
            self.hits.set(self.hits.get() + 1);
            return match entry.settled() {
                Some(result) => future::ready(result).boxed_local(),
                None => entry.pull().boxed_local(),
            };
        }

        match self.start_pull(key) {
            Ok(entry) => {
                self.misses.set(self.misses.get() + 1);
                let pull = entry.pull();
                self.entries.borrow_mut().insert(key.clone(), entry);
                pull.boxed_local()
            }
            Err(error) => future::ready(Err(error)).boxed_local(),
        }
    }

    /// Warm the cache for a route; failures are logged and dropped.
    pub fn prefetch(&self, key: &RouteKey) {
        let pending = self.fetch(key);
        let route = key.clone();

        let watcher = async move {
            if let Err(error) = pending.await {
                tracing::warn!(route = %route, %error, "prefetch failed");
            }
        };

        if let Err(error) = self.spawner.spawn_local(watcher) {
            tracing::warn!(route = %key, %error, "prefetch could not be scheduled");
        }
    }

    /// Lifecycle of the entry for a route, if one exists.
    pub fn status(&self, key: &RouteKey) -> Option<EntryStatus> {
        self.entries.borrow().get(key).map(CacheEntry::status)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Check if the cache has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.borrow();
        let mut stats = CacheStats {
            entries: entries.len(),
            hits: self.hits.get(),
            misses: self.misses.get(),
            ..Default::default()
        };

        for entry in entries.values() {
            match entry.status() {
                EntryStatus::InFlight => stats.in_flight += 1,
                EntryStatus::Ready => stats.ready += 1,
                EntryStatus::Failed => stats.failed += 1,
            }
        }

        stats
    }

    fn start_pull(&self, key: &RouteKey) -> Result<CacheEntry, FetchError> {
        let settled = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&settled);
        let fetcher = Rc::clone(&self.fetcher);
        let route = key.clone();

        let pull = async move {
            let result = fetcher.fetch_route(&route).await;
            match &result {
                Ok(payload) => {
                    tracing::debug!(route = %route, bytes = payload.len(), "route payload cached");
                }
                Err(error) => {
                    tracing::warn!(route = %route, %error, "route fetch failed; caching error");
                }
            }
            *slot.borrow_mut() = Some(result.clone());
            result
        };

        let handle = self.spawner.spawn_local_with_handle(pull).map_err(|e| {
            tracing::error!(route = %key, error = %e, "event loop rejected route fetch");
            FetchError::Request(format!("cannot schedule fetch: {}", e))
        })?;

        Ok(CacheEntry::new(handle.shared(), settled))
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::LocalPool;
    use isle_core::Payload;
    use isle_fetch::testing::ManualFetcher;

    use super::*;

    fn key(s: &str) -> RouteKey {
        RouteKey::resolve(s, &"http://localhost/".parse().unwrap()).unwrap()
    }

    fn setup() -> (LocalPool, Rc<ManualFetcher>, PayloadCache) {
        let pool = LocalPool::new();
        let fetcher = Rc::new(ManualFetcher::new());
        let cache = PayloadCache::new(fetcher.clone(), pool.spawner());
        (pool, fetcher, cache)
    }

    fn not_found(route: &str) -> FetchError {
        FetchError::Http {
            status: 404,
            url: format!("{}?__rsc&__partial", route),
        }
    }

    // === Dedupe Tests ===

    #[test]
    fn test_concurrent_fetches_share_one_pull() {
        let (mut pool, fetcher, cache) = setup();
        let k = key("/about");

        let pending: Vec<_> = (0..5).map(|_| cache.fetch(&k)).collect();
        pool.run_until_stalled();
        assert_eq!(fetcher.call_count("/about"), 1);
        assert_eq!(cache.status(&k), Some(EntryStatus::InFlight));

        fetcher.resolve("/about", "about-tree");
        let results = pool.run_until(future::join_all(pending));

        assert!(results
            .iter()
            .all(|r| r.as_ref() == Ok(&Payload::from("about-tree"))));
        assert_eq!(fetcher.call_count("/about"), 1);
    }

    #[test]
    fn test_concurrent_fetches_share_one_error() {
        let (mut pool, fetcher, cache) = setup();
        let k = key("/broken");

        let first = cache.fetch(&k);
        let second = cache.fetch(&k);
        pool.run_until_stalled();
        fetcher.fail("/broken", not_found("/broken"));

        let (a, b) = pool.run_until(future::join(first, second));

        assert_eq!(a, Err(not_found("/broken")));
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_keys_pull_separately() {
        let (mut pool, fetcher, cache) = setup();

        let _home = cache.fetch(&key("/"));
        let _about = cache.fetch(&key("/about"));
        let _page2 = cache.fetch(&key("/about?page=2"));
        pool.run_until_stalled();

        assert_eq!(fetcher.calls().len(), 3);
        assert_eq!(cache.len(), 3);
    }

    // === Settled Entry Tests ===

    #[test]
    fn test_settled_value_is_reused() {
        let (mut pool, fetcher, cache) = setup();
        let k = key("/about");

        let first = cache.fetch(&k);
        pool.run_until_stalled();
        fetcher.resolve("/about", "about-tree");
        assert!(pool.run_until(first).is_ok());
        assert_eq!(cache.status(&k), Some(EntryStatus::Ready));

        let again = pool.run_until(cache.fetch(&k));

        assert_eq!(again, Ok(Payload::from("about-tree")));
        assert_eq!(fetcher.call_count("/about"), 1);
    }

    #[test]
    fn test_failed_entry_rethrows_without_retry() {
        let (mut pool, fetcher, cache) = setup();
        let k = key("/missing");

        let first = cache.fetch(&k);
        pool.run_until_stalled();
        fetcher.fail("/missing", not_found("/missing"));
        let first = pool.run_until(first);

        let second = pool.run_until(cache.fetch(&k));

        assert_eq!(first, Err(not_found("/missing")));
        assert_eq!(second, first);
        assert_eq!(cache.status(&k), Some(EntryStatus::Failed));
        assert_eq!(fetcher.call_count("/missing"), 1);
        assert_eq!(fetcher.pending(), 0);
    }

    // === Prefetch Tests ===

    #[test]
    fn test_back_to_back_prefetch_pulls_once() {
        let (mut pool, fetcher, cache) = setup();
        let k = key("/products");

        cache.prefetch(&k);
        cache.prefetch(&k);
        pool.run_until_stalled();

        assert_eq!(fetcher.call_count("/products"), 1);
    }

    #[test]
    fn test_prefetch_swallows_errors() {
        let (mut pool, fetcher, cache) = setup();
        let k = key("/flaky");

        cache.prefetch(&k);
        pool.run_until_stalled();
        fetcher.fail("/flaky", not_found("/flaky"));
        pool.run_until_stalled();

        assert_eq!(cache.status(&k), Some(EntryStatus::Failed));
    }

    #[test]
    fn test_prefetch_then_fetch_reuses_pull() {
        let (mut pool, fetcher, cache) = setup();
        let k = key("/products");

        cache.prefetch(&k);
        pool.run_until_stalled();
        let navigation = cache.fetch(&k);
        fetcher.resolve("/products", "products-tree");

        assert_eq!(pool.run_until(navigation), Ok(Payload::from("products-tree")));
        assert_eq!(fetcher.call_count("/products"), 1);
    }

    // === Stats Tests ===

    #[test]
    fn test_stats_track_entries_and_calls() {
        let (mut pool, fetcher, cache) = setup();

        let _a = cache.fetch(&key("/a"));
        let _a2 = cache.fetch(&key("/a"));
        let _b = cache.fetch(&key("/b"));
        pool.run_until_stalled();
        fetcher.resolve("/a", "a");
        fetcher.fail("/b", not_found("/b"));
        pool.run_until_stalled();

        let stats = cache.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.ready, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.in_flight, 0);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
    }
}
