//! Navigation controller.

use std::cell::Cell;
use std::rc::Rc;

use futures::task::{LocalSpawn, LocalSpawnExt};
use isle_cache::{FetchResult, PayloadCache};
use isle_core::{Payload, RouteKey, RouterConfig, SupersedePolicy, TransitionPriority};
use tokio::sync::watch;
use url::{Position, Url};

use crate::context::{ContentState, NavigationState, PriorityReceiver, RouterContext, RouterSubscription};
use crate::error::RouterError;
use crate::history::{History, ScrollHost};

/// Options for a single navigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing one.
    pub replace: bool,
    /// Scroll to the top once the new tree is applied. `None` follows the
    /// router configuration; only an explicit `Some(false)` disables it.
    pub scroll: Option<bool>,
}

impl NavigateOptions {
    /// Replace the current history entry.
    pub fn replace() -> Self {
        Self {
            replace: true,
            scroll: None,
        }
    }

    /// Set whether to scroll to the top.
    pub fn with_scroll(mut self, scroll: bool) -> Self {
        self.scroll = Some(scroll);
        self
    }
}

/// Platform capabilities a controller drives.
#[derive(Clone)]
pub struct RouterHost {
    pub history: Rc<dyn History>,
    pub scroll: Rc<dyn ScrollHost>,
    /// Event loop the fetch continuations run on.
    pub spawner: Rc<dyn LocalSpawn>,
}

/// Orchestrates client-side route transitions.
///
/// ```text
/// Idle ──navigate/popstate──► Pending ──fetch ok──► Idle (tree replaced)
///                                     └─fetch err─► Idle (tree kept, error logged)
/// ```
///
/// There is no cancellation: a superseded fetch keeps running. With
/// `SupersedePolicy::LatestRequested` its result is discarded when it
/// settles; with `SupersedePolicy::LastResolved` whichever fetch settles
/// last is applied, even if it was requested first.
pub struct NavigationController {
    inner: Rc<ControllerInner>,
}

pub(crate) struct ControllerInner {
    origin: Url,
    scroll_to_top: bool,
    supersede: SupersedePolicy,
    cache: Rc<PayloadCache>,
    host: RouterHost,
    path: watch::Sender<RouteKey>,
    content: watch::Sender<ContentState>,
    /// Incremented by every navigation; tags fetch continuations.
    generation: Cell<u64>,
}

impl NavigationController {
    /// Create a controller showing the server-rendered `initial_tree` at `initial_path`.
    pub fn new(
        config: &RouterConfig,
        cache: Rc<PayloadCache>,
        host: RouterHost,
        initial_path: &str,
        initial_tree: Payload,
    ) -> Result<Self, RouterError> {
        let origin = config.origin_url()?;
        let path = RouteKey::resolve(initial_path, &origin)?;
        let (path, _) = watch::channel(path);
        let (content, _) = watch::channel(ContentState {
            tree: initial_tree,
            is_pending: false,
        });

        Ok(Self {
            inner: Rc::new(ControllerInner {
                origin,
                scroll_to_top: config.scroll_to_top,
                supersede: config.supersede,
                cache,
                host,
                path,
                content,
                generation: Cell::new(0),
            }),
        })
    }

    /// Navigate to `target`.
    ///
    /// History and `path` are updated before this returns; the tree is
    /// swapped later, when the payload arrives.
    pub fn navigate(&self, target: &str, options: NavigateOptions) -> Result<(), RouterError> {
        self.inner.navigate(target, options)
    }

    /// React to a browser back/forward move.
    ///
    /// Re-derives the path from the current location and swaps the tree,
    /// without touching history.
    pub fn handle_popstate(&self) -> Result<(), RouterError> {
        self.inner.handle_popstate()
    }

    /// Handle for descendants.
    pub fn context(&self) -> RouterContext {
        RouterContext::new(Rc::clone(&self.inner))
    }

    /// Current navigation state.
    pub fn state(&self) -> NavigationState {
        self.inner.snapshot()
    }

    /// The cache this controller fetches through.
    pub fn cache(&self) -> &Rc<PayloadCache> {
        &self.inner.cache
    }
}

impl ControllerInner {
    pub(crate) fn navigate(self: &Rc<Self>, target: &str, options: NavigateOptions) -> Result<(), RouterError> {
        let url = self.resolve_url(target)?;
        let key = RouteKey::from_url(&url);

        // History keeps the fragment; the cache key does not.
        let location = &url[Position::BeforePath..];
        if options.replace {
            self.host.history.replace(location);
        } else {
            self.host.history.push(location);
        }

        tracing::debug!(route = %key, replace = options.replace, "navigating");

        let scroll = options.scroll.unwrap_or(self.scroll_to_top);
        self.transition(key, scroll)
    }

    fn handle_popstate(self: &Rc<Self>) -> Result<(), RouterError> {
        let location = self.host.history.location();
        let key = self.resolve(&location)?;

        tracing::debug!(route = %key, "history traversal");

        self.transition(key, false)
    }

    pub(crate) fn resolve(&self, target: &str) -> Result<RouteKey, RouterError> {
        Ok(RouteKey::resolve(target, &self.origin)?)
    }

    fn resolve_url(&self, target: &str) -> Result<Url, RouterError> {
        Ok(RouteKey::resolve_url(target, &self.origin)?)
    }

    pub(crate) fn cache(&self) -> &PayloadCache {
        &self.cache
    }

    pub(crate) fn snapshot(&self) -> NavigationState {
        let content = self.content.borrow();
        NavigationState {
            path: self.path.borrow().clone(),
            tree: content.tree.clone(),
            is_pending: content.is_pending,
        }
    }

    pub(crate) fn subscribe(&self) -> RouterSubscription {
        RouterSubscription {
            path: PriorityReceiver::new(TransitionPriority::Urgent, self.path.subscribe()),
            content: PriorityReceiver::new(TransitionPriority::Transition, self.content.subscribe()),
        }
    }

    /// Shared tail of `navigate` and popstate: path now, tree later.
    fn transition(self: &Rc<Self>, key: RouteKey, scroll: bool) -> Result<(), RouterError> {
        self.path.send_replace(key.clone());

        let generation = self.generation.get() + 1;
        self.generation.set(generation);

        self.content.send_modify(|content| content.is_pending = true);

        let pending = self.cache.fetch(&key);
        let this = Rc::downgrade(self);
        let continuation = async move {
            let result = pending.await;
            if let Some(this) = this.upgrade() {
                this.settle(generation, &key, result, scroll);
            }
        };

        self.host.spawner.spawn_local(continuation).map_err(|e| {
            self.content.send_modify(|content| content.is_pending = false);
            RouterError::Schedule(e.to_string())
        })
    }

    fn settle(&self, generation: u64, key: &RouteKey, result: FetchResult, scroll: bool) {
        let latest = self.generation.get();
        if self.supersede == SupersedePolicy::LatestRequested && generation != latest {
            tracing::debug!(route = %key, generation, latest, "discarding superseded navigation");
            return;
        }

        match result {
            Ok(tree) => {
                self.content.send_modify(|content| {
                    content.tree = tree;
                    content.is_pending = false;
                });
                if scroll {
                    self.host.scroll.scroll_to_top();
                }
                tracing::debug!(route = %key, "navigation committed");
            }
            Err(error) => {
                tracing::error!(route = %key, %error, "navigation failed; keeping current tree");
                self.content.send_modify(|content| content.is_pending = false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use futures::executor::LocalPool;
    use isle_fetch::testing::ManualFetcher;
    use isle_fetch::FetchError;

    use super::*;
    use crate::history::MemoryHistory;

    #[derive(Default)]
    struct CountingScroll(Cell<usize>);

    impl ScrollHost for CountingScroll {
        fn scroll_to_top(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    struct Harness {
        pool: LocalPool,
        fetcher: Rc<ManualFetcher>,
        history: Rc<MemoryHistory>,
        scroll: Rc<CountingScroll>,
        controller: NavigationController,
    }

    fn harness(supersede: SupersedePolicy) -> Harness {
        let pool = LocalPool::new();
        let fetcher = Rc::new(ManualFetcher::new());
        let cache = Rc::new(PayloadCache::new(fetcher.clone(), pool.spawner()));
        let history = Rc::new(MemoryHistory::new("/"));
        let scroll = Rc::new(CountingScroll::default());
        let host = RouterHost {
            history: history.clone(),
            scroll: scroll.clone(),
            spawner: Rc::new(pool.spawner()),
        };
        let config = RouterConfig::default().with_supersede(supersede);
        let controller =
            NavigationController::new(&config, cache, host, "/", Payload::from("home")).unwrap();

        Harness {
            pool,
            fetcher,
            history,
            scroll,
            controller,
        }
    }

    // === Navigate Tests ===

    #[test]
    fn test_navigate_updates_history_and_path_synchronously() {
        let h = harness(SupersedePolicy::LatestRequested);

        h.controller.navigate("/about", NavigateOptions::default()).unwrap();

        let state = h.controller.state();
        assert_eq!(state.path.as_str(), "/about");
        assert!(state.is_pending);
        assert_eq!(state.tree, Payload::from("home"));
        assert_eq!(h.history.entries(), vec!["/", "/about"]);
    }

    #[test]
    fn test_history_keeps_fragment_cache_key_drops_it() {
        let mut h = harness(SupersedePolicy::LatestRequested);

        h.controller.navigate("/docs?v=2#install", NavigateOptions::default()).unwrap();
        h.pool.run_until_stalled();

        assert_eq!(h.history.entries(), vec!["/", "/docs?v=2#install"]);
        assert_eq!(h.controller.state().path.as_str(), "/docs?v=2");
        assert_eq!(h.fetcher.call_count("/docs?v=2"), 1);
    }

    #[test]
    fn test_navigate_replace_does_not_push() {
        let h = harness(SupersedePolicy::LatestRequested);

        h.controller.navigate("/x", NavigateOptions::replace()).unwrap();

        assert_eq!(h.history.entries(), vec!["/x"]);
        assert_eq!(h.controller.state().path.as_str(), "/x");
    }

    #[test]
    fn test_resolution_swaps_tree_and_scrolls() {
        let mut h = harness(SupersedePolicy::LatestRequested);

        h.controller.navigate("/about", NavigateOptions::default()).unwrap();
        h.pool.run_until_stalled();
        h.fetcher.resolve("/about", "about");
        h.pool.run_until_stalled();

        let state = h.controller.state();
        assert_eq!(state.tree, Payload::from("about"));
        assert!(!state.is_pending);
        assert_eq!(h.scroll.0.get(), 1);
    }

    #[test]
    fn test_scroll_disabled_explicitly() {
        let mut h = harness(SupersedePolicy::LatestRequested);

        h.controller
            .navigate("/about", NavigateOptions::default().with_scroll(false))
            .unwrap();
        h.pool.run_until_stalled();
        h.fetcher.resolve("/about", "about");
        h.pool.run_until_stalled();

        assert_eq!(h.controller.state().tree, Payload::from("about"));
        assert_eq!(h.scroll.0.get(), 0);
    }

    #[test]
    fn test_failure_keeps_tree_and_clears_pending() {
        let mut h = harness(SupersedePolicy::LatestRequested);

        h.controller.navigate("/missing", NavigateOptions::default()).unwrap();
        h.pool.run_until_stalled();
        h.fetcher.fail(
            "/missing",
            FetchError::Http {
                status: 404,
                url: "/missing?__rsc&__partial".to_string(),
            },
        );
        h.pool.run_until_stalled();

        let state = h.controller.state();
        assert_eq!(state.path.as_str(), "/missing");
        assert_eq!(state.tree, Payload::from("home"));
        assert!(!state.is_pending);
        assert_eq!(h.scroll.0.get(), 0);
    }

    #[test]
    fn test_invalid_target_is_rejected_before_history() {
        let h = harness(SupersedePolicy::LatestRequested);

        let err = h
            .controller
            .navigate("https://elsewhere.example/", NavigateOptions::default())
            .unwrap_err();

        assert!(matches!(err, RouterError::Route(_)));
        assert_eq!(h.history.len(), 1);
        assert!(!h.controller.state().is_pending);
    }

    // === Popstate Tests ===

    #[test]
    fn test_popstate_swaps_without_touching_history() {
        let mut h = harness(SupersedePolicy::LatestRequested);
        h.controller.navigate("/about", NavigateOptions::default()).unwrap();
        h.pool.run_until_stalled();
        h.fetcher.resolve("/about", "about");
        h.pool.run_until_stalled();

        h.history.back();
        h.controller.handle_popstate().unwrap();

        assert_eq!(h.controller.state().path.as_str(), "/");
        h.pool.run_until_stalled();
        h.fetcher.resolve("/", "home-again");
        h.pool.run_until_stalled();

        let state = h.controller.state();
        assert_eq!(state.tree, Payload::from("home-again"));
        assert!(!state.is_pending);
        assert_eq!(h.history.len(), 2);
        assert_eq!(h.scroll.0.get(), 1);
    }

    // === Supersede Tests ===

    #[test]
    fn test_latest_requested_ignores_stale_resolution() {
        let mut h = harness(SupersedePolicy::LatestRequested);

        h.controller.navigate("/a", NavigateOptions::default()).unwrap();
        h.controller.navigate("/b", NavigateOptions::default()).unwrap();
        h.pool.run_until_stalled();

        h.fetcher.resolve("/b", "b");
        h.pool.run_until_stalled();
        h.fetcher.resolve("/a", "a");
        h.pool.run_until_stalled();

        let state = h.controller.state();
        assert_eq!(state.path.as_str(), "/b");
        assert_eq!(state.tree, Payload::from("b"));
        assert!(!state.is_pending);
    }

    #[test]
    fn test_latest_requested_stays_pending_until_latest_settles() {
        let mut h = harness(SupersedePolicy::LatestRequested);

        h.controller.navigate("/a", NavigateOptions::default()).unwrap();
        h.controller.navigate("/b", NavigateOptions::default()).unwrap();
        h.pool.run_until_stalled();
        h.fetcher.resolve("/a", "a");
        h.pool.run_until_stalled();

        let state = h.controller.state();
        assert!(state.is_pending);
        assert_eq!(state.tree, Payload::from("home"));
    }

    #[test]
    fn test_last_resolved_known_race_applies_older_tree() {
        // Out-of-order settlement lets the older request overwrite the newer one.
        let mut h = harness(SupersedePolicy::LastResolved);

        h.controller.navigate("/a", NavigateOptions::default()).unwrap();
        h.controller.navigate("/b", NavigateOptions::default()).unwrap();
        h.pool.run_until_stalled();

        h.fetcher.resolve("/b", "b");
        h.pool.run_until_stalled();
        h.fetcher.resolve("/a", "a");
        h.pool.run_until_stalled();

        let state = h.controller.state();
        assert_eq!(state.path.as_str(), "/b");
        assert_eq!(state.tree, Payload::from("a"));
    }

    // === Broadcast Tests ===

    #[test]
    fn test_path_and_content_broadcast_at_their_priorities() {
        let mut h = harness(SupersedePolicy::LatestRequested);
        let mut sub = h.controller.context().subscribe();
        assert_eq!(sub.path.priority(), TransitionPriority::Urgent);
        assert_eq!(sub.content.priority(), TransitionPriority::Transition);

        h.controller.navigate("/about", NavigateOptions::default()).unwrap();

        assert!(sub.path.has_changed().unwrap());
        assert_eq!(sub.path.borrow_and_update().as_str(), "/about");
        assert!(sub.content.has_changed().unwrap());
        {
            let content = sub.content.borrow_and_update();
            assert!(content.is_pending);
            assert_eq!(content.tree, Payload::from("home"));
        }

        h.pool.run_until_stalled();
        h.fetcher.resolve("/about", "about");
        h.pool.run_until_stalled();

        assert!(!sub.path.has_changed().unwrap());
        assert!(sub.content.has_changed().unwrap());
        let content = sub.content.borrow_and_update();
        assert_eq!(content.tree, Payload::from("about"));
        assert!(!content.is_pending);
    }
}
