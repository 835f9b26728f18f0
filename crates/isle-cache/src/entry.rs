//! Cache entries and their lifecycle.

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::{RemoteHandle, Shared};
use isle_core::Payload;
use isle_fetch::FetchError;

/// Outcome of a single pull.
pub type FetchResult = Result<Payload, FetchError>;

pub(crate) type SharedPull = Shared<RemoteHandle<FetchResult>>;

/// Lifecycle of a cache entry.
///
/// An entry only moves forward: `InFlight` to either `Ready` or `Failed`,
/// after which it never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// The pull has been issued and has not settled.
    InFlight,
    /// The pull produced a tree.
    Ready,
    /// The pull failed; the error is replayed to later callers.
    Failed,
}

/// Cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries (one per distinct route key).
    pub entries: usize,
    /// Entries still waiting on their pull.
    pub in_flight: usize,
    /// Entries holding a tree.
    pub ready: usize,
    /// Entries holding an error.
    pub failed: usize,
    /// Calls served by an existing entry, settled or not.
    pub hits: u64,
    /// Calls that created an entry and issued a pull.
    pub misses: u64,
}

/// One route's pull and, once settled, its result.
pub(crate) struct CacheEntry {
    pull: SharedPull,
    settled: Rc<RefCell<Option<FetchResult>>>,
}

impl CacheEntry {
    pub(crate) fn new(pull: SharedPull, settled: Rc<RefCell<Option<FetchResult>>>) -> Self {
        Self { pull, settled }
    }

    pub(crate) fn status(&self) -> EntryStatus {
        match &*self.settled.borrow() {
            None => EntryStatus::InFlight,
            Some(Ok(_)) => EntryStatus::Ready,
            Some(Err(_)) => EntryStatus::Failed,
        }
    }

    pub(crate) fn settled(&self) -> Option<FetchResult> {
        self.settled.borrow().clone()
    }

    pub(crate) fn pull(&self) -> SharedPull {
        self.pull.clone()
    }
}
