//! Router state shared with descendants.

use std::rc::Rc;

use isle_core::{Payload, RouteKey, TransitionPriority};
use tokio::sync::watch;
use tokio::sync::watch::error::RecvError;

use crate::controller::{ControllerInner, NavigateOptions};
use crate::error::RouterError;

/// Full navigation state owned by a controller.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationState {
    /// Path the URL bar shows; updated as soon as navigation is requested.
    pub path: RouteKey,
    /// Tree currently rendered; updated when the fetch resolves.
    pub tree: Payload,
    /// True between a navigation request and its fetch settling.
    pub is_pending: bool,
}

/// The part of the state that changes at transition priority.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentState {
    pub tree: Payload,
    pub is_pending: bool,
}

/// A state channel tagged with the priority its updates carry.
#[derive(Debug, Clone)]
pub struct PriorityReceiver<T> {
    priority: TransitionPriority,
    receiver: watch::Receiver<T>,
}

impl<T> PriorityReceiver<T> {
    pub(crate) fn new(priority: TransitionPriority, receiver: watch::Receiver<T>) -> Self {
        Self { priority, receiver }
    }

    /// How the host renderer should schedule updates from this channel.
    pub fn priority(&self) -> TransitionPriority {
        self.priority
    }

    /// Check if a value was sent since the last one seen.
    pub fn has_changed(&self) -> Result<bool, RecvError> {
        self.receiver.has_changed()
    }

    /// Latest value, marking it seen.
    pub fn borrow_and_update(&mut self) -> watch::Ref<'_, T> {
        self.receiver.borrow_and_update()
    }

    /// Wait for the next value.
    pub async fn changed(&mut self) -> Result<(), RecvError> {
        self.receiver.changed().await
    }
}

/// Router state changes, split by priority.
///
/// Path changes are urgent and must be reflected immediately. Tree swaps
/// and pending-flag changes are interruptible; the host may defer them to
/// keep input responsive.
#[derive(Debug, Clone)]
pub struct RouterSubscription {
    pub path: PriorityReceiver<RouteKey>,
    pub content: PriorityReceiver<ContentState>,
}

impl NavigationState {
    /// The read-only subset handed to descendants.
    pub fn view(&self) -> RouterView {
        RouterView {
            path: self.path.clone(),
            is_pending: self.is_pending,
        }
    }
}

/// What descendants may read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterView {
    pub path: RouteKey,
    pub is_pending: bool,
}

/// Handle to the enclosing router, cheap to clone.
#[derive(Clone)]
pub struct RouterContext {
    inner: Rc<ControllerInner>,
}

impl RouterContext {
    pub(crate) fn new(inner: Rc<ControllerInner>) -> Self {
        Self { inner }
    }

    /// Current path and pending flag.
    pub fn view(&self) -> RouterView {
        self.inner.snapshot().view()
    }

    /// Current full state, including the rendered tree.
    pub fn state(&self) -> NavigationState {
        self.inner.snapshot()
    }

    /// Receive state changes, urgent and interruptible ones apart.
    pub fn subscribe(&self) -> RouterSubscription {
        self.inner.subscribe()
    }

    /// Navigate to `target`.
    pub fn navigate(&self, target: &str, options: NavigateOptions) -> Result<(), RouterError> {
        self.inner.navigate(target, options)
    }

    /// Warm the payload cache for `target`.
    pub fn prefetch(&self, target: &str) {
        match self.inner.resolve(target) {
            Ok(key) => self.inner.cache().prefetch(&key),
            Err(error) => tracing::warn!(href = target, %error, "cannot prefetch"),
        }
    }
}

impl std::fmt::Debug for RouterContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterContext")
            .field("view", &self.view())
            .finish()
    }
}
