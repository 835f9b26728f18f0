//! Scripted `RouteFetcher` for tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use futures::channel::oneshot;
use isle_core::{Payload, RouteKey};

use crate::client::RouteFetcher;
use crate::error::FetchError;

type Reply = oneshot::Sender<Result<Payload, FetchError>>;

/// Fetcher whose requests stay pending until the test settles them.
///
/// Requests for the same route are settled in the order they were issued.
#[derive(Default)]
pub struct ManualFetcher {
    calls: RefCell<Vec<RouteKey>>,
    waiting: RefCell<HashMap<String, VecDeque<Reply>>>,
}

impl ManualFetcher {
    /// Create an empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every route fetched so far, in call order.
    pub fn calls(&self) -> Vec<RouteKey> {
        self.calls.borrow().clone()
    }

    /// Number of pulls issued for a route.
    pub fn call_count(&self, route: &str) -> usize {
        self.calls.borrow().iter().filter(|k| k.as_str() == route).count()
    }

    /// Number of requests still waiting for a reply.
    pub fn pending(&self) -> usize {
        self.waiting.borrow().values().map(VecDeque::len).sum()
    }

    /// Resolve the oldest pending request for `route`.
    pub fn resolve(&self, route: &str, payload: impl Into<Payload>) -> bool {
        self.settle(route, Ok(payload.into()))
    }

    /// Fail the oldest pending request for `route`.
    pub fn fail(&self, route: &str, error: FetchError) -> bool {
        self.settle(route, Err(error))
    }

    fn settle(&self, route: &str, result: Result<Payload, FetchError>) -> bool {
        let reply = self
            .waiting
            .borrow_mut()
            .get_mut(route)
            .and_then(VecDeque::pop_front);

        match reply {
            Some(tx) => tx.send(result).is_ok(),
            None => false,
        }
    }
}

#[async_trait(?Send)]
impl RouteFetcher for ManualFetcher {
    async fn fetch_route(&self, key: &RouteKey) -> Result<Payload, FetchError> {
        self.calls.borrow_mut().push(key.clone());

        let (tx, rx) = oneshot::channel();
        self.waiting
            .borrow_mut()
            .entry(key.as_str().to_string())
            .or_default()
            .push_back(tx);

        rx.await.unwrap_or_else(|_| {
            Err(FetchError::Network {
                url: key.partial_url(),
                reason: "request abandoned".to_string(),
            })
        })
    }
}
