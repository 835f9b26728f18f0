//! Payload client over an `HttpTransport`.

use async_trait::async_trait;
use isle_core::{Payload, RouteKey};

use crate::error::FetchError;
use crate::protocol::{action_request, payload_from_response, route_request, ACTION_ENDPOINT};
use crate::transport::HttpTransport;

/// Pulls the serialized tree for a route.
///
/// The payload cache depends only on this trait, so tests can substitute a
/// fake that resolves on demand.
#[async_trait(?Send)]
pub trait RouteFetcher {
    /// Fetch the tree for `key`.
    async fn fetch_route(&self, key: &RouteKey) -> Result<Payload, FetchError>;
}

/// Client for partial route fetches and server action calls.
pub struct PayloadClient<T: HttpTransport> {
    transport: T,
}

impl<T: HttpTransport> PayloadClient<T> {
    /// Create a new client over a transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Fetch the partial tree for a route.
    pub async fn fetch_route(&self, key: &RouteKey) -> Result<Payload, FetchError> {
        let url = key.partial_url();
        let request = route_request(key)?;

        tracing::debug!(route = %key, "fetching partial tree");

        let response = self.transport.send(request).await.map_err(|e| FetchError::Network {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        payload_from_response(&url, response)
    }

    /// Invoke a server action with JSON-encoded arguments.
    pub async fn call_server(
        &self,
        action_id: &str,
        args: &[serde_json::Value],
    ) -> Result<Payload, FetchError> {
        let request = action_request(action_id, args)?;

        tracing::debug!(action = action_id, args = args.len(), "calling server action");

        let response = self.transport.send(request).await.map_err(|e| FetchError::Network {
            url: ACTION_ENDPOINT.to_string(),
            reason: e.to_string(),
        })?;

        payload_from_response(ACTION_ENDPOINT, response)
    }

    /// Get the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[async_trait(?Send)]
impl<T: HttpTransport> RouteFetcher for PayloadClient<T> {
    async fn fetch_route(&self, key: &RouteKey) -> Result<Payload, FetchError> {
        PayloadClient::fetch_route(self, key).await
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use futures::executor::block_on;
    use http::header::CONTENT_TYPE;

    use super::*;
    use crate::error::TransportError;
    use crate::protocol::{ACTION_HEADER, RSC_CONTENT_TYPE};

    /// Transport answering every request with one canned response.
    struct CannedTransport {
        status: u16,
        content_type: &'static str,
        fail: bool,
        seen: RefCell<Vec<http::Request<Vec<u8>>>>,
    }

    impl CannedTransport {
        fn ok() -> Self {
            Self {
                status: 200,
                content_type: RSC_CONTENT_TYPE,
                fail: false,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    #[async_trait(?Send)]
    impl HttpTransport for CannedTransport {
        async fn send(
            &self,
            request: http::Request<Vec<u8>>,
        ) -> Result<http::Response<Vec<u8>>, TransportError> {
            self.seen.borrow_mut().push(request);
            if self.fail {
                return Err(TransportError::new("connection reset"));
            }
            Ok(http::Response::builder()
                .status(self.status)
                .header(CONTENT_TYPE, self.content_type)
                .body(b"tree".to_vec())
                .unwrap())
        }
    }

    fn key(s: &str) -> RouteKey {
        RouteKey::resolve(s, &"http://localhost/".parse().unwrap()).unwrap()
    }

    #[test]
    fn test_fetch_route_success() {
        let client = PayloadClient::new(CannedTransport::ok());

        let payload = block_on(client.fetch_route(&key("/about"))).unwrap();

        assert_eq!(payload, Payload::from("tree"));
        let seen = client.transport().seen.borrow();
        assert_eq!(seen[0].uri(), "/about?__rsc&__partial");
    }

    #[test]
    fn test_fetch_route_transport_failure() {
        let client = PayloadClient::new(CannedTransport {
            fail: true,
            ..CannedTransport::ok()
        });

        let err = block_on(client.fetch_route(&key("/about"))).unwrap_err();

        assert!(err.is_network());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_fetch_route_wrong_content_type() {
        let client = PayloadClient::new(CannedTransport {
            content_type: "application/json",
            ..CannedTransport::ok()
        });

        let err = block_on(client.fetch_route(&key("/about"))).unwrap_err();
        assert!(err.is_protocol());
    }

    #[test]
    fn test_call_server_posts_action() {
        let client = PayloadClient::new(CannedTransport::ok());

        let payload = block_on(client.call_server("like", &[serde_json::json!(42)])).unwrap();

        assert_eq!(payload, Payload::from("tree"));
        let seen = client.transport().seen.borrow();
        assert_eq!(seen[0].headers()[ACTION_HEADER], "like");
        assert_eq!(seen[0].body().as_slice(), b"[42]");
    }

    #[test]
    fn test_route_fetcher_impl_delegates() {
        let client = PayloadClient::new(CannedTransport::ok());
        let fetcher: &dyn RouteFetcher = &client;

        assert!(block_on(fetcher.fetch_route(&key("/"))).is_ok());
    }
}
