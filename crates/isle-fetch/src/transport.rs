//! Pluggable HTTP transport.

use async_trait::async_trait;

use crate::error::TransportError;

/// Sends a single HTTP request on the current event loop.
///
/// Implemented by platform glue (browser fetch, a native client, test fakes).
/// Cookies and credentials are the transport's concern. Futures need not be
/// `Send`: the runtime is single-threaded.
#[async_trait(?Send)]
pub trait HttpTransport {
    /// Send a request and collect the full response body.
    async fn send(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Vec<u8>>, TransportError>;
}
