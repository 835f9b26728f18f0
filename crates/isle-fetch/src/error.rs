//! Fetch error types.

/// Error type for route fetches and server actions.
///
/// Errors are `Clone` because one settled failure is handed to every caller
/// waiting on the same cache entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Network error for {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Protocol error for {url}: expected content type text/x-component, got '{content_type}'")]
    Protocol { url: String, content_type: String },

    #[error("Request error: {0}")]
    Request(String),
}

impl FetchError {
    /// Check if this is a network-level failure (including non-success status).
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Network { .. })
    }

    /// Check if the response arrived but violated the payload protocol.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }

    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Error reported by an `HttpTransport` when no response was obtained.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    /// Create a transport error from any message.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}
