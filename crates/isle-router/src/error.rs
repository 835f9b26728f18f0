//! Error types for navigation.

use isle_core::{ConfigError, RouteError};

/// Errors that can occur when navigating.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// A link was created outside of a router subtree.
    #[error("Link must be used within a Router")]
    NoRouter,

    /// The navigation target could not be resolved.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// Router configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The event loop refused the fetch continuation.
    #[error("Failed to schedule navigation: {0}")]
    Schedule(String),
}
