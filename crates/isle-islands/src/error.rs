//! Error types for module resolution, rendering and activation.

/// Errors from the component registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Unknown module type: {0}")]
    UnknownModule(String),

    #[error("Module '{0}' has not been preloaded")]
    NotPreloaded(String),

    #[error("Failed to load module '{module}': {reason}")]
    LoadFailed { module: String, reason: String },
}

/// Errors raised while rendering a module.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("Invalid props: {0}")]
    InvalidProps(String),

    #[error("Render failed: {0}")]
    Failed(String),
}

/// Errors raised while activating an island.
///
/// These never leave the island: they are rendered in place by
/// `ModuleBoundary`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActivationError {
    #[error("Failed to resolve module '{module}': {source}")]
    Resolve {
        module: String,
        #[source]
        source: RegistryError,
    },

    #[error("Module '{module}' failed to render: {source}")]
    Render {
        module: String,
        #[source]
        source: RenderError,
    },

    #[error("Activation of '{module}' could not be scheduled: {reason}")]
    Schedule { module: String, reason: String },
}
