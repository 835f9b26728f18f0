//! Scheduling hints for state updates.

/// Priority the host renderer should give a state update.
///
/// `Transition` updates may be interrupted or deferred by the renderer so
/// user input stays responsive; the previous tree stays on screen until the
/// transition commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPriority {
    /// Must be reflected immediately (URL and path changes).
    #[default]
    Urgent,
    /// Low priority, interruptible (content swaps, pending flags).
    Transition,
}

impl TransitionPriority {
    /// Check if the renderer may defer this update.
    pub fn is_interruptible(&self) -> bool {
        matches!(self, Self::Transition)
    }
}
