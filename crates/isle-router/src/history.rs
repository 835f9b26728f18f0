//! Browser history and scroll capabilities.

use std::cell::{Cell, RefCell};

/// Session history keyed only by URL.
///
/// Entries carry no custom state object. When the user moves back or
/// forward the platform updates the location first and then tells the
/// controller through `NavigationController::handle_popstate`.
pub trait History {
    /// Add a new entry and make it current.
    fn push(&self, url: &str);

    /// Overwrite the current entry.
    fn replace(&self, url: &str);

    /// Path and query of the current entry.
    fn location(&self) -> String;
}

/// Resets the document scroll position.
pub trait ScrollHost {
    /// Scroll to the top-left corner.
    fn scroll_to_top(&self);
}

/// Scroll host for surfaces without a scroll position.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoScroll;

impl ScrollHost for NoScroll {
    fn scroll_to_top(&self) {}
}

/// In-memory history for headless hosts and tests.
#[derive(Debug)]
pub struct MemoryHistory {
    entries: RefCell<Vec<String>>,
    index: Cell<usize>,
}

impl MemoryHistory {
    /// Create a history with a single entry.
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: RefCell::new(vec![initial.into()]),
            index: Cell::new(0),
        }
    }

    /// Move one entry back, returning the new location.
    pub fn back(&self) -> Option<String> {
        let index = self.index.get().checked_sub(1)?;
        self.index.set(index);
        Some(self.location())
    }

    /// Move one entry forward, returning the new location.
    pub fn forward(&self) -> Option<String> {
        let index = self.index.get() + 1;
        if index >= self.entries.borrow().len() {
            return None;
        }
        self.index.set(index);
        Some(self.location())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Check if the history has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }
}

impl History for MemoryHistory {
    fn push(&self, url: &str) {
        let mut entries = self.entries.borrow_mut();
        entries.truncate(self.index.get() + 1);
        entries.push(url.to_string());
        self.index.set(entries.len() - 1);
    }

    fn replace(&self, url: &str) {
        let mut entries = self.entries.borrow_mut();
        entries[self.index.get()] = url.to_string();
    }

    fn location(&self) -> String {
        self.entries.borrow()[self.index.get()].clone()
    }
}
