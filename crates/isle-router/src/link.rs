//! Navigable link behavior.

use crate::context::RouterContext;
use crate::controller::NavigateOptions;
use crate::error::RouterError;

/// A link that navigates client-side and prefetches on hover.
///
/// The host renders `<a href=...>` itself and forwards click and
/// pointer-enter events here; the default browser navigation must be
/// suppressed by the host when `on_click` is called.
#[derive(Debug, Clone)]
pub struct Link {
    href: String,
    options: NavigateOptions,
    prefetch: bool,
    router: RouterContext,
}

impl Link {
    /// Create a link inside a router subtree.
    ///
    /// Fails with `RouterError::NoRouter` when there is no enclosing router.
    pub fn new(href: impl Into<String>, router: Option<&RouterContext>) -> Result<Self, RouterError> {
        let router = router.ok_or(RouterError::NoRouter)?.clone();
        Ok(Self {
            href: href.into(),
            options: NavigateOptions::default(),
            prefetch: true,
            router,
        })
    }

    /// Replace the current history entry instead of pushing.
    pub fn with_replace(mut self, replace: bool) -> Self {
        self.options.replace = replace;
        self
    }

    /// Set whether to scroll to the top after navigating.
    pub fn with_scroll(mut self, scroll: bool) -> Self {
        self.options.scroll = Some(scroll);
        self
    }

    /// Enable or disable prefetch on hover.
    pub fn with_prefetch(mut self, prefetch: bool) -> Self {
        self.prefetch = prefetch;
        self
    }

    /// The link target.
    pub fn href(&self) -> &str {
        &self.href
    }

    /// Handle a click.
    pub fn on_click(&self) -> Result<(), RouterError> {
        self.router.navigate(&self.href, self.options)
    }

    /// Handle the pointer entering the link.
    pub fn on_pointer_enter(&self) {
        if self.prefetch {
            self.router.prefetch(&self.href);
        }
    }
}
