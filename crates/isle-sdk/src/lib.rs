//! Public SDK for the isle client runtime.
//!
//! This crate re-exports all runtime functionality:
//!
//! ```ignore
//! use isle_sdk::prelude::*;
//!
//! let config = IsleConfig::load("isle.toml")?;
//! init_logging(&config.logging)?;
//!
//! let client = PayloadClient::new(BrowserTransport::default());
//! let cache = Rc::new(PayloadCache::new(Rc::new(client), spawner.clone()));
//! let controller = NavigationController::new(&config.router, cache, host, "/", initial_tree)?;
//!
//! let about = Link::new("/about", Some(&controller.context()))?;
//! about.on_pointer_enter(); // warms the cache
//! about.on_click()?;        // URL updates now, content when the fetch settles
//! ```

pub use isle_cache;
pub use isle_core;
pub use isle_fetch;
pub use isle_islands;
pub use isle_observability;
pub use isle_router;

/// Prelude for convenient imports.
pub mod prelude {
    pub use isle_cache::*;
    pub use isle_core::*;
    pub use isle_fetch::*;
    pub use isle_islands::*;
    pub use isle_observability::*;
    pub use isle_router::*;
}
