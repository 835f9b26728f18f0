//! Lazy activation ("islands") for server-rendered module trees.
//!
//! This crate provides:
//! - `ComponentRegistry` - Type tag to module definition, with SSR preload
//! - `ModuleRenderer` - Decides per module: render now, suspend, or island
//! - `ActivationScheduler` - Per-island state machine driven by visibility and hover
//! - `VisibilityObserver` / `DeferredScheduler` - Platform capabilities it runs on
//! - `ModuleBoundary` - Contains a module's failure to that module
//! - `render_document` - Server document shell

mod boundary;
mod deferred;
mod document;
mod error;
mod island;
mod observer;
mod registry;
mod renderer;

pub use boundary::*;
pub use deferred::*;
pub use document::*;
pub use error::*;
pub use island::*;
pub use observer::*;
pub use registry::*;
pub use renderer::*;
