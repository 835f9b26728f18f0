//! Observability infrastructure for the isle client runtime.
//!
//! This crate provides:
//! - `init_logging` - Installs the global `tracing` subscriber from `LogConfig`
//! - `build_filter` - The filter `init_logging` would use
//!
//! Every other crate only emits events through `tracing` macros, with
//! `route`, `module` and `key` as the common structured fields.

mod logging;

pub use logging::*;

pub use isle_core::{LogConfig, LogFormat};
