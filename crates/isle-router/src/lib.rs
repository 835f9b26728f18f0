//! Client-side navigation for server-rendered module trees.
//!
//! This crate turns navigation intents into history changes plus
//! cache-backed content swaps:
//!
//! ```text
//! Link::on_click ──► NavigationController::navigate
//!                      ├─ History::push / replace      (urgent)
//!                      ├─ path updated                 (urgent)
//!                      └─ PayloadCache::fetch ──► tree swapped, scroll reset (transition)
//! ```
//!
//! Descendants read `{ path, is_pending }` and trigger navigation through a
//! `RouterContext`, without the controller being threaded through props.

mod context;
mod controller;
mod error;
mod history;
mod link;

pub use context::*;
pub use controller::*;
pub use error::*;
pub use history::*;
pub use link::*;
