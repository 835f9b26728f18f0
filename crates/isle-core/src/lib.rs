//! Core types for the island navigation runtime.
//!
//! This crate provides the vocabulary shared by every other crate:
//! - `RouteKey` - Normalized path+query identifying a fetchable tree
//! - `Payload` - Opaque serialized tree produced by the server
//! - `ModuleDef` / `PageData` - The module tree a page is made of
//! - `TransitionPriority` - Scheduling hint for state updates
//! - `IsleConfig` - Router, island and logging configuration

mod config;
mod page;
mod payload;
mod priority;
mod route;

pub use config::*;
pub use page::*;
pub use payload::*;
pub use priority::*;
pub use route::*;
