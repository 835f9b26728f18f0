//! Wire protocol for fetching server-rendered trees.
//!
//! This crate provides:
//! - `HttpTransport` - Platform hook that actually sends requests
//! - `PayloadClient` - Partial route fetch and server action calls
//! - `RouteFetcher` - What the payload cache pulls trees through
//! - `FetchError` - Network and protocol failures

mod client;
mod error;
mod protocol;
mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::*;
pub use error::*;
pub use protocol::*;
pub use transport::*;
