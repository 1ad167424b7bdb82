//! Client for the remote document store that owns the product catalog, and
//! a polling change stream the product mirror can subscribe to.

pub mod client;
pub mod error;
pub mod polling;
pub mod types;

pub use client::RemoteCatalogClient;
pub use error::{RemoteCatalogError, Result};
pub use polling::{snapshot_fingerprint, PollingProductSource};
