//! Storefront domain: models, repository contracts, services and the remote
//! product mirror.
//!
//! Storage backends live in separate crates and implement the repository
//! traits declared here.

pub mod cart;
pub mod errors;
pub mod events;
pub mod favorites;
pub mod orders;
pub mod products;
pub mod settings;
pub mod sync;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::{Error, Result};
