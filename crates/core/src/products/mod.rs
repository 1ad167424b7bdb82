//! Product catalog: read-only for callers, written only by the remote mirror.

mod products_model;
mod products_service;
mod products_traits;

pub use products_model::*;
pub use products_service::*;
pub use products_traits::*;
