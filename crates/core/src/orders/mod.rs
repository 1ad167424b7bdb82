//! Checkout and order history.

mod orders_model;
mod orders_service;
mod orders_traits;

pub use orders_model::*;
pub use orders_service::*;
pub use orders_traits::*;
