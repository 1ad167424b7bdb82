//! Per-user shopping cart.

mod cart_model;
mod cart_service;
mod cart_traits;

pub use cart_model::*;
pub use cart_service::*;
pub use cart_traits::*;
