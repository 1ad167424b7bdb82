//! Accounts, password hashing and the signed-in session.

mod auth_service;
mod password;
mod users_model;
mod users_traits;

pub use auth_service::*;
pub use password::*;
pub use users_model::*;
pub use users_traits::*;
