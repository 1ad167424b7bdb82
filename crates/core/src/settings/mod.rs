//! App preferences and the persisted sign-in session.

mod settings_model;
mod settings_service;
mod settings_traits;

pub use settings_model::*;
pub use settings_service::*;
pub use settings_traits::*;
