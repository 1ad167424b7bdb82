//! Per-user favorite products. Membership is the row itself.

mod favorites_service;
mod favorites_traits;

pub use favorites_service::*;
pub use favorites_traits::*;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub user_id: String,
    pub product_id: String,
}
