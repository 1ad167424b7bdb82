//! Wire types for the remote document store API.

use serde::{Deserialize, Serialize};
use storefront_core::sync::RemoteDocument;

/// `GET /v1/collections/{name}/documents`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionResponse {
    #[serde(default)]
    pub documents: Vec<RemoteDocument>,
}

/// Error body returned alongside non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub code: String,
    pub message: String,
}
