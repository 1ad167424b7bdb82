//! Error types for the remote catalog crate.

use storefront_core::sync::{classify_http_status, MirrorRetryClass, RemoteFailure};
use thiserror::Error;

/// Result type alias for remote catalog operations.
pub type Result<T> = std::result::Result<T, RemoteCatalogError>;

#[derive(Debug, Error)]
pub enum RemoteCatalogError {
    /// Transport failure (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-success response from the document store
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// API key cannot be sent as a header
    #[error("Authentication error: {0}")]
    Auth(String),
}

impl RemoteCatalogError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify error for the mirror's resubscribe policy.
    pub fn retry_class(&self) -> MirrorRetryClass {
        match self {
            Self::Api { status, .. } => classify_http_status(*status),
            Self::Http(_) => MirrorRetryClass::Retryable,
            Self::Json(_) => MirrorRetryClass::Permanent,
            Self::InvalidRequest(_) => MirrorRetryClass::Permanent,
            Self::Auth(_) => MirrorRetryClass::ReauthRequired,
        }
    }

    /// The listener-level failure delivered to the mirror.
    pub fn to_failure(&self) -> RemoteFailure {
        RemoteFailure {
            message: self.to_string(),
            retry_class: self.retry_class(),
        }
    }
}
