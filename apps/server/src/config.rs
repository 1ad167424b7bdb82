//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `REMOTE_CATALOG_URL` - Base URL of the remote document store
//!
//! ## Optional
//! - `STOREFRONT_DATA_DIR` - Directory holding the SQLite file (default: ./data)
//! - `REMOTE_CATALOG_API_KEY` - Bearer key for the document store
//! - `REMOTE_PRODUCTS_COLLECTION` - Collection to mirror (default: products)
//! - `MIRROR_POLL_INTERVAL_SECS` - Poll cadence (default: 30)
//! - `MIRROR_MAX_RESUBSCRIBES` - Resubscriptions after listener errors (default: 0, the
//!   first error stops the mirror)
//! - `MIRROR_RECONCILE` - `keep` or `delete` products missing remotely (default: keep)

use std::time::Duration;

use storefront_core::sync::{
    MirrorConfig, ReconcileMode, ResubscribePolicy, DEFAULT_PRODUCTS_COLLECTION,
    MIRROR_POLL_INTERVAL_SECS,
};
use thiserror::Error;

const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Clone)]
pub struct ServerConfig {
    pub data_dir: String,
    pub remote_url: String,
    pub remote_api_key: Option<String>,
    pub products_collection: String,
    pub poll_interval: Duration,
    pub mirror: MirrorConfig,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("data_dir", &self.data_dir)
            .field("remote_url", &self.remote_url)
            .field(
                "remote_api_key",
                &self.remote_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("products_collection", &self.products_collection)
            .field("poll_interval", &self.poll_interval)
            .field("mirror", &self.mirror)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from the process environment, after reading a
    /// `.env` file if one is present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Blank values count as
    /// unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let remote_url = get("REMOTE_CATALOG_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("REMOTE_CATALOG_URL".to_string()))?;

        let poll_secs = parse_or(
            "MIRROR_POLL_INTERVAL_SECS",
            get("MIRROR_POLL_INTERVAL_SECS"),
            MIRROR_POLL_INTERVAL_SECS,
        )?;
        if poll_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "MIRROR_POLL_INTERVAL_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let defaults = ResubscribePolicy::default();
        let max_resubscribes = parse_or(
            "MIRROR_MAX_RESUBSCRIBES",
            get("MIRROR_MAX_RESUBSCRIBES"),
            defaults.max_resubscribes,
        )?;

        let reconcile = match get("MIRROR_RECONCILE") {
            Some(value) => ReconcileMode::parse(&value).ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "MIRROR_RECONCILE".to_string(),
                    format!("expected 'keep' or 'delete', got '{}'", value),
                )
            })?,
            None => ReconcileMode::default(),
        };

        Ok(Self {
            data_dir: get("STOREFRONT_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
            remote_url,
            remote_api_key: get("REMOTE_CATALOG_API_KEY"),
            products_collection: get("REMOTE_PRODUCTS_COLLECTION")
                .unwrap_or_else(|| DEFAULT_PRODUCTS_COLLECTION.to_string()),
            poll_interval: Duration::from_secs(poll_secs),
            mirror: MirrorConfig {
                resubscribe: ResubscribePolicy {
                    max_resubscribes,
                    ..defaults
                },
                reconcile,
            },
        })
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
