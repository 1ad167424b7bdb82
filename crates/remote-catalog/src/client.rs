//! HTTP client for the remote document store that owns the product catalog.

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use std::time::Duration;

use storefront_core::sync::RemoteDocument;

use crate::error::{RemoteCatalogError, Result};
use crate::types::{ApiErrorResponse, CollectionResponse};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;

#[derive(Debug, Clone)]
pub struct RemoteCatalogClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl RemoteCatalogClient {
    /// Create a client for `base_url` (e.g. "https://catalog.example").
    /// `api_key`, when set, is sent as a bearer token.
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        Self::with_timeout(base_url, api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(RemoteCatalogError::invalid_request(
                "Remote catalog URL is empty",
            ));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(key) = &self.api_key {
            let auth_value = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|_| RemoteCatalogError::auth("Invalid API key format"))?;
            headers.insert(AUTHORIZATION, auth_value);
        }
        Ok(headers)
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("[RemoteCatalog] Response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("[RemoteCatalog] Response error ({}): {}", status, preview);
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(RemoteCatalogError::api(
                    status.as_u16(),
                    format!("{}: {}", error.code, error.message),
                ));
            }
            return Err(RemoteCatalogError::api(
                status.as_u16(),
                format!("Request failed: {}", body),
            ));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Every document currently in `collection`.
    ///
    /// GET /v1/collections/{collection}/documents
    pub async fn fetch_collection(&self, collection: &str) -> Result<Vec<RemoteDocument>> {
        let collection = collection.trim();
        if collection.is_empty() || collection.contains('/') {
            return Err(RemoteCatalogError::invalid_request(format!(
                "Invalid collection name '{}'",
                collection
            )));
        }
        let url = format!(
            "{}/v1/collections/{}/documents",
            self.base_url, collection
        );
        debug!("[RemoteCatalog] Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .headers(self.headers()?)
            .send()
            .await?;

        let parsed: CollectionResponse = Self::parse_response(response).await?;
        Ok(parsed.documents)
    }
}


#[cfg(test)]
mod tests {
    use super::test_server::{start, MockResponse};
    use super::*;
    use storefront_core::sync::MirrorRetryClass;

    const PHONE_BODY: &str = r#"{"documents":[{"id":"p1","fields":{"name":"Phone","price":100,"stock":5}}]}"#;

    #[tokio::test]
    async fn fetch_collection_returns_documents_and_sends_bearer_key() {
        let server = start(vec![MockResponse::ok(PHONE_BODY)]).await;
        let client = RemoteCatalogClient::new(&server.base_url, Some("secret".to_string()))
            .expect("client");

        let documents = client.fetch_collection("products").await.expect("fetch");

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].id, "p1");
        assert_eq!(documents[0].fields["name"], "Phone");
        let requests = server.captured.lock().await.clone();
        assert_eq!(requests[0].path, "/v1/collections/products/documents");
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer secret"));
    }

    #[tokio::test]
    async fn no_api_key_sends_no_authorization() {
        let server = start(vec![MockResponse::ok(r#"{"documents":[]}"#)]).await;
        let client =
            RemoteCatalogClient::new(&format!("{}/", server.base_url), Some("  ".to_string()))
                .expect("client");

        let documents = client.fetch_collection("products").await.expect("fetch");

        assert!(documents.is_empty());
        let requests = server.captured.lock().await.clone();
        assert!(requests[0].authorization.is_none());
    }

    #[tokio::test]
    async fn api_errors_keep_status_and_code() {
        let server = start(vec![MockResponse::status(
            403,
            r#"{"code":"PERMISSION_DENIED","message":"rules reject read"}"#,
        )])
        .await;
        let client = RemoteCatalogClient::new(&server.base_url, None).expect("client");

        let err = client.fetch_collection("products").await.unwrap_err();

        assert_eq!(err.status_code(), Some(403));
        assert_eq!(err.retry_class(), MirrorRetryClass::ReauthRequired);
        assert!(err.to_string().contains("PERMISSION_DENIED"));
    }

    #[tokio::test]
    async fn malformed_body_is_permanent() {
        let server = start(vec![MockResponse::ok("not json")]).await;
        let client = RemoteCatalogClient::new(&server.base_url, None).expect("client");

        let err = client.fetch_collection("products").await.unwrap_err();

        assert!(matches!(err, RemoteCatalogError::Json(_)));
        assert_eq!(err.retry_class(), MirrorRetryClass::Permanent);
    }

    #[tokio::test]
    async fn rejects_bad_collection_names_without_a_request() {
        let server = start(vec![MockResponse::ok(PHONE_BODY)]).await;
        let client = RemoteCatalogClient::new(&server.base_url, None).expect("client");

        assert!(client.fetch_collection("a/b").await.is_err());
        assert!(client.fetch_collection(" ").await.is_err());
        assert_eq!(server.request_count().await, 0);
    }

    #[test]
    fn empty_base_url_is_rejected() {
        assert!(RemoteCatalogClient::new("  ", None).is_err());
    }
}
