//! A change stream for stores that only offer request/response reads.
//!
//! Each subscription polls the collection on its own task and forwards a
//! snapshot whenever the collection's content fingerprint moves. A failed
//! fetch is forwarded as an error and ends the subscription, leaving the
//! decision to resubscribe with the mirror.

use async_trait::async_trait;
use log::{debug, warn};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tokio::sync::mpsc;

use storefront_core::errors::Result;
use storefront_core::sync::{
    RemoteDocument, RemoteProductSource, RemoteSnapshot, RemoteSubscription,
    SnapshotNotification, MIRROR_MIN_POLL_INTERVAL_SECS, MIRROR_POLL_INTERVAL_SECS,
};

use crate::client::RemoteCatalogClient;

/// Order-insensitive SHA-256 over document ids and fields.
pub fn snapshot_fingerprint(documents: &[RemoteDocument]) -> String {
    let mut sorted: Vec<&RemoteDocument> = documents.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let mut hasher = Sha256::new();
    for document in sorted {
        hasher.update(document.id.as_bytes());
        hasher.update([0u8]);
        hasher.update(serde_json::Value::Object(document.fields.clone()).to_string());
        hasher.update([b'\n']);
    }
    format!("sha256:{:x}", hasher.finalize())
}

#[derive(Debug, Clone)]
pub struct PollingProductSource {
    client: RemoteCatalogClient,
    collection: String,
    interval: Duration,
}

impl PollingProductSource {
    pub fn new(client: RemoteCatalogClient, collection: impl Into<String>) -> Self {
        Self {
            client,
            collection: collection.into(),
            interval: Duration::from_secs(MIRROR_POLL_INTERVAL_SECS),
        }
    }

    /// Overrides the poll cadence, floored at one second.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_secs(MIRROR_MIN_POLL_INTERVAL_SECS));
        self
    }

    #[cfg(test)]
    fn with_unchecked_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[async_trait]
impl RemoteProductSource for PollingProductSource {
    async fn subscribe(&self) -> Result<RemoteSubscription> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let producer = tokio::spawn(poll_collection(
            self.client.clone(),
            self.collection.clone(),
            self.interval,
            sender,
        ));
        debug!(
            "[RemoteCatalog] Polling '{}' every {}s",
            self.collection,
            self.interval.as_secs_f64()
        );
        Ok(RemoteSubscription::new(receiver).with_producer(producer.abort_handle()))
    }
}

async fn poll_collection(
    client: RemoteCatalogClient,
    collection: String,
    interval: Duration,
    sender: mpsc::UnboundedSender<SnapshotNotification>,
) {
    let mut last_fingerprint: Option<String> = None;
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if sender.is_closed() {
            return;
        }

        match client.fetch_collection(&collection).await {
            Ok(documents) => {
                let fingerprint = snapshot_fingerprint(&documents);
                if last_fingerprint.as_deref() == Some(fingerprint.as_str()) {
                    continue;
                }
                debug!(
                    "[RemoteCatalog] '{}' changed ({} documents, {})",
                    collection,
                    documents.len(),
                    fingerprint
                );
                last_fingerprint = Some(fingerprint);
                let notification = SnapshotNotification::Snapshot(RemoteSnapshot::new(documents));
                if sender.send(notification).is_err() {
                    return;
                }
            }
            Err(err) => {
                warn!("[RemoteCatalog] Fetching '{}' failed: {}", collection, err);
                let _ = sender.send(SnapshotNotification::Error(err.to_failure()));
                return;
            }
        }
    }
}
