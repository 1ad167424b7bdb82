//! The seam between the mirror and whatever delivers remote change
//! notifications.

use async_trait::async_trait;
use log::debug;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use super::{RemoteDocument, RemoteFailure, RemoteSnapshot, SnapshotNotification};
use crate::errors::Result;

/// A remote collection that can be listened to.
#[async_trait]
pub trait RemoteProductSource: Send + Sync {
    /// Registers a listener. Notifications arrive on the returned
    /// subscription until it is dropped or the source ends it.
    async fn subscribe(&self) -> Result<RemoteSubscription>;
}

/// A live listener registration. Dropping it cancels the producing task, if
/// the source attached one.
#[derive(Debug)]
pub struct RemoteSubscription {
    receiver: mpsc::UnboundedReceiver<SnapshotNotification>,
    producer: Option<AbortHandle>,
}

impl RemoteSubscription {
    pub fn new(receiver: mpsc::UnboundedReceiver<SnapshotNotification>) -> Self {
        Self {
            receiver,
            producer: None,
        }
    }

    pub fn with_producer(mut self, producer: AbortHandle) -> Self {
        self.producer = Some(producer);
        self
    }

    /// Next notification, or `None` once the source has closed the stream.
    pub async fn recv(&mut self) -> Option<SnapshotNotification> {
        self.receiver.recv().await
    }
}

impl Drop for RemoteSubscription {
    fn drop(&mut self) {
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

#[derive(Debug, Default)]
struct ChannelSourceState {
    current: Option<mpsc::UnboundedSender<SnapshotNotification>>,
    subscriptions: usize,
}

/// In-process source: whatever is published reaches the most recent
/// subscription. Useful for embedding a push-based client and for tests.
#[derive(Debug, Clone, Default)]
pub struct ChannelProductSource {
    state: Arc<Mutex<ChannelSourceState>>,
}

impl ChannelProductSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers a notification. Returns `false` when nobody is listening,
    /// including when the last subscription has been dropped.
    pub fn publish(&self, notification: SnapshotNotification) -> bool {
        let Ok(state) = self.state.lock() else {
            return false;
        };
        match state.current.as_ref() {
            Some(sender) => sender.send(notification).is_ok(),
            None => false,
        }
    }

    pub fn publish_documents(&self, documents: Vec<RemoteDocument>) -> bool {
        self.publish(SnapshotNotification::Snapshot(RemoteSnapshot::new(
            documents,
        )))
    }

    pub fn publish_error(&self, failure: RemoteFailure) -> bool {
        self.publish(SnapshotNotification::Error(failure))
    }

    /// Ends the current subscription's stream without an error.
    pub fn close(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.current = None;
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.state.lock().map(|s| s.subscriptions).unwrap_or(0)
    }

    pub fn has_listener(&self) -> bool {
        self.state
            .lock()
            .map(|s| s.current.as_ref().is_some_and(|tx| !tx.is_closed()))
            .unwrap_or(false)
    }
}

#[async_trait]
impl RemoteProductSource for ChannelProductSource {
    async fn subscribe(&self) -> Result<RemoteSubscription> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut state = self.state.lock().map_err(|_| {
            crate::errors::Error::Unexpected("Channel source state is poisoned".to_string())
        })?;
        state.current = Some(sender);
        state.subscriptions += 1;
        debug!(
            "[ChannelSource] Subscription #{} registered",
            state.subscriptions
        );
        Ok(RemoteSubscription::new(receiver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn publish_reaches_latest_subscription_only() {
        let source = ChannelProductSource::new();
        assert!(!source.publish_documents(vec![]));

        let mut first = source.subscribe().await.unwrap();
        let mut second = source.subscribe().await.unwrap();
        assert_eq!(source.subscription_count(), 2);

        assert!(source.publish_documents(vec![RemoteDocument::new(
            "p1",
            json!({ "price": 1 })
        )]));
        assert!(matches!(
            second.recv().await,
            Some(SnapshotNotification::Snapshot(_))
        ));
        drop(source);
        assert!(first.recv().await.is_none());
    }

    #[tokio::test]
    async fn dropping_the_subscription_stops_delivery() {
        let source = ChannelProductSource::new();
        let subscription = source.subscribe().await.unwrap();
        assert!(source.has_listener());
        drop(subscription);
        assert!(!source.has_listener());
        assert!(!source.publish_error(RemoteFailure::retryable("offline")));
    }

    #[tokio::test]
    async fn dropping_the_subscription_aborts_its_producer() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let producer = tokio::spawn(std::future::pending::<()>());
        let subscription = RemoteSubscription::new(rx).with_producer(producer.abort_handle());
        drop(subscription);
        assert!(producer.await.unwrap_err().is_cancelled());
    }
}
