//! Domain events emitted after mutations, and the bus that turns them into
//! observable sequences for callers.

use futures::stream::{BoxStream, StreamExt};
use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::errors::Result;

const DEFAULT_BUS_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    ProductsChanged { upserted: usize, deleted: usize },
    CartChanged { user_id: String },
    FavoritesChanged { user_id: String },
    OrdersChanged { user_id: String },
    SessionChanged { user_id: Option<String> },
    SettingsChanged,
}

impl DomainEvent {
    /// The user whose private data the event concerns, if any.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::CartChanged { user_id }
            | Self::FavoritesChanged { user_id }
            | Self::OrdersChanged { user_id } => Some(user_id),
            Self::SessionChanged { user_id } => user_id.as_deref(),
            Self::ProductsChanged { .. } | Self::SettingsChanged => None,
        }
    }
}

pub trait DomainEventSink: Send + Sync {
    fn emit(&self, event: DomainEvent);
}

pub struct NoOpDomainEventSink;

impl DomainEventSink for NoOpDomainEventSink {
    fn emit(&self, _event: DomainEvent) {}
}

/// In-process fan-out of domain events.
#[derive(Debug, Clone)]
pub struct DomainEventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl DomainEventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUS_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for DomainEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainEventSink for DomainEventBus {
    fn emit(&self, event: DomainEvent) {
        // No receivers is normal when nothing is observing.
        let _ = self.sender.send(event);
    }
}

/// Builds an observable query: yields `load()` once immediately, then again
/// after every event accepted by `matches`.
///
/// The receiver is registered before the first load so a mutation racing the
/// initial query still triggers a refresh. A lagging observer reloads instead
/// of failing; the stream ends when the bus is dropped.
pub fn observe<T, M, L>(bus: &DomainEventBus, matches: M, load: L) -> BoxStream<'static, Result<T>>
where
    T: Send + 'static,
    M: Fn(&DomainEvent) -> bool + Send + Sync + 'static,
    L: Fn() -> Result<T> + Send + Sync + 'static,
{
    let receiver = bus.subscribe();
    futures::stream::unfold(
        (receiver, true, matches, load),
        |(mut receiver, first, matches, load)| async move {
            if !first {
                loop {
                    match receiver.recv().await {
                        Ok(event) if matches(&event) => break,
                        Ok(_) => continue,
                        Err(RecvError::Lagged(skipped)) => {
                            debug!("[Observe] Receiver lagged by {} events, reloading", skipped);
                            break;
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }
            }
            let value = load();
            Some((value, (receiver, false, matches, load)))
        },
    )
    .boxed()
}
