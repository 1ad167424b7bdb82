//! Background engine that keeps the local product table in step with the
//! remote collection.
//!
//! The mirror holds one subscription at a time. Each non-empty snapshot is
//! decoded and upserted; listener failures end the subscription and either
//! schedule a resubscription or leave the mirror silent, per
//! [`ResubscribePolicy`].

use chrono::Utc;
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use super::{
    decode_snapshot, MirrorConfig, MirrorState, MirrorStatus, MirrorStatusRepositoryTrait,
    ReconcileMode, RemoteFailure, RemoteProductSource, RemoteSnapshot, RemoteSubscription,
    SnapshotApplyOutcome, SnapshotNotification,
};
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink, NoOpDomainEventSink};
use crate::products::ProductRepositoryTrait;

pub struct ProductMirror {
    source: Arc<dyn RemoteProductSource>,
    product_repository: Arc<dyn ProductRepositoryTrait>,
    status_repository: Arc<dyn MirrorStatusRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
    config: MirrorConfig,
}

impl ProductMirror {
    pub fn new(
        source: Arc<dyn RemoteProductSource>,
        product_repository: Arc<dyn ProductRepositoryTrait>,
        status_repository: Arc<dyn MirrorStatusRepositoryTrait>,
        config: MirrorConfig,
    ) -> Self {
        Self {
            source,
            product_repository,
            status_repository,
            event_sink: Arc::new(NoOpDomainEventSink),
            config,
        }
    }

    pub fn with_event_sink(mut self, event_sink: Arc<dyn DomainEventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    /// Applies one snapshot to local storage.
    ///
    /// Malformed documents are skipped and counted. An empty snapshot is a
    /// no-op and never triggers reconciliation.
    pub async fn apply_snapshot(&self, snapshot: RemoteSnapshot) -> Result<SnapshotApplyOutcome> {
        if snapshot.documents.is_empty() {
            return Ok(SnapshotApplyOutcome::default());
        }

        let decoded = decode_snapshot(&snapshot.documents);
        if decoded.dropped > 0 {
            warn!(
                "[ProductMirror] Skipped {} malformed document(s) of {}",
                decoded.dropped,
                snapshot.documents.len()
            );
        }

        let mut outcome = SnapshotApplyOutcome {
            dropped: decoded.dropped,
            ..Default::default()
        };
        // Every delivered id counts as present, decodable or not.
        let present: Vec<String> = match self.config.reconcile {
            ReconcileMode::KeepMissing => Vec::new(),
            ReconcileMode::DeleteMissing => snapshot
                .documents
                .iter()
                .map(|doc| doc.id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
        };
        if !present.is_empty() {
            (outcome.upserted, outcome.deleted) = self
                .product_repository
                .upsert_and_delete_missing(decoded.products, present)
                .await?;
        } else if !decoded.products.is_empty() {
            outcome.upserted = self
                .product_repository
                .upsert_products(decoded.products)
                .await?;
        }

        if outcome.upserted > 0 || outcome.deleted > 0 {
            self.event_sink.emit(DomainEvent::ProductsChanged {
                upserted: outcome.upserted,
                deleted: outcome.deleted,
            });
        }
        Ok(outcome)
    }

    /// Spawns the listener loop on the current runtime.
    pub fn start(self) -> MirrorHandle {
        let mut initial = match self.status_repository.get_mirror_status() {
            Ok(status) => status.unwrap_or_default(),
            Err(err) => {
                warn!("[ProductMirror] Could not load persisted status: {}", err);
                MirrorStatus::default()
            }
        };
        initial.consecutive_failures = 0;
        initial.resubscriptions = 0;
        initial.transition(MirrorState::Subscribed);

        let (status_tx, status_rx) = watch::channel(initial);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let runner = MirrorRunner {
            mirror: self,
            status: status_tx,
            shutdown: shutdown_rx,
        };
        let task = tokio::spawn(runner.run());

        MirrorHandle {
            shutdown: shutdown_tx,
            status: status_rx,
            task: Mutex::new(Some(task)),
        }
    }
}

/// Owner-side control of a running mirror. Dropping the handle stops the loop.
pub struct MirrorHandle {
    shutdown: watch::Sender<bool>,
    status: watch::Receiver<MirrorStatus>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl MirrorHandle {
    /// Receiver that observes every status transition.
    pub fn status(&self) -> watch::Receiver<MirrorStatus> {
        self.status.clone()
    }

    pub fn current_status(&self) -> MirrorStatus {
        self.status.borrow().clone()
    }

    /// Stops the loop and waits for it to persist its final state.
    /// Safe to call more than once.
    pub async fn shutdown(&self) {
        self.shutdown.send_replace(true);
        let task = self.task.lock().await.take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                if !err.is_cancelled() {
                    error!("[ProductMirror] Listener task panicked: {}", err);
                }
            }
        }
    }
}

enum ListenOutcome {
    Shutdown,
    Failed(RemoteFailure),
}

struct MirrorRunner {
    mirror: ProductMirror,
    status: watch::Sender<MirrorStatus>,
    shutdown: watch::Receiver<bool>,
}

impl MirrorRunner {
    async fn run(mut self) {
        let mut attempt: u32 = 0;
        info!("[ProductMirror] Starting");

        loop {
            let subscribed = tokio::select! {
                biased;
                _ = self.shutdown.wait_for(|stop| *stop) => break,
                subscribed = self.mirror.source.subscribe() => subscribed,
            };

            let failure = match subscribed {
                Ok(mut subscription) => {
                    self.update(|status| status.transition(MirrorState::Subscribed))
                        .await;
                    match self.listen(&mut subscription, &mut attempt).await {
                        ListenOutcome::Shutdown => break,
                        ListenOutcome::Failed(failure) => failure,
                    }
                }
                Err(err) => RemoteFailure::retryable(format!("Subscribe failed: {}", err)),
            };

            warn!(
                "[ProductMirror] Subscription ended ({:?}): {}",
                failure.retry_class, failure.message
            );

            let policy = &self.mirror.config.resubscribe;
            let Some(delay) = policy.next_delay(attempt, failure.retry_class) else {
                info!(
                    "[ProductMirror] Not resubscribing after {} attempt(s); going silent",
                    attempt
                );
                self.update(|status| {
                    status.record_error(failure.message.clone());
                    status.transition(MirrorState::FailedSilent);
                })
                .await;
                return;
            };

            let delay = policy.with_jitter(delay);
            let retry_at = Utc::now()
                + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
            self.update(|status| {
                status.record_error(failure.message.clone());
                status.transition(MirrorState::Retrying);
                status.next_retry_at = Some(retry_at.to_rfc3339());
            })
            .await;
            debug!(
                "[ProductMirror] Resubscribing in {}ms (attempt {})",
                delay.as_millis(),
                attempt + 1
            );

            tokio::select! {
                biased;
                _ = self.shutdown.wait_for(|stop| *stop) => break,
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
            self.update(|status| status.resubscriptions += 1).await;
        }

        info!("[ProductMirror] Stopped");
        self.update(|status| status.transition(MirrorState::Stopped))
            .await;
    }

    /// Consumes notifications until the subscription fails or shutdown is
    /// requested. The subscription is released by the caller on return.
    async fn listen(
        &mut self,
        subscription: &mut RemoteSubscription,
        attempt: &mut u32,
    ) -> ListenOutcome {
        loop {
            let notification = tokio::select! {
                biased;
                _ = self.shutdown.wait_for(|stop| *stop) => return ListenOutcome::Shutdown,
                notification = subscription.recv() => notification,
            };

            let snapshot = match notification {
                Some(SnapshotNotification::Snapshot(snapshot)) => snapshot,
                Some(SnapshotNotification::Error(failure)) => {
                    return ListenOutcome::Failed(failure)
                }
                None => {
                    return ListenOutcome::Failed(RemoteFailure::retryable(
                        "Remote subscription closed",
                    ))
                }
            };

            if snapshot.documents.is_empty() {
                debug!("[ProductMirror] Ignoring empty snapshot");
                continue;
            }

            match self.mirror.apply_snapshot(snapshot).await {
                Ok(outcome) => {
                    debug!(
                        "[ProductMirror] Applied snapshot upserted={} dropped={} deleted={}",
                        outcome.upserted, outcome.dropped, outcome.deleted
                    );
                    *attempt = 0;
                    self.update(|status| status.record_applied(&outcome)).await;
                }
                Err(err) => {
                    error!("[ProductMirror] Failed to apply snapshot: {}", err);
                    self.update(|status| status.record_error(err.to_string()))
                        .await;
                }
            }
        }
    }

    /// Persists the modified status, then publishes it.
    async fn update(&self, modify: impl FnOnce(&mut MirrorStatus)) {
        let mut next = self.status.borrow().clone();
        modify(&mut next);
        if let Err(err) = self
            .mirror
            .status_repository
            .save_mirror_status(next.clone())
            .await
        {
            warn!("[ProductMirror] Failed to persist status: {}", err);
        }
        self.status.send_replace(next);
    }
}
