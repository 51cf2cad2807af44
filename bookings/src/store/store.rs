//! Booking store facade.
//!
//! Wraps the runtime [`Store`] with request/response methods and owns the
//! realtime subscription supervisor.

use crate::backend::{BackendError, ChangeFeed};
use crate::error::{BookingError, Result};
use crate::statistics::BookingStatistics;
use crate::store::{
    AdminCapability, BookingAction, BookingEnvironment, BookingReducer, BookingSnapshot,
    BookingState, RequestId,
};
use crate::types::{Booking, BookingId, BookingPatch};
use futures::StreamExt;
use kinxplore_runtime::{Store, StoreConfig, StoreError};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

type Runtime = Store<BookingState, BookingAction, BookingEnvironment, BookingReducer>;

/// Timing knobs for the booking store
#[derive(Debug, Clone)]
pub struct BookingStoreConfig {
    /// Longest a caller waits for a backend response
    pub response_timeout: Duration,
    /// Pause before re-subscribing after the feed ends
    pub resubscribe_delay: Duration,
}

impl Default for BookingStoreConfig {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_secs(30),
            resubscribe_delay: Duration::from_secs(5),
        }
    }
}

/// The booking store
///
/// Cheap to clone; clones share state. Every method is an async round-trip
/// through the reducer. Waiting callers are bounded by
/// [`BookingStoreConfig::response_timeout`]; the backend call itself keeps
/// running and its result is still reconciled.
#[derive(Clone)]
pub struct BookingStore {
    runtime: Runtime,
    next_request: Arc<AtomicU64>,
    config: BookingStoreConfig,
}

impl BookingStore {
    /// Create a store with an empty list and no capability
    #[must_use]
    pub fn new(environment: BookingEnvironment, config: BookingStoreConfig) -> Self {
        Self {
            runtime: Store::with_config(
                BookingState::new(),
                BookingReducer::new(),
                environment,
                StoreConfig::default().with_broadcast_capacity(256),
            ),
            next_request: Arc::new(AtomicU64::new(1)),
            config,
        }
    }

    fn next_request(&self) -> RequestId {
        RequestId::new(self.next_request.fetch_add(1, Ordering::Relaxed))
    }

    async fn request(&self, action: BookingAction, request: RequestId) -> Result<BookingAction> {
        let response = self
            .runtime
            .send_and_wait_for(
                action,
                move |candidate| candidate.responds_to() == Some(request),
                self.config.response_timeout,
            )
            .await?;

        match response {
            BookingAction::Rejected { error, .. }
            | BookingAction::LoadFailed { error, .. }
            | BookingAction::StatisticsLoadFailed { error, .. }
            | BookingAction::UpdateFailed { error, .. }
            | BookingAction::DeleteFailed { error, .. } => Err(error.into()),
            other => Ok(other),
        }
    }

    /// Replace the local list with a fresh fetch
    ///
    /// On failure the previous list is kept and the error is recorded in
    /// the state as well as returned.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError`] if the fetch fails, the capability is absent,
    /// or no response arrives in time.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self) -> Result<()> {
        let request = self.next_request();
        self.request(BookingAction::Load { request: Some(request) }, request)
            .await
            .map(|_| ())
    }

    /// Recompute statistics from a fresh fetch of the light projection
    ///
    /// # Errors
    ///
    /// Returns [`BookingError`] if the fetch fails, the capability is absent,
    /// or no response arrives in time.
    #[tracing::instrument(skip(self))]
    pub async fn load_statistics(&self) -> Result<BookingStatistics> {
        let request = self.next_request();
        self.request(BookingAction::LoadStatistics { request: Some(request) }, request)
            .await?;
        Ok(self.runtime.state(|s| s.statistics).await)
    }

    /// Write a partial update and reconcile the returned row
    ///
    /// A patch containing `status` is stamped with the current time and
    /// actor before it is sent. The list only changes once the backend
    /// confirms.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError`] if the backend rejects the write, the
    /// capability is absent, or no response arrives in time.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update(&self, booking_id: BookingId, patch: BookingPatch) -> Result<Booking> {
        let request = self.next_request();
        let response = self
            .request(
                BookingAction::Update {
                    request,
                    booking_id,
                    patch,
                },
                request,
            )
            .await?;

        match response {
            BookingAction::Updated { booking, .. } => Ok(booking),
            other => Err(unexpected(&other)),
        }
    }

    /// Delete a booking and drop it from the list
    ///
    /// # Errors
    ///
    /// Returns [`BookingError`] if the backend rejects the delete, the
    /// capability is absent, or no response arrives in time.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, booking_id: BookingId) -> Result<()> {
        let request = self.next_request();
        self.request(
            BookingAction::Delete {
                request,
                booking_id,
            },
            request,
        )
        .await
        .map(|_| ())
    }

    /// Reset the new-booking counter after `seen` new bookings were shown
    ///
    /// Inserts counted after that view keep the counter as it is.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Store`] if the store is shutting down.
    pub async fn clear_notifications(&self, seen: u32) -> Result<()> {
        self.runtime
            .send(BookingAction::ClearNotifications { seen })
            .await?;
        Ok(())
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> BookingSnapshot {
        self.runtime.state(BookingState::snapshot).await
    }

    /// Current bookings, newest first
    pub async fn bookings(&self) -> Vec<Booking> {
        self.runtime.state(|s| s.bookings.clone()).await
    }

    /// Current statistics
    pub async fn statistics(&self) -> BookingStatistics {
        self.runtime.state(|s| s.statistics).await
    }

    /// Current unacknowledged insert count
    pub async fn notification_count(&self) -> u32 {
        self.runtime.state(|s| s.notifications.count()).await
    }

    /// Revision signal, bumped after every state change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.runtime.subscribe_state()
    }

    /// Send a raw action
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
    pub async fn send(&self, action: BookingAction) -> std::result::Result<(), StoreError> {
        self.runtime.send(action).await.map(|_| ())
    }

    /// Follow the capability signal and keep the change feed subscribed
    /// while it is granted
    ///
    /// Dropping the returned guard stops the supervisor and closes the feed.
    #[must_use = "dropping the guard ends the subscription"]
    pub fn attach(
        &self,
        capability: watch::Receiver<AdminCapability>,
        feed: Arc<dyn ChangeFeed>,
    ) -> SubscriptionGuard {
        let supervisor = Supervisor {
            store: self.clone(),
            feed,
            resubscribe_delay: self.config.resubscribe_delay,
        };
        SubscriptionGuard {
            task: tokio::spawn(supervisor.run(capability)),
        }
    }

    /// Stop accepting actions and wait for in-flight calls
    ///
    /// Responses that arrive afterwards are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if calls are still running
    /// when the timeout expires.
    pub async fn shutdown(&self, timeout: Duration) -> std::result::Result<(), StoreError> {
        self.runtime.shutdown(timeout).await
    }
}

fn unexpected(action: &BookingAction) -> BookingError {
    BookingError::Backend(BackendError::ResponseParseFailed(format!(
        "unexpected response {action:?}"
    )))
}

/// Keeps the feed supervisor alive; aborts it on drop
#[derive(Debug)]
pub struct SubscriptionGuard {
    task: JoinHandle<()>,
}

impl SubscriptionGuard {
    /// Whether the supervisor has stopped (store shut down or signal gone)
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Supervisor {
    store: BookingStore,
    feed: Arc<dyn ChangeFeed>,
    resubscribe_delay: Duration,
}

impl Supervisor {
    async fn run(self, mut capability: watch::Receiver<AdminCapability>) {
        loop {
            let current = *capability.borrow_and_update();
            if self
                .store
                .send(BookingAction::CapabilityChanged { capability: current })
                .await
                .is_err()
            {
                return;
            }

            let signal = if current.is_granted() {
                tokio::select! {
                    () = self.follow_feed() => return,
                    changed = capability.changed() => changed,
                }
            } else {
                capability.changed().await
            };

            if signal.is_err() {
                // The capability owner is gone; treat it as a revocation
                tracing::info!("Capability signal closed, releasing booking data");
                let _ = self
                    .store
                    .send(BookingAction::CapabilityChanged {
                        capability: AdminCapability::Absent,
                    })
                    .await;
                return;
            }
        }
    }

    /// Subscribe, forward events, re-subscribe after a pause. Returns only
    /// when the store stops accepting actions.
    async fn follow_feed(&self) {
        loop {
            let reason = match self.feed.subscribe().await {
                Ok(mut stream) => {
                    if self.store.send(BookingAction::FeedConnected).await.is_err() {
                        return;
                    }
                    let mut reason = "feed closed".to_string();
                    while let Some(item) = stream.next().await {
                        match item {
                            Ok(event) => {
                                if self
                                    .store
                                    .send(BookingAction::ChangeReceived { event })
                                    .await
                                    .is_err()
                                {
                                    return;
                                }
                            },
                            Err(error) => {
                                reason = error.to_string();
                                break;
                            },
                        }
                    }
                    reason
                },
                Err(error) => error.to_string(),
            };

            if self
                .store
                .send(BookingAction::FeedLost { reason })
                .await
                .is_err()
            {
                return;
            }
            tokio::time::sleep(self.resubscribe_delay).await;
        }
    }
}
