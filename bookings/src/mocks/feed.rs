//! Change feed driven by the test.

use crate::backend::{BackendError, BackendFuture, ChangeEvent, ChangeFeed, ChangeStream};
use futures::channel::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Sender = mpsc::UnboundedSender<Result<ChangeEvent, BackendError>>;

#[derive(Default)]
struct Inner {
    senders: Vec<Sender>,
    subscriptions: usize,
    refuse_next: Option<BackendError>,
}

/// Mock change feed
///
/// Every `subscribe` opens a channel; [`ManualChangeFeed::emit`] pushes an
/// event to every open subscription, [`ManualChangeFeed::disconnect`] ends
/// them all.
#[derive(Clone, Default)]
pub struct ManualChangeFeed {
    inner: Arc<Mutex<Inner>>,
}

impl ManualChangeFeed {
    /// Create a feed with no subscribers
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
        match self.inner.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    /// Deliver an event; returns how many subscriptions received it
    pub fn emit(&self, event: ChangeEvent) -> usize {
        self.with_inner(|inner| {
            inner
                .senders
                .retain(|sender| sender.unbounded_send(Ok(event.clone())).is_ok());
            inner.senders.len()
        })
    }

    /// Send a transport error, then end every subscription
    pub fn fail(&self, error: BackendError) {
        self.with_inner(|inner| {
            for sender in inner.senders.drain(..) {
                let _ = sender.unbounded_send(Err(error.clone()));
            }
        });
    }

    /// End every subscription
    pub fn disconnect(&self) {
        self.with_inner(|inner| inner.senders.clear());
    }

    /// Refuse the next `subscribe` call
    pub fn refuse_next(&self, error: BackendError) {
        self.with_inner(|inner| inner.refuse_next = Some(error));
    }

    /// Total successful `subscribe` calls
    #[must_use]
    pub fn subscriptions(&self) -> usize {
        self.with_inner(|inner| inner.subscriptions)
    }

    /// Subscriptions whose receiver is still alive
    #[must_use]
    pub fn active(&self) -> usize {
        self.with_inner(|inner| {
            inner.senders.retain(|sender| !sender.is_closed());
            inner.senders.len()
        })
    }

    /// Wait until at least `count` subscriptions have been opened
    pub async fn wait_for_subscriptions(&self, count: usize) {
        while self.subscriptions() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Wait until no subscription is alive
    pub async fn wait_until_inactive(&self) {
        while self.active() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl ChangeFeed for ManualChangeFeed {
    fn subscribe(&self) -> BackendFuture<'_, ChangeStream> {
        let result = self.with_inner(|inner| {
            if let Some(error) = inner.refuse_next.take() {
                return Err(error);
            }
            let (sender, receiver) = mpsc::unbounded();
            inner.senders.push(sender);
            inner.subscriptions += 1;
            Ok(Box::pin(receiver) as ChangeStream)
        });
        Box::pin(async move { result })
    }
}
