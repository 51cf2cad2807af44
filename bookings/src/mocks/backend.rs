//! In-memory booking backend.

use crate::backend::{BackendError, BackendFuture, BookingBackend};
use crate::mocks::fixtures::apply_patch;
use crate::types::{Booking, BookingId, BookingPatch, StatRow};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Backend operation, for failure injection and call counting
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `list_bookings`
    List,
    /// `list_statistic_rows`
    Statistics,
    /// `update_booking`
    Update,
    /// `delete_booking`
    Delete,
}

#[derive(Default)]
struct Inner {
    rows: Vec<Booking>,
    calls: HashMap<Operation, usize>,
    one_shot_failures: HashMap<Operation, VecDeque<BackendError>>,
    persistent_failures: HashMap<Operation, BackendError>,
    delays: HashMap<Operation, VecDeque<Duration>>,
    patches: Vec<(BookingId, BookingPatch)>,
}

/// Mock booking backend
///
/// Rows live in memory and behave like the real table: lists come back
/// newest first, updates apply the patch and return the full row. Failures
/// and latency can be injected per operation.
#[derive(Clone, Default)]
pub struct MockBookingBackend {
    inner: Arc<Mutex<Inner>>,
}

impl MockBookingBackend {
    /// Create an empty backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend holding these rows
    #[must_use]
    pub fn with_rows(rows: Vec<Booking>) -> Self {
        let backend = Self::new();
        backend.with_inner(|inner| inner.rows = rows);
        backend
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
        match self.inner.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    /// Add or replace a row, as another client would
    pub fn upsert_row(&self, booking: Booking) {
        self.with_inner(|inner| {
            inner.rows.retain(|row| row.id != booking.id);
            inner.rows.push(booking);
        });
    }

    /// Remove a row, as another client would
    pub fn remove_row(&self, id: &BookingId) {
        self.with_inner(|inner| inner.rows.retain(|row| &row.id != id));
    }

    /// Current rows, newest first
    #[must_use]
    pub fn rows(&self) -> Vec<Booking> {
        self.with_inner(|inner| sorted(&inner.rows))
    }

    /// Fail the next call of `operation`
    pub fn fail_next(&self, operation: Operation, error: BackendError) {
        self.with_inner(|inner| {
            inner
                .one_shot_failures
                .entry(operation)
                .or_default()
                .push_back(error);
        });
    }

    /// Fail every call of `operation` until [`MockBookingBackend::recover`]
    pub fn fail_always(&self, operation: Operation, error: BackendError) {
        self.with_inner(|inner| {
            inner.persistent_failures.insert(operation, error);
        });
    }

    /// Stop failing `operation`
    pub fn recover(&self, operation: Operation) {
        self.with_inner(|inner| {
            inner.persistent_failures.remove(&operation);
            inner.one_shot_failures.remove(&operation);
        });
    }

    /// Delay the response to the next call of `operation`
    pub fn delay_next(&self, operation: Operation, delay: Duration) {
        self.with_inner(|inner| inner.delays.entry(operation).or_default().push_back(delay));
    }

    /// Number of calls of `operation` so far
    #[must_use]
    pub fn calls(&self, operation: Operation) -> usize {
        self.with_inner(|inner| inner.calls.get(&operation).copied().unwrap_or(0))
    }

    /// Every patch received, in call order
    #[must_use]
    pub fn patches(&self) -> Vec<(BookingId, BookingPatch)> {
        self.with_inner(|inner| inner.patches.clone())
    }

    /// Count the call and pick up any injected failure or delay
    fn begin(&self, operation: Operation) -> (Option<BackendError>, Option<Duration>) {
        self.with_inner(|inner| {
            *inner.calls.entry(operation).or_default() += 1;
            let failure = inner
                .one_shot_failures
                .get_mut(&operation)
                .and_then(VecDeque::pop_front)
                .or_else(|| inner.persistent_failures.get(&operation).cloned());
            let delay = inner.delays.get_mut(&operation).and_then(VecDeque::pop_front);
            (failure, delay)
        })
    }
}

fn sorted(rows: &[Booking]) -> Vec<Booking> {
    let mut rows = rows.to_vec();
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    rows
}

async fn settle(delay: Option<Duration>, failure: Option<BackendError>) -> Result<(), BackendError> {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    failure.map_or(Ok(()), Err)
}

impl BookingBackend for MockBookingBackend {
    fn list_bookings(&self) -> BackendFuture<'_, Vec<Booking>> {
        let (failure, delay) = self.begin(Operation::List);
        Box::pin(async move {
            settle(delay, failure).await?;
            Ok(self.rows())
        })
    }

    fn list_statistic_rows(&self) -> BackendFuture<'_, Vec<StatRow>> {
        let (failure, delay) = self.begin(Operation::Statistics);
        Box::pin(async move {
            settle(delay, failure).await?;
            Ok(self.rows().iter().map(StatRow::from).collect())
        })
    }

    fn update_booking<'a>(
        &'a self,
        id: &'a BookingId,
        patch: &'a BookingPatch,
    ) -> BackendFuture<'a, Booking> {
        let (failure, delay) = self.begin(Operation::Update);
        self.with_inner(|inner| inner.patches.push((id.clone(), patch.clone())));
        Box::pin(async move {
            settle(delay, failure).await?;
            self.with_inner(|inner| -> Result<Booking, BackendError> {
                let row = inner
                    .rows
                    .iter_mut()
                    .find(|row| &row.id == id)
                    .ok_or_else(|| BackendError::NotFound(id.to_string()))?;
                apply_patch(row, patch);
                Ok(row.clone())
            })
        })
    }

    fn delete_booking<'a>(&'a self, id: &'a BookingId) -> BackendFuture<'a, ()> {
        let (failure, delay) = self.begin(Operation::Delete);
        Box::pin(async move {
            settle(delay, failure).await?;
            self.remove_row(id);
            Ok(())
        })
    }
}
