//! Board command sink that records what it was asked to do.

use crate::backend::BackendError;
use crate::board::{BookingCommands, CommandFuture};
use crate::mocks::fixtures::apply_patch;
use crate::types::{Booking, BookingId, BookingPatch};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A recorded board command
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// `update`
    Update(BookingId, BookingPatch),
    /// `delete`
    Delete(BookingId),
    /// `acknowledge_new_bookings` with the count seen
    Acknowledge(u32),
}

#[derive(Default)]
struct Inner {
    rows: HashMap<BookingId, Booking>,
    commands: Vec<Command>,
    failure: Option<BackendError>,
}

/// Mock [`BookingCommands`]
///
/// Updates are applied to the seeded rows and the patched row is returned;
/// unknown ids fail with `NotFound`. [`RecordingCommands::fail_with`] makes
/// every command fail.
#[derive(Clone, Default)]
pub struct RecordingCommands {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingCommands {
    /// Create a sink that knows these rows
    #[must_use]
    pub fn with_rows(rows: impl IntoIterator<Item = Booking>) -> Self {
        let commands = Self::default();
        commands.with_inner(|inner| {
            inner.rows = rows
                .into_iter()
                .map(|booking| (booking.id.clone(), booking))
                .collect();
        });
        commands
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
        match self.inner.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    /// Fail every following command with `error`; `None` to stop failing
    pub fn fail_with(&self, error: Option<BackendError>) {
        self.with_inner(|inner| inner.failure = error);
    }

    /// Commands received so far
    #[must_use]
    pub fn commands(&self) -> Vec<Command> {
        self.with_inner(|inner| inner.commands.clone())
    }

    fn record(&self, command: Command) -> Result<(), BackendError> {
        self.with_inner(|inner| {
            inner.commands.push(command);
            inner.failure.clone().map_or(Ok(()), Err)
        })
    }
}

impl BookingCommands for RecordingCommands {
    fn update(&self, booking_id: BookingId, patch: BookingPatch) -> CommandFuture<'_, Booking> {
        Box::pin(async move {
            self.record(Command::Update(booking_id.clone(), patch.clone()))?;
            let updated = self.with_inner(|inner| -> Result<Booking, BackendError> {
                let row = inner
                    .rows
                    .get_mut(&booking_id)
                    .ok_or_else(|| BackendError::NotFound(booking_id.to_string()))?;
                apply_patch(row, &patch);
                Ok(row.clone())
            })?;
            Ok(updated)
        })
    }

    fn delete(&self, booking_id: BookingId) -> CommandFuture<'_, ()> {
        Box::pin(async move {
            self.record(Command::Delete(booking_id.clone()))?;
            self.with_inner(|inner| inner.rows.remove(&booking_id));
            Ok(())
        })
    }

    fn acknowledge_new_bookings(&self, seen: u32) -> CommandFuture<'_, ()> {
        Box::pin(async move {
            self.record(Command::Acknowledge(seen))?;
            Ok(())
        })
    }
}
