//! Environment for the board reducer.

use crate::error::Result;
use crate::store::BookingStore;
use crate::types::{Booking, BookingId, BookingPatch};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by board commands
pub type CommandFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Writes the board forwards to the booking store
///
/// Implemented by [`BookingStore`]; tests use `RecordingCommands`.
pub trait BookingCommands: Send + Sync {
    /// Write a partial update
    ///
    /// # Errors
    ///
    /// Returns the store's error if the write fails.
    fn update(&self, booking_id: BookingId, patch: BookingPatch) -> CommandFuture<'_, Booking>;

    /// Delete a booking
    ///
    /// # Errors
    ///
    /// Returns the store's error if the delete fails.
    fn delete(&self, booking_id: BookingId) -> CommandFuture<'_, ()>;

    /// Reset the new-booking counter, given the count the board showed
    ///
    /// # Errors
    ///
    /// Returns the store's error if the store is shutting down.
    fn acknowledge_new_bookings(&self, seen: u32) -> CommandFuture<'_, ()>;
}

impl BookingCommands for BookingStore {
    fn update(&self, booking_id: BookingId, patch: BookingPatch) -> CommandFuture<'_, Booking> {
        Box::pin(Self::update(self, booking_id, patch))
    }

    fn delete(&self, booking_id: BookingId) -> CommandFuture<'_, ()> {
        Box::pin(Self::delete(self, booking_id))
    }

    fn acknowledge_new_bookings(&self, seen: u32) -> CommandFuture<'_, ()> {
        Box::pin(self.clear_notifications(seen))
    }
}

/// Dependencies of the board reducer
#[derive(Clone)]
pub struct BoardEnvironment {
    commands: Arc<dyn BookingCommands>,
}

impl BoardEnvironment {
    /// Create a board environment
    #[must_use]
    pub fn new(commands: Arc<dyn BookingCommands>) -> Self {
        Self { commands }
    }

    /// Command sink
    #[must_use]
    pub fn commands(&self) -> Arc<dyn BookingCommands> {
        Arc::clone(&self.commands)
    }
}
