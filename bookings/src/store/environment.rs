//! Environment for the booking store reducer.

use crate::backend::BookingBackend;
use crate::types::UserId;
use kinxplore_core::environment::Clock;
use std::sync::Arc;

/// Dependencies of the booking reducer
///
/// Production wires `SystemClock` and the PostgREST backend; tests use
/// `FixedClock` and `MockBookingBackend`.
#[derive(Clone)]
pub struct BookingEnvironment {
    clock: Arc<dyn Clock>,
    backend: Arc<dyn BookingBackend>,
    actor: Option<UserId>,
}

impl BookingEnvironment {
    /// Create an environment without an actor
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, backend: Arc<dyn BookingBackend>) -> Self {
        Self {
            clock,
            backend,
            actor: None,
        }
    }

    /// Staff member recorded on status changes
    #[must_use]
    pub fn with_actor(mut self, actor: UserId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Clock for audit stamps and statistics periods
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Remote data client
    #[must_use]
    pub fn backend(&self) -> Arc<dyn BookingBackend> {
        Arc::clone(&self.backend)
    }

    /// Staff member performing writes
    #[must_use]
    pub const fn actor(&self) -> Option<&UserId> {
        self.actor.as_ref()
    }
}

impl std::fmt::Debug for BookingEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingEnvironment")
            .field("actor", &self.actor)
            .finish_non_exhaustive()
    }
}
