//! State and value types for the booking store.

use crate::notifications::NotificationCounter;
use crate::statistics::BookingStatistics;
use crate::types::{Booking, BookingId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Whether the signed-in staff member may manage bookings
///
/// Published by whoever establishes the session (a role probe in the
/// console). The store makes no backend call while it is `Absent`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminCapability {
    /// Not signed in, or not an admin
    #[default]
    Absent,
    /// Admin privileges confirmed
    Granted,
}

impl AdminCapability {
    /// Whether calls are allowed
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Correlates a facade call with the action that answers it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    /// Wrap a raw id
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Connection state of the realtime feed, for display
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedStatus {
    /// No subscription
    #[default]
    Disconnected,
    /// Subscribed and receiving
    Connected,
}

/// Writes to one booking whose responses are still outstanding
///
/// Tokens grow with issue order. A confirmed row older than `latest` is
/// held back; it is applied only if the latest write fails.
#[derive(Clone, Debug, Default)]
pub(crate) struct PendingWrites {
    /// Newest issued token
    pub(crate) latest: u64,
    /// Responses not yet received
    pub(crate) in_flight: usize,
    /// The latest write has answered
    pub(crate) latest_settled: bool,
    /// Token of the row last applied from these writes
    pub(crate) applied: u64,
    /// Newest confirmed row not yet applied
    pub(crate) held: Option<(u64, Booking)>,
}

impl PendingWrites {
    /// Record a response; returns the row to apply, if any
    pub(crate) fn settle(&mut self, token: u64, confirmed: Option<Booking>) -> Option<Booking> {
        self.in_flight = self.in_flight.saturating_sub(1);
        if token == self.latest {
            self.latest_settled = true;
        }
        if let Some(row) = confirmed {
            let newer = self.held.as_ref().is_none_or(|(held, _)| token > *held);
            if token > self.applied && newer {
                self.held = Some((token, row));
            }
        }
        if !self.latest_settled {
            return None;
        }
        let (token, row) = self.held.take()?;
        self.applied = token;
        Some(row)
    }

    /// No response is outstanding
    pub(crate) const fn is_drained(&self) -> bool {
        self.in_flight == 0
    }
}

/// Authoritative local copy of the bookings table
///
/// Owned by the booking store's reducer; everything else reads snapshots.
#[derive(Clone, Debug, Default)]
pub struct BookingState {
    /// Bookings, newest created first, one row per id
    pub bookings: Vec<Booking>,
    /// Derived figures, recomputed after every load and write
    pub statistics: BookingStatistics,
    /// Unacknowledged inserts
    pub notifications: NotificationCounter,
    /// Current capability
    pub capability: AdminCapability,
    /// Realtime feed status
    pub feed: FeedStatus,
    /// A booking list load is in flight
    pub loading: bool,
    /// A statistics load is in flight
    pub stats_loading: bool,
    /// Last load failure, cleared by the next successful load
    pub error: Option<String>,

    /// Generation of the newest issued list load
    pub(crate) load_generation: u64,
    /// Generation of the newest issued statistics load
    pub(crate) stats_generation: u64,
    /// Outstanding writes per booking
    pub(crate) writes: HashMap<BookingId, PendingWrites>,
    pub(crate) next_write_token: u64,
    /// Feed sessions opened since the capability was granted
    pub(crate) feed_sessions: u64,
}

impl BookingState {
    /// Create an empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a booking by id
    #[must_use]
    pub fn booking(&self, id: &BookingId) -> Option<&Booking> {
        self.bookings.iter().find(|booking| &booking.id == id)
    }

    /// Whether a write to this booking is awaiting its response
    #[must_use]
    pub fn has_pending_write(&self, id: &BookingId) -> bool {
        self.writes.contains_key(id)
    }

    /// Copy of what observers need
    #[must_use]
    pub fn snapshot(&self) -> BookingSnapshot {
        BookingSnapshot {
            bookings: self.bookings.clone(),
            statistics: self.statistics,
            notification_count: self.notifications.count(),
            capability: self.capability,
            feed: self.feed,
            loading: self.loading || self.stats_loading,
            error: self.error.clone(),
        }
    }
}

/// Read-only copy of the booking state handed to the board
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BookingSnapshot {
    /// Bookings, newest created first
    pub bookings: Vec<Booking>,
    /// Statistics
    pub statistics: BookingStatistics,
    /// Unacknowledged inserts
    pub notification_count: u32,
    /// Current capability
    pub capability: AdminCapability,
    /// Realtime feed status
    pub feed: FeedStatus,
    /// Any load in flight
    pub loading: bool,
    /// Last load failure
    pub error: Option<String>,
}
