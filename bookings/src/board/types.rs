//! Board state.

use crate::projection::{BoardBuckets, BoardFilter, project};
use crate::statistics::BookingStatistics;
use crate::types::{Booking, BookingId, BookingPatch, Priority};

/// Uncommitted edits in the detail panel
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Draft {
    /// Priority to save
    pub priority: Priority,
    /// Notes to save
    pub notes: String,
}

impl Draft {
    /// Draft matching a booking's saved values
    #[must_use]
    pub fn of(booking: &Booking) -> Self {
        Self {
            priority: booking.priority,
            notes: booking.admin_notes.clone().unwrap_or_default(),
        }
    }

    /// Patch with only the fields that differ from `booking`
    ///
    /// Untouched notes are left out, so a missing note stays missing.
    #[must_use]
    pub fn changes(&self, booking: &Booking) -> BookingPatch {
        let mut patch = BookingPatch::default();
        if self.priority != booking.priority {
            patch = patch.with_priority(self.priority);
        }
        if self.notes != booking.admin_notes.as_deref().unwrap_or_default() {
            patch = patch.with_notes(self.notes.clone());
        }
        patch
    }
}

/// Open detail panel
#[derive(Clone, Debug, PartialEq)]
pub struct OpenDetail {
    /// The selected booking as last seen in the store
    pub booking: Booking,
    /// Priority and notes edits
    pub draft: Draft,
    /// A write for this booking is in flight
    pub busy: bool,
}

impl OpenDetail {
    /// Whether the draft differs from the saved row
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.draft != Draft::of(&self.booking)
    }
}

/// Detail panel state machine
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Detail {
    /// No booking selected
    #[default]
    Closed,
    /// A booking is selected
    Open(OpenDetail),
}

impl Detail {
    /// Id of the selected booking
    #[must_use]
    pub fn selected(&self) -> Option<&BookingId> {
        match self {
            Self::Closed => None,
            Self::Open(open) => Some(&open.booking.id),
        }
    }
}

/// Transient board state plus the last store snapshot
///
/// The board never edits `bookings`; it is replaced wholesale by store
/// change notifications.
#[derive(Clone, Debug, Default)]
pub struct BoardState {
    /// Snapshot of the store list
    pub bookings: Vec<Booking>,
    /// Snapshot of the store statistics
    pub statistics: BookingStatistics,
    /// Snapshot of the notification counter
    pub notification_count: u32,
    /// The store is loading
    pub loading: bool,
    /// Last store load failure; the snapshot above is the last good data
    pub store_error: Option<String>,
    /// Search text and priority facet
    pub filter: BoardFilter,
    /// Detail panel
    pub detail: Detail,
    /// Last failed command, until dismissed or superseded
    pub last_error: Option<String>,
}

impl BoardState {
    /// Filtered columns for the current snapshot
    #[must_use]
    pub fn buckets(&self) -> BoardBuckets {
        project(&self.bookings, &self.filter)
    }

    /// Look up a booking in the snapshot
    #[must_use]
    pub fn booking(&self, id: &BookingId) -> Option<&Booking> {
        self.bookings.iter().find(|booking| &booking.id == id)
    }
}
