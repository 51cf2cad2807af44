//! Actions for the board.

use crate::projection::PriorityFilter;
use crate::statistics::BookingStatistics;
use crate::types::{Booking, BookingId, BookingStatus, Priority};

/// User intents, store notifications and command results
#[derive(Clone, Debug)]
pub enum BoardAction {
    // ========== Store ==========
    /// The booking store changed
    StoreChanged {
        /// Current list
        bookings: Vec<Booking>,
        /// Current statistics
        statistics: BookingStatistics,
        /// Current unacknowledged inserts
        notification_count: u32,
        /// A store load is in flight
        loading: bool,
        /// Last store load failure
        error: Option<String>,
    },

    // ========== Navigation ==========
    /// Select a booking
    Open {
        /// Booking to show
        booking_id: BookingId,
    },
    /// Close the detail panel
    Close,

    // ========== Filter ==========
    /// Change the search text
    SetSearch {
        /// New query
        query: String,
    },
    /// Change the priority facet
    SetPriorityFilter {
        /// New facet
        filter: PriorityFilter,
    },

    // ========== Detail edits ==========
    /// Edit the draft priority
    EditPriority {
        /// New draft value
        priority: Priority,
    },
    /// Edit the draft notes
    EditNotes {
        /// New draft value
        notes: String,
    },
    /// Commit a status change immediately
    ChangeStatus {
        /// New status
        status: BookingStatus,
    },
    /// Commit the draft
    Save,
    /// Delete the selected booking
    Delete,

    // ========== Command results ==========
    /// An update went through
    UpdateSucceeded {
        /// Row returned by the store
        booking: Booking,
    },
    /// An update failed
    UpdateFailed {
        /// Target
        booking_id: BookingId,
        /// Error message
        message: String,
    },
    /// A delete went through
    DeleteSucceeded {
        /// Removed booking
        booking_id: BookingId,
    },
    /// A delete failed
    DeleteFailed {
        /// Target
        booking_id: BookingId,
        /// Error message
        message: String,
    },
    /// Clearing the notification counter failed
    AcknowledgeFailed {
        /// Error message
        message: String,
    },
    /// Hide the error banner
    DismissError,
}
