//! Actions for the booking store.

use crate::backend::{BackendError, ChangeEvent};
use crate::store::types::{AdminCapability, RequestId};
use crate::types::{Booking, BookingId, BookingPatch, StatRow};

/// Everything the booking store reacts to
///
/// Commands come from the facade (with a [`RequestId`] when a caller is
/// waiting), responses come back from backend effects, and feed events come
/// from the subscription supervisor.
#[derive(Clone, Debug)]
pub enum BookingAction {
    // ========== Capability ==========
    /// The admin capability signal changed
    CapabilityChanged {
        /// New value
        capability: AdminCapability,
    },

    // ========== Loads ==========
    /// Fetch the full booking list
    Load {
        /// Waiting caller, if any
        request: Option<RequestId>,
    },
    /// List fetched
    Loaded {
        /// Waiting caller, if any
        request: Option<RequestId>,
        /// Load generation the fetch was issued under
        generation: u64,
        /// Rows, newest first
        bookings: Vec<Booking>,
    },
    /// List fetch failed
    LoadFailed {
        /// Waiting caller, if any
        request: Option<RequestId>,
        /// Load generation the fetch was issued under
        generation: u64,
        /// Cause
        error: BackendError,
    },
    /// Fetch the statistics projection
    LoadStatistics {
        /// Waiting caller, if any
        request: Option<RequestId>,
    },
    /// Statistics projection fetched
    StatisticsLoaded {
        /// Waiting caller, if any
        request: Option<RequestId>,
        /// Statistics generation the fetch was issued under
        generation: u64,
        /// Light rows
        rows: Vec<StatRow>,
    },
    /// Statistics fetch failed
    StatisticsLoadFailed {
        /// Waiting caller, if any
        request: Option<RequestId>,
        /// Statistics generation the fetch was issued under
        generation: u64,
        /// Cause
        error: BackendError,
    },

    // ========== Writes ==========
    /// Write a partial update through to the backend
    Update {
        /// Waiting caller
        request: RequestId,
        /// Target
        booking_id: BookingId,
        /// Fields to write
        patch: BookingPatch,
    },
    /// Backend confirmed the update
    Updated {
        /// Waiting caller
        request: RequestId,
        /// Write token issued with the update
        token: u64,
        /// Authoritative row
        booking: Booking,
    },
    /// Update failed
    UpdateFailed {
        /// Waiting caller
        request: RequestId,
        /// Write token issued with the update
        token: u64,
        /// Target
        booking_id: BookingId,
        /// Cause
        error: BackendError,
    },
    /// Delete a booking
    Delete {
        /// Waiting caller
        request: RequestId,
        /// Target
        booking_id: BookingId,
    },
    /// Backend confirmed the delete
    Deleted {
        /// Waiting caller
        request: RequestId,
        /// Removed booking
        booking_id: BookingId,
    },
    /// Delete failed
    DeleteFailed {
        /// Waiting caller
        request: RequestId,
        /// Target
        booking_id: BookingId,
        /// Cause
        error: BackendError,
    },
    /// A command was refused without calling the backend
    Rejected {
        /// Waiting caller, if any
        request: Option<RequestId>,
        /// Why
        error: BackendError,
    },

    // ========== Realtime ==========
    /// A feed subscription was (re)established
    FeedConnected,
    /// The feed ended or could not be opened
    FeedLost {
        /// What happened
        reason: String,
    },
    /// A change event arrived
    ChangeReceived {
        /// The event
        event: ChangeEvent,
    },

    // ========== Notifications ==========
    /// Staff saw `seen` new bookings
    ///
    /// Clears the counter unless more inserts arrived since.
    ClearNotifications {
        /// Count the acknowledging view displayed
        seen: u32,
    },
}

impl BookingAction {
    /// The request this action answers, if it is a response
    #[must_use]
    pub const fn responds_to(&self) -> Option<RequestId> {
        match self {
            Self::Loaded { request, .. }
            | Self::LoadFailed { request, .. }
            | Self::StatisticsLoaded { request, .. }
            | Self::StatisticsLoadFailed { request, .. }
            | Self::Rejected { request, .. } => *request,
            Self::Updated { request, .. }
            | Self::UpdateFailed { request, .. }
            | Self::Deleted { request, .. }
            | Self::DeleteFailed { request, .. } => Some(*request),
            _ => None,
        }
    }
}
