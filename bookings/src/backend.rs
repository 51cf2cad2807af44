//! Remote data seams.
//!
//! The store never talks to the network directly. It goes through two
//! traits, both dyn-compatible so an environment can hold them as
//! `Arc<dyn ...>`:
//!
//! - [`BookingBackend`] - request/response calls on the bookings table
//! - [`ChangeFeed`] - realtime insert/update notifications
//!
//! # Implementations
//!
//! - `PostgrestBookingBackend` / `RealtimeChangeFeed` in `kinxplore-supabase`
//! - `MockBookingBackend` / `ManualChangeFeed` in [`crate::mocks`] for tests

use crate::types::{Booking, BookingId, BookingPatch, StatRow};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors from the remote data client
///
/// `Clone` so failures can travel inside store actions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Transport failure (DNS, TLS, connection reset, client timeout)
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Body did not match the expected shape
    #[error("Failed to parse response: {0}")]
    ResponseParseFailed(String),

    /// Credentials rejected (401/403)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The store holds no admin capability, so no call was made
    #[error("Admin capability is not granted")]
    CapabilityAbsent,

    /// The booking does not exist (or is not visible)
    #[error("Booking not found: {0}")]
    NotFound(String),

    /// Backend asked us to slow down (429)
    #[error("Rate limited by backend")]
    RateLimited,

    /// Any other non-success response
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// The change feed could not be established or broke
    #[error("Subscription failed: {0}")]
    SubscriptionFailed(String),
}

/// Boxed future returned by backend calls
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BackendError>> + Send + 'a>>;

/// Request/response access to the bookings table
pub trait BookingBackend: Send + Sync {
    /// All bookings with joins, newest `created_at` first
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the request fails or the body is malformed.
    fn list_bookings(&self) -> BackendFuture<'_, Vec<Booking>>;

    /// Light projection (status, priority, `created_at`, `total_price`)
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the request fails or the body is malformed.
    fn list_statistic_rows(&self) -> BackendFuture<'_, Vec<StatRow>>;

    /// Apply a partial update and return the authoritative row
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if no row has this id, or another
    /// [`BackendError`] if the request fails.
    fn update_booking<'a>(
        &'a self,
        id: &'a BookingId,
        patch: &'a BookingPatch,
    ) -> BackendFuture<'a, Booking>;

    /// Delete a booking
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the request fails.
    fn delete_booking<'a>(&'a self, id: &'a BookingId) -> BackendFuture<'a, ()>;
}

/// Kind of row change reported by the feed
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    /// Row inserted
    Insert,
    /// Row updated
    Update,
    /// Row deleted
    Delete,
    /// Anything the feed could not classify
    Other(String),
}

impl ChangeKind {
    /// Metric label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Other(_) => "other",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(raw) => write!(f, "other({raw})"),
            known => f.write_str(known.label()),
        }
    }
}

/// One realtime notification; every event invalidates the local copy
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// What happened
    pub kind: ChangeKind,
    /// Row id, when the payload carried one
    pub booking_id: Option<BookingId>,
}

impl ChangeEvent {
    /// An insert of `id`
    #[must_use]
    pub fn insert(id: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Insert,
            booking_id: Some(BookingId::new(id)),
        }
    }

    /// An update of `id`
    #[must_use]
    pub fn update(id: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Update,
            booking_id: Some(BookingId::new(id)),
        }
    }
}

/// Stream of change events; ends when the subscription is lost
pub type ChangeStream = Pin<Box<dyn Stream<Item = Result<ChangeEvent, BackendError>> + Send>>;

/// Realtime change notifications for the bookings table
pub trait ChangeFeed: Send + Sync {
    /// Open a subscription
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::SubscriptionFailed`] if the channel cannot be joined.
    fn subscribe(&self) -> BackendFuture<'_, ChangeStream>;
}
