//! # Kinxplore Bookings
//!
//! Client-side core of the Kinxplore staff booking board.
//!
//! ## Components
//!
//! - [`store`]: the Booking Store, the authoritative local copy of all
//!   bookings plus derived statistics. Reconciles backend responses and
//!   realtime change events; mediates every write.
//! - [`notifications`]: counter of inserted bookings nobody has looked at yet.
//! - [`projection`]: pure partition of the list into board columns and the
//!   per-column text/priority filter.
//! - [`board`]: the board state machine (selection, draft edits, filter)
//!   that forwards writes back into the store.
//! - [`backend`]: traits for the remote data client and change feed.
//!
//! ## Example
//!
//! ```ignore
//! use kinxplore_bookings::prelude::*;
//!
//! let env = BookingEnvironment::new(Arc::new(SystemClock), backend).with_actor(actor);
//! let store = BookingStore::new(env, BookingStoreConfig::default());
//! let _guard = store.attach(capability_rx, feed);
//!
//! let board = board_for(&store);
//! let _bridge = spawn_bridge(store.clone(), board.clone());
//!
//! board.send(BoardAction::Open { booking_id: "b-42".into() }).await?;
//! board.send(BoardAction::ChangeStatus { status: BookingStatus::Confirmed }).await?;
//! ```

pub mod backend;
pub mod board;
pub mod error;
pub mod notifications;
pub mod projection;
pub mod statistics;
pub mod store;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use backend::{
    BackendError, BackendFuture, BookingBackend, ChangeEvent, ChangeFeed, ChangeKind,
    ChangeStream,
};
pub use error::{BookingError, Result};
pub use statistics::BookingStatistics;
pub use types::{
    Booking, BookingId, BookingPatch, BookingStatus, DestinationSummary, Money, Priority,
    StatRow, UserId, UserSummary,
};

/// Everything needed to wire a board
pub mod prelude {
    pub use crate::backend::{BookingBackend, ChangeFeed};
    pub use crate::board::{
        BoardAction, BoardState, BoardStore, BoardView, BookingCommands, board_for, spawn_bridge,
    };
    pub use crate::projection::{BoardColumn, BoardFilter, PriorityFilter};
    pub use crate::store::{
        AdminCapability, BookingEnvironment, BookingStore, BookingStoreConfig, SubscriptionGuard,
    };
    pub use crate::types::{Booking, BookingId, BookingPatch, BookingStatus, Priority, UserId};
    pub use kinxplore_core::environment::SystemClock;
    pub use std::sync::Arc;
}
