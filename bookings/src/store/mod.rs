//! Booking store: the authoritative local copy of the bookings table.
//!
//! # Architecture
//!
//! ```text
//! facade call ──► Update/Delete/Load ──► reducer ──► backend effect
//!                                                        │
//!            ◄── waiter released ◄── response action ◄───┘
//!
//! change feed ──► supervisor ──► ChangeReceived ──► reducer ──► full reload
//!
//! capability signal ──► supervisor ──► CapabilityChanged
//!                        (subscribes while granted, releases data on revoke)
//! ```
//!
//! Statistics are recomputed from scratch after every load and write;
//! realtime events never patch the list, they trigger a reload.

pub mod actions;
pub mod environment;
pub mod reducer;
#[allow(clippy::module_inception)]
pub mod store;
#[cfg(test)]
mod tests;
pub mod types;

pub use actions::BookingAction;
pub use environment::BookingEnvironment;
pub use reducer::BookingReducer;
pub use store::{BookingStore, BookingStoreConfig, SubscriptionGuard};
pub use types::{AdminCapability, BookingSnapshot, BookingState, FeedStatus, RequestId};
