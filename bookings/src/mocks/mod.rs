//! Mock implementations for testing.
//!
//! In-memory stand-ins for the remote data client and the board's command
//! sink, plus booking fixtures.

pub mod backend;
pub mod commands;
pub mod feed;
pub mod fixtures;

pub use backend::{MockBookingBackend, Operation};
pub use commands::{Command, RecordingCommands};
pub use feed::ManualChangeFeed;
pub use fixtures::{apply_patch, booking, booking_created};
