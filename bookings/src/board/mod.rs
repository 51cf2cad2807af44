//! Board: columns, filters and the booking detail panel.
//!
//! The board keeps only transient state (selection, filter, draft) plus a
//! read snapshot of the booking store. Writes go back through
//! [`BookingCommands`]; the board never edits its snapshot.
//!
//! ```text
//! BookingStore ──revision──► bridge ──StoreChanged──► BoardStore
//!      ▲                                                  │
//!      └──────────── update / delete / acknowledge ◄──────┘
//! ```

pub mod actions;
pub mod environment;
pub mod reducer;
pub mod types;
pub mod view;

pub use actions::BoardAction;
pub use environment::{BoardEnvironment, BookingCommands, CommandFuture};
pub use reducer::BoardReducer;
pub use types::{BoardState, Detail, Draft, OpenDetail};
pub use view::{BoardView, ColumnView};

use crate::store::BookingStore;
use kinxplore_runtime::Store;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Runtime store for the board
pub type BoardStore = Store<BoardState, BoardAction, BoardEnvironment, BoardReducer>;

/// Create a board wired to a booking store
#[must_use]
pub fn board_for(bookings: &BookingStore) -> BoardStore {
    let commands: Arc<dyn BookingCommands> = Arc::new(bookings.clone());
    Store::new(
        BoardState::default(),
        BoardReducer::new(),
        BoardEnvironment::new(commands),
    )
}

/// Forward every booking store change to the board
///
/// Pushes the current snapshot first, then one `StoreChanged` per observed
/// revision (bursts coalesce). Ends when the board shuts down.
pub fn spawn_bridge(bookings: BookingStore, board: BoardStore) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut revisions = bookings.subscribe();
        loop {
            let _ = revisions.borrow_and_update();
            let snapshot = bookings.snapshot().await;
            let action = BoardAction::StoreChanged {
                bookings: snapshot.bookings,
                statistics: snapshot.statistics,
                notification_count: snapshot.notification_count,
                loading: snapshot.loading,
                error: snapshot.error,
            };
            if board.send(action).await.is_err() {
                tracing::debug!("Board stopped, ending bridge");
                return;
            }
            if revisions.changed().await.is_err() {
                return;
            }
        }
    })
}
