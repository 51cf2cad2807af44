//! Render-ready view of the board.

use crate::board::{BoardState, Detail, OpenDetail};
use crate::projection::{BoardColumn, EMPTY_COLUMN_PLACEHOLDER};
use crate::statistics::BookingStatistics;
use crate::types::Booking;

/// One column as displayed
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnView {
    /// Which column
    pub column: BoardColumn,
    /// Cards, in store order
    pub cards: Vec<Booking>,
}

impl ColumnView {
    /// Text shown instead of cards when the column is empty
    #[must_use]
    pub fn placeholder(&self) -> Option<&'static str> {
        self.cards.is_empty().then_some(EMPTY_COLUMN_PLACEHOLDER)
    }
}

/// Everything a frontend needs to draw the board
#[derive(Clone, Debug, PartialEq)]
pub struct BoardView {
    /// Pending, confirmed, completed
    pub columns: Vec<ColumnView>,
    /// Statistics line
    pub statistics: BookingStatistics,
    /// New-booking badge
    pub notification_count: u32,
    /// Detail panel, when open
    pub detail: Option<OpenDetail>,
    /// Error banner for the last failed command
    pub error: Option<String>,
    /// Busy indicator
    pub loading: bool,
    /// Load failure; cards shown are from the last successful load
    pub store_error: Option<String>,
}

impl BoardView {
    /// Project the board state
    #[must_use]
    pub fn of(state: &BoardState) -> Self {
        let mut buckets = state.buckets();
        let columns = BoardColumn::ALL
            .into_iter()
            .map(|column| ColumnView {
                column,
                cards: match column {
                    BoardColumn::Pending => std::mem::take(&mut buckets.pending),
                    BoardColumn::Confirmed => std::mem::take(&mut buckets.confirmed),
                    BoardColumn::Completed => std::mem::take(&mut buckets.completed),
                },
            })
            .collect();

        Self {
            columns,
            statistics: state.statistics,
            notification_count: state.notification_count,
            detail: match &state.detail {
                Detail::Open(open) => Some(open.clone()),
                Detail::Closed => None,
            },
            error: state.last_error.clone(),
            loading: state.loading,
            store_error: state.store_error.clone(),
        }
    }
}
