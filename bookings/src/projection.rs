//! Board projection: status columns and per-column filtering.
//!
//! Pure functions over a booking snapshot. Input order is kept (the store
//! holds bookings newest first), nothing is re-sorted.

use crate::types::{Booking, BookingStatus, Priority};
use serde::{Deserialize, Serialize};

/// Placeholder shown for a column with nothing to display
pub const EMPTY_COLUMN_PLACEHOLDER: &str = "No bookings";

/// Priority facet of the board filter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityFilter {
    /// No restriction
    #[default]
    All,
    /// Only bookings with this priority
    Only(Priority),
}

impl PriorityFilter {
    fn admits(self, priority: Priority) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == priority,
        }
    }
}

/// Text and priority filter applied to each column
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardFilter {
    /// Free-text query; blank matches everything
    pub query: String,
    /// Priority facet
    pub priority: PriorityFilter,
}

impl BoardFilter {
    /// Whether a booking passes both facets
    ///
    /// The query is a case-insensitive substring of guest first name, guest
    /// last name, contact email or destination name. Absent fields never match.
    #[must_use]
    pub fn matches(&self, booking: &Booking) -> bool {
        self.priority.admits(booking.priority) && self.matches_query(booking)
    }

    fn matches_query(&self, booking: &Booking) -> bool {
        let needle = self.query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        [
            booking.first_name.as_deref(),
            booking.last_name.as_deref(),
            booking.email.as_deref(),
            booking.destination_name(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Board column
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoardColumn {
    /// Pending bookings
    Pending,
    /// Confirmed bookings
    Confirmed,
    /// Completed bookings
    Completed,
}

impl BoardColumn {
    /// Columns in display order
    pub const ALL: [Self; 3] = [Self::Pending, Self::Confirmed, Self::Completed];

    /// Column a status belongs to; cancelled bookings have none
    #[must_use]
    pub const fn for_status(status: BookingStatus) -> Option<Self> {
        match status {
            BookingStatus::Pending => Some(Self::Pending),
            BookingStatus::Confirmed => Some(Self::Confirmed),
            BookingStatus::Completed => Some(Self::Completed),
            BookingStatus::Cancelled => None,
        }
    }

    /// Column heading
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Completed => "Completed",
        }
    }
}

/// Bookings grouped by column
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoardBuckets {
    /// Pending column
    pub pending: Vec<Booking>,
    /// Confirmed column
    pub confirmed: Vec<Booking>,
    /// Completed column
    pub completed: Vec<Booking>,
}

impl BoardBuckets {
    /// Bookings in a column
    #[must_use]
    pub fn column(&self, column: BoardColumn) -> &[Booking] {
        match column {
            BoardColumn::Pending => &self.pending,
            BoardColumn::Confirmed => &self.confirmed,
            BoardColumn::Completed => &self.completed,
        }
    }

    /// Number of bookings across all columns
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len() + self.confirmed.len() + self.completed.len()
    }

    /// Whether every column is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, column: BoardColumn, booking: Booking) {
        match column {
            BoardColumn::Pending => self.pending.push(booking),
            BoardColumn::Confirmed => self.confirmed.push(booking),
            BoardColumn::Completed => self.completed.push(booking),
        }
    }
}

/// Split bookings into columns by status
#[must_use]
pub fn partition(bookings: &[Booking]) -> BoardBuckets {
    project(bookings, &BoardFilter::default())
}

/// Split bookings into columns and apply the filter to each
#[must_use]
pub fn project(bookings: &[Booking], filter: &BoardFilter) -> BoardBuckets {
    let mut buckets = BoardBuckets::default();
    for booking in bookings {
        if let Some(column) = BoardColumn::for_status(booking.status) {
            if filter.matches(booking) {
                buckets.push(column, booking.clone());
            }
        }
    }
    buckets
}
