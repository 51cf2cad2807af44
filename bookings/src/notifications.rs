//! Unacknowledged new-booking counter.

use serde::{Deserialize, Serialize};

/// Number of bookings inserted since staff last acknowledged them
///
/// Goes up by one per realtime insert and back to zero on acknowledgment.
/// There is no decrement and it is never persisted. An acknowledgment only
/// covers the count the acknowledging view saw; if more inserts arrived
/// since, the counter stays as it is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationCounter(u32);

impl NotificationCounter {
    /// Count one insert
    pub const fn increment(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    /// Acknowledge everything
    pub const fn clear(&mut self) {
        self.0 = 0;
    }

    /// Acknowledge the `seen` inserts a view displayed
    ///
    /// Clears and returns `true` unless inserts arrived after that view.
    pub const fn acknowledge(&mut self, seen: u32) -> bool {
        if self.0 > seen {
            return false;
        }
        self.0 = 0;
        true
    }

    /// Current count
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.0
    }

    /// Whether anything is unacknowledged
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.0 > 0
    }
}
