//! # Kinxplore Testing
//!
//! Testing utilities and helpers for the Kinxplore booking board.
//!
//! This crate provides:
//! - Deterministic clocks
//! - A fluent Given-When-Then harness for reducers
//! - An effect runner that resolves effect descriptions into the actions
//!   they produce, without a Store
//!
//! ## Example
//!
//! ```ignore
//! use kinxplore_testing::{drive, test_clock};
//!
//! #[tokio::test]
//! async fn test_load_flow() {
//!     let env = test_environment();
//!     let mut state = BookingState::default();
//!
//!     let produced = drive(&BookingReducer, &mut state, BookingAction::load(), &env).await;
//!
//!     assert!(matches!(produced.last(), Some(BookingAction::Loaded { .. })));
//!     assert_eq!(state.bookings.len(), 3);
//! }
//! ```

use chrono::{DateTime, Utc};
use kinxplore_core::environment::Clock;

pub mod effects;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::{Arc, RwLock};

    /// Fixed clock for deterministic tests
    ///
    /// Returns the same time until moved with [`FixedClock::set`]. Clones
    /// share the same instant, so a test can keep a handle and move the clock
    /// under an environment that owns another clone.
    ///
    /// # Example
    ///
    /// ```
    /// use kinxplore_testing::mocks::FixedClock;
    /// use kinxplore_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: Arc<RwLock<DateTime<Utc>>>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(RwLock::new(time)),
            }
        }

        /// Move the clock to a new instant
        pub fn set(&self, time: DateTime<Utc>) {
            match self.time.write() {
                Ok(mut guard) => *guard = time,
                Err(poisoned) => *poisoned.into_inner() = time,
            }
        }

        /// Advance the clock
        pub fn advance(&self, by: chrono::Duration) {
            let next = self.now() + by;
            self.set(next);
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            match self.time.read() {
                Ok(guard) => *guard,
                Err(poisoned) => *poisoned.into_inner(),
            }
        }
    }

    /// Create a default fixed clock for tests (Wednesday 2025-06-18 10:30:00 UTC)
    ///
    /// Midweek and mid-month, so "this week" and "this month" both reach
    /// back past "today".
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-06-18T10:30:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test helpers and utilities
pub mod helpers {
    use tracing_subscriber::EnvFilter;

    /// Route `tracing` output to the test harness
    ///
    /// Safe to call from every test; only the first call installs the
    /// subscriber. Filter with `RUST_LOG`, defaults to `warn`.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use effects::{collect_actions, drive};
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
        assert_eq!(time1.weekday(), chrono::Weekday::Wed);
    }

    #[test]
    fn test_clones_share_instant() {
        let clock = test_clock();
        let handle = clock.clone();
        let start = clock.now();

        handle.advance(chrono::Duration::hours(2));

        assert_eq!(clock.now(), start + chrono::Duration::hours(2));
    }
}
