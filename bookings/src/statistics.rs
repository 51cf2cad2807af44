//! Booking statistics.
//!
//! Always recomputed from a full set of rows, never patched incrementally.
//! Period boundaries are UTC and taken from the clock at computation time:
//! "this week" starts Monday 00:00, "this month" on the 1st at 00:00.

use crate::types::{Booking, BookingStatus, Money, Priority, StatRow};
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Counts per booking status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Pending
    pub pending: usize,
    /// Confirmed
    pub confirmed: usize,
    /// Cancelled
    pub cancelled: usize,
    /// Completed
    pub completed: usize,
}

impl StatusCounts {
    /// Count for one status
    #[must_use]
    pub const fn get(&self, status: BookingStatus) -> usize {
        match status {
            BookingStatus::Pending => self.pending,
            BookingStatus::Confirmed => self.confirmed,
            BookingStatus::Cancelled => self.cancelled,
            BookingStatus::Completed => self.completed,
        }
    }

    /// Sum over all statuses
    #[must_use]
    pub const fn sum(&self) -> usize {
        self.pending + self.confirmed + self.cancelled + self.completed
    }

    const fn bump(&mut self, status: BookingStatus) {
        match status {
            BookingStatus::Pending => self.pending += 1,
            BookingStatus::Confirmed => self.confirmed += 1,
            BookingStatus::Cancelled => self.cancelled += 1,
            BookingStatus::Completed => self.completed += 1,
        }
    }
}

/// Counts per priority
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    /// Low
    pub low: usize,
    /// Medium
    pub medium: usize,
    /// High
    pub high: usize,
    /// Urgent
    pub urgent: usize,
}

impl PriorityCounts {
    /// Count for one priority
    #[must_use]
    pub const fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::Low => self.low,
            Priority::Medium => self.medium,
            Priority::High => self.high,
            Priority::Urgent => self.urgent,
        }
    }

    const fn bump(&mut self, priority: Priority) {
        match priority {
            Priority::Low => self.low += 1,
            Priority::Medium => self.medium += 1,
            Priority::High => self.high += 1,
            Priority::Urgent => self.urgent += 1,
        }
    }
}

/// Aggregate figures shown above the board
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingStatistics {
    /// Number of bookings
    pub total: usize,
    /// Per status
    pub by_status: StatusCounts,
    /// Per priority
    pub by_priority: PriorityCounts,
    /// Created since 00:00 today
    pub created_today: usize,
    /// Created since Monday 00:00
    pub created_this_week: usize,
    /// Created since the 1st of the month
    pub created_this_month: usize,
    /// Sum of prices over bookings that are not cancelled
    pub total_revenue: Money,
}

impl BookingStatistics {
    /// Compute statistics over the light projection
    #[must_use]
    pub fn compute<'a, I>(rows: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a StatRow>,
    {
        let periods = Periods::at(now);
        let mut stats = Self::default();

        for row in rows {
            stats.total += 1;
            stats.by_status.bump(row.status);
            stats.by_priority.bump(row.priority);

            if row.created_at >= periods.today {
                stats.created_today += 1;
            }
            if row.created_at >= periods.week {
                stats.created_this_week += 1;
            }
            if row.created_at >= periods.month {
                stats.created_this_month += 1;
            }
            if row.status != BookingStatus::Cancelled {
                stats.total_revenue = stats.total_revenue.saturating_add(row.total_price);
            }
        }

        stats
    }

    /// Compute statistics over full booking rows
    #[must_use]
    pub fn from_bookings(bookings: &[Booking], now: DateTime<Utc>) -> Self {
        let rows: Vec<StatRow> = bookings.iter().map(StatRow::from).collect();
        Self::compute(&rows, now)
    }
}

/// Period starts for one computation
struct Periods {
    today: DateTime<Utc>,
    week: DateTime<Utc>,
    month: DateTime<Utc>,
}

impl Periods {
    fn at(now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let week = today
            .checked_sub_days(Days::new(u64::from(today.weekday().num_days_from_monday())))
            .unwrap_or(today);
        let month = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);

        Self {
            today: midnight(today),
            week: midnight(week),
            month: midnight(month),
        }
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
