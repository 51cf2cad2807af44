//! Booking fixtures for tests.

use crate::types::{Booking, BookingId, BookingPatch, BookingStatus, Money, Priority};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// A minimal booking: one guest, two nights in July 2025, 100.00,
/// created 2025-06-01T00:00:00Z, priority medium, no joins
#[must_use]
pub fn booking(id: &str, status: BookingStatus) -> Booking {
    let check_in = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap_or_default();
    let check_out = NaiveDate::from_ymd_opt(2025, 7, 3).unwrap_or_default();
    let created_at = Utc
        .with_ymd_and_hms(2025, 6, 1, 0, 0, 0)
        .single()
        .unwrap_or_default();

    Booking {
        id: BookingId::new(id),
        user_id: None,
        destination_id: None,
        check_in_date: check_in,
        check_out_date: check_out,
        number_of_guests: 1,
        total_price: Money::from_cents(10_000),
        status,
        priority: Priority::Medium,
        admin_notes: None,
        assigned_to: None,
        first_name: None,
        last_name: None,
        email: None,
        phone: None,
        address: None,
        city: None,
        country: None,
        postal_code: None,
        special_requests: None,
        created_at,
        updated_at: None,
        last_status_change_at: None,
        last_status_change_by: None,
        cancelled_at: None,
        cancelled_by: None,
        cancellation_reason: None,
        destination: None,
        user: None,
        assigned_admin: None,
    }
}

/// [`booking`] created at a given instant
#[must_use]
pub fn booking_created(id: &str, status: BookingStatus, created_at: DateTime<Utc>) -> Booking {
    Booking {
        created_at,
        ..booking(id, status)
    }
}

/// Apply a patch the way the backend would
pub fn apply_patch(booking: &mut Booking, patch: &BookingPatch) {
    if let Some(status) = patch.status {
        booking.status = status;
    }
    if let Some(priority) = patch.priority {
        booking.priority = priority;
    }
    if let Some(notes) = &patch.admin_notes {
        booking.admin_notes = Some(notes.clone());
    }
    if let Some(assignee) = &patch.assigned_to {
        booking.assigned_to = Some(assignee.clone());
    }
    if let Some(at) = patch.last_status_change_at {
        booking.last_status_change_at = Some(at);
    }
    if let Some(by) = &patch.last_status_change_by {
        booking.last_status_change_by = Some(by.clone());
    }
}
