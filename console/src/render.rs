//! Plain-text rendering of the board.

use kinxplore_bookings::board::{BoardView, OpenDetail};
use kinxplore_bookings::{Booking, BookingStatistics, BookingStatus, Priority};
use std::fmt::Write;

/// Render the whole board, top to bottom
#[must_use]
pub fn board(view: &BoardView) -> String {
    let mut out = String::new();

    let _ = write!(out, "{}", statistics_line(&view.statistics));
    if view.loading {
        out.push_str(" loading...");
    }
    out.push('\n');
    if let Some(error) = &view.store_error {
        let _ = writeln!(out, "!! Showing last loaded bookings: {error}");
    }
    if view.notification_count > 0 {
        let _ = writeln!(out, "[{} new booking(s)]", view.notification_count);
    }

    for column in &view.columns {
        let _ = writeln!(out, "-- {} ({}) --", column.column.title(), column.cards.len());
        if let Some(placeholder) = column.placeholder() {
            let _ = writeln!(out, "   {placeholder}");
        }
        for booking in &column.cards {
            let _ = writeln!(out, "   {}", card(booking));
        }
    }

    if let Some(detail) = &view.detail {
        out.push_str(&detail_panel(detail));
    }
    if let Some(error) = &view.error {
        let _ = writeln!(out, "!! {error}");
    }
    out
}

/// One-line summary shown above the columns
#[must_use]
pub fn statistics_line(statistics: &BookingStatistics) -> String {
    let statuses = BookingStatus::ALL
        .into_iter()
        .map(|status| format!("{status} {}", statistics.by_status.get(status)))
        .collect::<Vec<_>>()
        .join(" | ");
    format!(
        "== {} bookings | {statuses} | revenue {} ==",
        statistics.total, statistics.total_revenue
    )
}

/// Full statistics for the `stats` command
#[must_use]
pub fn statistics_report(statistics: &BookingStatistics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total bookings:  {}", statistics.total);
    for status in BookingStatus::ALL {
        let _ = writeln!(out, "  {:<10} {}", status.as_str(), statistics.by_status.get(status));
    }
    for priority in Priority::ALL {
        let _ = writeln!(out, "  {:<10} {}", priority.as_str(), statistics.by_priority.get(priority));
    }
    let _ = writeln!(out, "Created today:   {}", statistics.created_today);
    let _ = writeln!(out, "This week:       {}", statistics.created_this_week);
    let _ = writeln!(out, "This month:      {}", statistics.created_this_month);
    let _ = writeln!(out, "Revenue:         {}", statistics.total_revenue);
    out
}

fn card(booking: &Booking) -> String {
    format!(
        "{}  {}  {}  {} to {} ({} nights, {} guests)  {}  {}",
        booking.id,
        booking.guest_name(),
        booking.destination_name().unwrap_or("-"),
        booking.check_in_date,
        booking.check_out_date,
        booking.nights(),
        booking.number_of_guests,
        booking.priority,
        booking.total_price,
    )
}

fn detail_panel(detail: &OpenDetail) -> String {
    let booking = &detail.booking;
    let mut out = String::new();

    let _ = write!(out, ">> {} [{}]", booking.id, booking.status);
    if detail.busy {
        out.push_str(" saving...");
    }
    out.push('\n');
    let _ = writeln!(out, "   guest:    {}", booking.guest_name());
    if let Some(email) = &booking.email {
        let _ = writeln!(out, "   email:    {email}");
    }
    if let Some(phone) = &booking.phone {
        let _ = writeln!(out, "   phone:    {phone}");
    }
    let _ = writeln!(out, "   trip:     {}", card(booking));
    if let Some(requests) = &booking.special_requests {
        let _ = writeln!(out, "   requests: {requests}");
    }
    let _ = writeln!(out, "   priority: {}", detail.draft.priority);
    let _ = writeln!(out, "   notes:    {}", detail.draft.notes);
    if detail.is_dirty() {
        out.push_str("   (unsaved changes, 'save' to keep them)\n");
    }
    out
}
