//! Domain types for the booking board.
//!
//! Field names follow the `bookings` table columns so rows deserialize
//! straight from the backend. Joined summaries are optional: the backend
//! omits them when the referenced row is gone or hidden by row-level rules.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Identifiers
// ============================================================================

/// Identifier of a booking (opaque, assigned by the backend)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(String);

impl BookingId {
    /// Wrap a backend identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookingId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifier of a user profile (customers and staff alike)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a backend identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Non-negative amount in cents
///
/// The backend stores prices as `numeric(10,2)` and may return them as JSON
/// numbers or strings; both are accepted. Serialized as a two-decimal string
/// so nothing is lost on the way back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(u64);

impl Money {
    /// Zero
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Adds two amounts, saturating at the maximum
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Reasons a price could not be read
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyParseError {
    /// Negative amounts are never valid
    #[error("amount is negative: {0}")]
    Negative(String),
    /// Not a decimal number, or more than two fractional digits
    #[error("not a two-decimal amount: {0}")]
    Malformed(String),
    /// Too large to represent in cents
    #[error("amount out of range: {0}")]
    OutOfRange(String),
}

impl FromStr for Money {
    type Err = MoneyParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let text = raw.trim();
        if text.starts_with('-') {
            return Err(MoneyParseError::Negative(raw.to_string()));
        }
        let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
        let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() || !digits_only(whole) || !digits_only(fraction) || fraction.len() > 2
        {
            return Err(MoneyParseError::Malformed(raw.to_string()));
        }

        let whole: u64 = whole
            .parse()
            .map_err(|_| MoneyParseError::OutOfRange(raw.to_string()))?;
        let fraction: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().unwrap_or(0) * 10,
            _ => fraction.parse::<u64>().unwrap_or(0),
        };

        whole
            .checked_mul(100)
            .and_then(|cents| cents.checked_add(fraction))
            .map(Self)
            .ok_or_else(|| MoneyParseError::OutOfRange(raw.to_string()))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MoneyVisitor;

        impl serde::de::Visitor<'_> for MoneyVisitor {
            type Value = Money;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative decimal amount")
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Money, E> {
                v.checked_mul(100)
                    .map(Money)
                    .ok_or_else(|| E::custom(MoneyParseError::OutOfRange(v.to_string())))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Money, E> {
                let unsigned = u64::try_from(v)
                    .map_err(|_| E::custom(MoneyParseError::Negative(v.to_string())))?;
                self.visit_u64(unsigned)
            }

            fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Money, E> {
                // Round through the two-decimal text form so 19.99 stays 1999
                format!("{v:.2}").parse().map_err(E::custom)
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Money, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(MoneyVisitor)
    }
}

// ============================================================================
// Enumerations
// ============================================================================

/// Lifecycle status of a booking
///
/// Any status may follow any other; the backend owns transition rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Awaiting staff review
    Pending,
    /// Accepted by staff
    Confirmed,
    /// Cancelled by the customer or staff
    Cancelled,
    /// Trip took place
    Completed,
}

impl BookingStatus {
    /// All statuses, in board order
    pub const ALL: [Self; 4] = [Self::Pending, Self::Confirmed, Self::Cancelled, Self::Completed];

    /// Lowercase wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown status '{s}'"))
    }
}

/// Staff-assigned urgency of a booking
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low
    Low,
    /// Medium (assumed when the backend has none)
    #[default]
    Medium,
    /// High
    High,
    /// Urgent
    Urgent,
}

impl Priority {
    /// All priorities, lowest first
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    /// Lowercase wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown priority '{s}'"))
    }
}

/// `null` and a missing key both mean "use the default"
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Joined summaries
// ============================================================================

/// Destination joined onto a booking
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationSummary {
    /// Destination id
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Cover image
    #[serde(default)]
    pub image_url: Option<String>,
    /// Free-form location text
    #[serde(default)]
    pub location: Option<String>,
}

/// Profile joined onto a booking (requesting user or assigned admin)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Profile id
    pub id: UserId,
    /// Full name
    #[serde(default)]
    pub full_name: Option<String>,
    /// Email
    #[serde(default)]
    pub email: Option<String>,
}

// ============================================================================
// Booking
// ============================================================================

/// A booking row with its denormalized joins
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Reconciliation key
    pub id: BookingId,
    /// Owning customer
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Booked destination
    #[serde(default)]
    pub destination_id: Option<String>,
    /// Arrival
    pub check_in_date: NaiveDate,
    /// Departure
    pub check_out_date: NaiveDate,
    /// Party size
    #[serde(default)]
    pub number_of_guests: u32,
    /// Total price, never negative
    pub total_price: Money,
    /// Lifecycle status
    pub status: BookingStatus,
    /// Urgency, `medium` when the row has none
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: Priority,
    /// Internal staff notes
    #[serde(default)]
    pub admin_notes: Option<String>,
    /// Staff member handling the booking
    #[serde(default)]
    pub assigned_to: Option<UserId>,

    // Guest contact
    /// Guest first name
    #[serde(default)]
    pub first_name: Option<String>,
    /// Guest last name
    #[serde(default)]
    pub last_name: Option<String>,
    /// Contact email
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone
    #[serde(default)]
    pub phone: Option<String>,
    /// Street address
    #[serde(default)]
    pub address: Option<String>,
    /// City
    #[serde(default)]
    pub city: Option<String>,
    /// Country
    #[serde(default)]
    pub country: Option<String>,
    /// Postal code
    #[serde(default)]
    pub postal_code: Option<String>,
    /// Free-text requests from the guest
    #[serde(default)]
    pub special_requests: Option<String>,

    // Audit
    /// Row creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// When the status last changed
    #[serde(default)]
    pub last_status_change_at: Option<DateTime<Utc>>,
    /// Who last changed the status
    #[serde(default)]
    pub last_status_change_by: Option<UserId>,
    /// Cancellation time
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Who cancelled
    #[serde(default)]
    pub cancelled_by: Option<UserId>,
    /// Why it was cancelled
    #[serde(default)]
    pub cancellation_reason: Option<String>,

    // Joins
    /// Destination summary
    #[serde(default)]
    pub destination: Option<DestinationSummary>,
    /// Requesting user summary
    #[serde(default)]
    pub user: Option<UserSummary>,
    /// Assigned admin summary
    #[serde(default)]
    pub assigned_admin: Option<UserSummary>,
}

impl Booking {
    /// Guest name as shown on a card, falling back to the account name
    #[must_use]
    pub fn guest_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !name.is_empty() {
            return name;
        }
        self.user
            .as_ref()
            .and_then(|user| user.full_name.clone())
            .unwrap_or_else(|| "Unknown guest".to_string())
    }

    /// Destination name, if joined
    #[must_use]
    pub fn destination_name(&self) -> Option<&str> {
        self.destination.as_ref()?.name.as_deref()
    }

    /// Nights between check-in and check-out
    #[must_use]
    pub fn nights(&self) -> i64 {
        (self.check_out_date - self.check_in_date).num_days().max(0)
    }
}

/// Partial update sent with `update()`
///
/// Only `Some` fields are written. The status-change stamps are filled by the
/// store whenever `status` is present; callers never set them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPatch {
    /// New status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
    /// New priority
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Replacement admin notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    /// New assignee
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<UserId>,
    /// Stamped by the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_status_change_at: Option<DateTime<Utc>>,
    /// Stamped by the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_status_change_by: Option<UserId>,
}

impl BookingPatch {
    /// A patch that only changes the status
    #[must_use]
    pub fn status(status: BookingStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Set the priority
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the admin notes
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.admin_notes = Some(notes.into());
        self
    }

    /// Set the assignee
    #[must_use]
    pub fn with_assignee(mut self, assignee: UserId) -> Self {
        self.assigned_to = Some(assignee);
        self
    }

    /// Whether the patch writes nothing
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.admin_notes.is_none()
            && self.assigned_to.is_none()
    }
}

/// Light projection used for statistics
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatRow {
    /// Status
    pub status: BookingStatus,
    /// Priority, `medium` when absent
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: Priority,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Price
    pub total_price: Money,
}

impl From<&Booking> for StatRow {
    fn from(booking: &Booking) -> Self {
        Self {
            status: booking.status,
            priority: booking.priority,
            created_at: booking.created_at,
            total_price: booking.total_price,
        }
    }
}
