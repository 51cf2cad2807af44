//! # Kinxplore Supabase
//!
//! Production implementations of the booking store's environment traits:
//!
//! - [`PostgrestBookingBackend`]: [`BookingBackend`](kinxplore_bookings::BookingBackend)
//!   over the PostgREST API, plus the admin role probe
//! - [`RealtimeChangeFeed`]: [`ChangeFeed`](kinxplore_bookings::ChangeFeed)
//!   over Supabase realtime
//!
//! ## Example
//!
//! ```ignore
//! use kinxplore_supabase::{PostgrestBookingBackend, RealtimeChangeFeed, SupabaseConfig};
//!
//! let config = SupabaseConfig::new(url, anon_key).with_access_token(jwt);
//! let backend = PostgrestBookingBackend::new(config.clone())?;
//! let capability = backend.probe_capability(&actor).await?;
//! let feed = RealtimeChangeFeed::new(config);
//! ```

pub mod config;
pub mod postgrest;
pub mod realtime;

pub use config::SupabaseConfig;
pub use postgrest::PostgrestBookingBackend;
pub use realtime::{RealtimeChangeFeed, RealtimeMessage, parse_realtime_message};
