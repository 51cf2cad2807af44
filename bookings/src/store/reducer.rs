//! Reducer for the booking store.

use crate::backend::{BackendError, ChangeKind};
use crate::statistics::BookingStatistics;
use crate::store::{
    AdminCapability, BookingAction, BookingEnvironment, BookingState, FeedStatus, RequestId,
};
use crate::types::{Booking, BookingId, BookingPatch};
use kinxplore_core::{effect::Effect, reducer::Reducer};
use smallvec::{SmallVec, smallvec};

type Effects = SmallVec<[Effect<BookingAction>; 4]>;

/// Reconciles backend responses and feed events into one booking list.
///
/// - Loads carry a generation; only the newest issued load is applied.
/// - Updates carry a per-booking write token; only the latest write's
///   response replaces the row, unless it fails, in which case the newest
///   earlier confirmation does. Earlier callers still get their response.
/// - Nothing is written to the list before the backend confirms it.
/// - No backend call is made while the admin capability is absent.
#[derive(Clone, Copy, Debug, Default)]
pub struct BookingReducer;

impl BookingReducer {
    /// Create a new booking reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn reject(request: Option<RequestId>) -> Effects {
        tracing::debug!(?request, "Rejected booking command: capability absent");
        smallvec![Effect::future(async move {
            Some(BookingAction::Rejected {
                request,
                error: BackendError::CapabilityAbsent,
            })
        })]
    }

    fn start_load(
        state: &mut BookingState,
        env: &BookingEnvironment,
        request: Option<RequestId>,
    ) -> Effect<BookingAction> {
        state.load_generation += 1;
        state.loading = true;
        let generation = state.load_generation;
        let backend = env.backend();

        Effect::future(async move {
            Some(match backend.list_bookings().await {
                Ok(bookings) => BookingAction::Loaded {
                    request,
                    generation,
                    bookings,
                },
                Err(error) => BookingAction::LoadFailed {
                    request,
                    generation,
                    error,
                },
            })
        })
    }

    fn start_statistics_load(
        state: &mut BookingState,
        env: &BookingEnvironment,
        request: Option<RequestId>,
    ) -> Effect<BookingAction> {
        state.stats_generation += 1;
        state.stats_loading = true;
        let generation = state.stats_generation;
        let backend = env.backend();

        Effect::future(async move {
            Some(match backend.list_statistic_rows().await {
                Ok(rows) => BookingAction::StatisticsLoaded {
                    request,
                    generation,
                    rows,
                },
                Err(error) => BookingAction::StatisticsLoadFailed {
                    request,
                    generation,
                    error,
                },
            })
        })
    }

    fn reload_all(state: &mut BookingState, env: &BookingEnvironment) -> Effects {
        smallvec![
            Self::start_load(state, env, None),
            Self::start_statistics_load(state, env, None),
        ]
    }

    fn recompute_statistics(state: &mut BookingState, env: &BookingEnvironment) {
        state.statistics = BookingStatistics::from_bookings(&state.bookings, env.clock().now());
    }

    /// Record a write response and return the row to apply, if any.
    ///
    /// Only the latest write's confirmation replaces the row. If the latest
    /// write fails, the newest earlier confirmation is applied instead, since
    /// the backend holds that change.
    fn settle_write(
        state: &mut BookingState,
        booking_id: &BookingId,
        token: u64,
        confirmed: Option<Booking>,
    ) -> Option<Booking> {
        let writes = state.writes.get_mut(booking_id)?;
        let row = writes.settle(token, confirmed);
        if writes.is_drained() {
            state.writes.remove(booking_id);
        }
        row
    }

    fn apply_row(state: &mut BookingState, env: &BookingEnvironment, booking: Booking) {
        if let Some(row) = state.bookings.iter_mut().find(|row| row.id == booking.id) {
            *row = booking;
            Self::recompute_statistics(state, env);
        }
    }

    fn revoke(state: &mut BookingState) {
        // Bumping generations makes in-flight loads stale
        state.load_generation += 1;
        state.stats_generation += 1;
        state.bookings.clear();
        state.statistics = BookingStatistics::default();
        state.notifications.clear();
        state.writes.clear();
        state.loading = false;
        state.stats_loading = false;
        state.error = None;
        state.feed = FeedStatus::Disconnected;
        state.feed_sessions = 0;
    }

    fn stamp_status_change(patch: &mut BookingPatch, env: &BookingEnvironment) {
        if patch.status.is_some() {
            patch.last_status_change_at = Some(env.clock().now());
            patch.last_status_change_by = env.actor().cloned();
        }
    }
}

impl Reducer for BookingReducer {
    type State = BookingState;
    type Action = BookingAction;
    type Environment = BookingEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per action keeps the flow readable
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Capability ==========
            BookingAction::CapabilityChanged { capability } => {
                if capability == state.capability {
                    return SmallVec::new();
                }
                tracing::info!(?capability, "Admin capability changed");
                state.capability = capability;

                match capability {
                    AdminCapability::Granted => Self::reload_all(state, env),
                    AdminCapability::Absent => {
                        Self::revoke(state);
                        SmallVec::new()
                    },
                }
            },

            // ========== Loads ==========
            BookingAction::Load { request } => {
                if !state.capability.is_granted() {
                    return Self::reject(request);
                }
                smallvec![Self::start_load(state, env, request)]
            },

            BookingAction::Loaded {
                generation,
                bookings,
                ..
            } => {
                if generation != state.load_generation {
                    tracing::debug!(generation, current = state.load_generation, "Ignoring stale load");
                    return SmallVec::new();
                }
                tracing::debug!(count = bookings.len(), "Bookings loaded");
                state.bookings = bookings;
                state.loading = false;
                state.error = None;
                Self::recompute_statistics(state, env);
                SmallVec::new()
            },

            BookingAction::LoadFailed {
                generation, error, ..
            } => {
                if generation != state.load_generation {
                    return SmallVec::new();
                }
                tracing::warn!(error = %error, "Failed to load bookings");
                state.loading = false;
                state.error = Some(error.to_string());
                SmallVec::new()
            },

            BookingAction::LoadStatistics { request } => {
                if !state.capability.is_granted() {
                    return Self::reject(request);
                }
                smallvec![Self::start_statistics_load(state, env, request)]
            },

            BookingAction::StatisticsLoaded {
                generation, rows, ..
            } => {
                if generation != state.stats_generation {
                    return SmallVec::new();
                }
                state.statistics = BookingStatistics::compute(&rows, env.clock().now());
                state.stats_loading = false;
                SmallVec::new()
            },

            BookingAction::StatisticsLoadFailed {
                generation, error, ..
            } => {
                if generation != state.stats_generation {
                    return SmallVec::new();
                }
                tracing::warn!(error = %error, "Failed to load booking statistics");
                state.stats_loading = false;
                state.error = Some(error.to_string());
                SmallVec::new()
            },

            // ========== Writes ==========
            BookingAction::Update {
                request,
                booking_id,
                mut patch,
            } => {
                if !state.capability.is_granted() {
                    return Self::reject(Some(request));
                }
                Self::stamp_status_change(&mut patch, env);

                state.next_write_token += 1;
                let token = state.next_write_token;
                let writes = state.writes.entry(booking_id.clone()).or_default();
                writes.latest = token;
                writes.in_flight += 1;
                writes.latest_settled = false;

                tracing::debug!(%booking_id, token, "Updating booking");
                let backend = env.backend();
                smallvec![Effect::future(async move {
                    Some(match backend.update_booking(&booking_id, &patch).await {
                        Ok(booking) => BookingAction::Updated {
                            request,
                            token,
                            booking,
                        },
                        Err(error) => BookingAction::UpdateFailed {
                            request,
                            token,
                            booking_id,
                            error,
                        },
                    })
                })]
            },

            BookingAction::Updated { token, booking, .. } => {
                metrics::counter!("bookings.writes", "op" => "update", "outcome" => "ok")
                    .increment(1);
                let booking_id = booking.id.clone();
                if let Some(row) = Self::settle_write(state, &booking_id, token, Some(booking)) {
                    Self::apply_row(state, env, row);
                } else {
                    tracing::debug!(%booking_id, token, "Not applying superseded update response");
                }
                SmallVec::new()
            },

            BookingAction::UpdateFailed {
                token,
                booking_id,
                error,
                ..
            } => {
                metrics::counter!("bookings.writes", "op" => "update", "outcome" => "error")
                    .increment(1);
                tracing::warn!(%booking_id, error = %error, "Failed to update booking");
                if let Some(row) = Self::settle_write(state, &booking_id, token, None) {
                    tracing::debug!(%booking_id, "Applying earlier confirmed update");
                    Self::apply_row(state, env, row);
                }
                SmallVec::new()
            },

            BookingAction::Delete {
                request,
                booking_id,
            } => {
                if !state.capability.is_granted() {
                    return Self::reject(Some(request));
                }
                tracing::debug!(%booking_id, "Deleting booking");
                let backend = env.backend();
                smallvec![Effect::future(async move {
                    Some(match backend.delete_booking(&booking_id).await {
                        Ok(()) => BookingAction::Deleted {
                            request,
                            booking_id,
                        },
                        Err(error) => BookingAction::DeleteFailed {
                            request,
                            booking_id,
                            error,
                        },
                    })
                })]
            },

            BookingAction::Deleted { booking_id, .. } => {
                metrics::counter!("bookings.writes", "op" => "delete", "outcome" => "ok")
                    .increment(1);
                // A revoked capability already dropped the list
                if !state.capability.is_granted() {
                    return SmallVec::new();
                }
                state.writes.remove(&booking_id);
                state.bookings.retain(|row| row.id != booking_id);
                Self::recompute_statistics(state, env);
                SmallVec::new()
            },

            BookingAction::DeleteFailed {
                booking_id, error, ..
            } => {
                metrics::counter!("bookings.writes", "op" => "delete", "outcome" => "error")
                    .increment(1);
                tracing::warn!(%booking_id, error = %error, "Failed to delete booking");
                SmallVec::new()
            },

            BookingAction::Rejected { .. } => SmallVec::new(),

            // ========== Realtime ==========
            BookingAction::FeedConnected => {
                if !state.capability.is_granted() {
                    return SmallVec::new();
                }
                state.feed = FeedStatus::Connected;
                state.feed_sessions += 1;
                tracing::info!(session = state.feed_sessions, "Booking feed connected");

                // The grant already loaded; later sessions may have missed events
                if state.feed_sessions > 1 {
                    Self::reload_all(state, env)
                } else {
                    SmallVec::new()
                }
            },

            BookingAction::FeedLost { reason } => {
                tracing::warn!(%reason, "Booking feed lost");
                state.feed = FeedStatus::Disconnected;
                SmallVec::new()
            },

            BookingAction::ChangeReceived { event } => {
                metrics::counter!("bookings.realtime.events", "kind" => event.kind.label())
                    .increment(1);
                if !state.capability.is_granted() {
                    return SmallVec::new();
                }
                tracing::debug!(kind = %event.kind, booking_id = ?event.booking_id, "Booking change received");

                if event.kind == ChangeKind::Insert {
                    state.notifications.increment();
                }
                Self::reload_all(state, env)
            },

            // ========== Notifications ==========
            BookingAction::ClearNotifications { seen } => {
                if !state.notifications.acknowledge(seen) {
                    tracing::debug!(
                        seen,
                        count = state.notifications.count(),
                        "New bookings arrived since they were shown, keeping the counter"
                    );
                }
                SmallVec::new()
            },
        }
    }
}
