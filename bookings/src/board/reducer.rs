//! Reducer for the board.

use crate::board::{BoardAction, BoardEnvironment, BoardState, Detail, Draft, OpenDetail};
use crate::types::{BookingId, BookingPatch, BookingStatus};
use kinxplore_core::{effect::Effect, reducer::Reducer};
use smallvec::{SmallVec, smallvec};

type Effects = SmallVec<[Effect<BoardAction>; 4]>;

/// Board state machine: `Closed` ⇄ `Open`.
///
/// Status changes commit immediately; priority and notes stay a local draft
/// until `Save`. While a write is in flight further writes are ignored, and
/// a failure leaves the machine where it was so the user can retry.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoardReducer;

impl BoardReducer {
    /// Create a new board reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn open_mut(state: &mut BoardState) -> Option<&mut OpenDetail> {
        match &mut state.detail {
            Detail::Open(open) => Some(open),
            Detail::Closed => None,
        }
    }

    /// The open detail, if a write may start now
    fn ready_for_write(state: &mut BoardState) -> Option<&mut OpenDetail> {
        match Self::open_mut(state) {
            Some(open) if open.busy => {
                tracing::debug!(booking_id = %open.booking.id, "Write already in flight");
                None
            },
            other => other,
        }
    }

    fn update(env: &BoardEnvironment, booking_id: BookingId, patch: BookingPatch) -> Effects {
        let commands = env.commands();
        smallvec![Effect::future(async move {
            Some(match commands.update(booking_id.clone(), patch).await {
                Ok(booking) => BoardAction::UpdateSucceeded { booking },
                Err(error) => BoardAction::UpdateFailed {
                    booking_id,
                    message: error.to_string(),
                },
            })
        })]
    }
}

impl Reducer for BoardReducer {
    type State = BoardState;
    type Action = BoardAction;
    type Environment = BoardEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per action keeps the flow readable
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            BoardAction::StoreChanged {
                bookings,
                statistics,
                notification_count,
                loading,
                error,
            } => {
                state.bookings = bookings;
                state.statistics = statistics;
                state.notification_count = notification_count;
                state.loading = loading;
                state.store_error = error;

                let Some(id) = state.detail.selected().cloned() else {
                    return SmallVec::new();
                };
                match state.booking(&id).cloned() {
                    Some(booking) => {
                        if let Some(open) = Self::open_mut(state) {
                            // Keep unsaved edits; follow the row otherwise
                            if !open.is_dirty() {
                                open.draft = Draft::of(&booking);
                            }
                            open.booking = booking;
                        }
                    },
                    None => {
                        if matches!(&state.detail, Detail::Open(open) if !open.busy) {
                            tracing::debug!(booking_id = %id, "Selected booking disappeared");
                            state.detail = Detail::Closed;
                        }
                    },
                }
                SmallVec::new()
            },

            BoardAction::Open { booking_id } => {
                let Some(booking) = state.booking(&booking_id).cloned() else {
                    state.last_error = Some(format!("Booking {booking_id} is not on the board"));
                    return SmallVec::new();
                };

                let acknowledge =
                    booking.status == BookingStatus::Pending && state.notification_count > 0;
                state.detail = Detail::Open(OpenDetail {
                    draft: Draft::of(&booking),
                    booking,
                    busy: false,
                });

                if acknowledge {
                    let seen = std::mem::take(&mut state.notification_count);
                    let commands = env.commands();
                    smallvec![Effect::future(async move {
                        commands
                            .acknowledge_new_bookings(seen)
                            .await
                            .err()
                            .map(|error| BoardAction::AcknowledgeFailed {
                                message: error.to_string(),
                            })
                    })]
                } else {
                    SmallVec::new()
                }
            },

            BoardAction::Close => {
                state.detail = Detail::Closed;
                SmallVec::new()
            },

            BoardAction::SetSearch { query } => {
                state.filter.query = query;
                SmallVec::new()
            },

            BoardAction::SetPriorityFilter { filter } => {
                state.filter.priority = filter;
                SmallVec::new()
            },

            BoardAction::EditPriority { priority } => {
                if let Some(open) = Self::open_mut(state) {
                    open.draft.priority = priority;
                }
                SmallVec::new()
            },

            BoardAction::EditNotes { notes } => {
                if let Some(open) = Self::open_mut(state) {
                    open.draft.notes = notes;
                }
                SmallVec::new()
            },

            BoardAction::ChangeStatus { status } => {
                let Some(open) = Self::ready_for_write(state) else {
                    return SmallVec::new();
                };
                open.busy = true;
                let booking_id = open.booking.id.clone();
                Self::update(env, booking_id, BookingPatch::status(status))
            },

            BoardAction::Save => {
                let Some(open) = Self::ready_for_write(state) else {
                    return SmallVec::new();
                };
                let patch = open.draft.changes(&open.booking);
                if patch.is_empty() {
                    tracing::debug!(booking_id = %open.booking.id, "Nothing to save");
                    return SmallVec::new();
                }
                open.busy = true;
                let booking_id = open.booking.id.clone();
                Self::update(env, booking_id, patch)
            },

            BoardAction::Delete => {
                let Some(open) = Self::ready_for_write(state) else {
                    return SmallVec::new();
                };
                open.busy = true;
                let booking_id = open.booking.id.clone();
                let commands = env.commands();
                smallvec![Effect::future(async move {
                    Some(match commands.delete(booking_id.clone()).await {
                        Ok(()) => BoardAction::DeleteSucceeded { booking_id },
                        Err(error) => BoardAction::DeleteFailed {
                            booking_id,
                            message: error.to_string(),
                        },
                    })
                })]
            },

            BoardAction::UpdateSucceeded { booking } => {
                if let Some(open) = Self::open_mut(state) {
                    if open.booking.id == booking.id {
                        open.busy = false;
                        open.draft = Draft::of(&booking);
                        open.booking = booking;
                    }
                }
                state.last_error = None;
                SmallVec::new()
            },

            BoardAction::UpdateFailed {
                booking_id,
                message,
            } => {
                tracing::warn!(%booking_id, %message, "Booking update failed");
                if let Some(open) = Self::open_mut(state) {
                    if open.booking.id == booking_id {
                        open.busy = false;
                    }
                }
                state.last_error = Some(message);
                SmallVec::new()
            },

            BoardAction::DeleteSucceeded { booking_id } => {
                if state.detail.selected() == Some(&booking_id) {
                    state.detail = Detail::Closed;
                }
                state.last_error = None;
                SmallVec::new()
            },

            BoardAction::DeleteFailed {
                booking_id,
                message,
            } => {
                tracing::warn!(%booking_id, %message, "Booking delete failed");
                if let Some(open) = Self::open_mut(state) {
                    if open.booking.id == booking_id {
                        open.busy = false;
                    }
                }
                state.last_error = Some(message);
                SmallVec::new()
            },

            BoardAction::AcknowledgeFailed { message } => {
                tracing::warn!(%message, "Failed to clear new-booking notifications");
                state.last_error = Some(message);
                SmallVec::new()
            },

            BoardAction::DismissError => {
                state.last_error = None;
                SmallVec::new()
            },
        }
    }
}
