//! Unit tests for `BookingReducer`.
//!
//! These tests cover:
//! - Capability gating (grant loads, revocation releases data)
//! - Load and statistics reconciliation, including stale generations
//! - Write-through updates and deletes (stamping, targeted replace, failures)
//! - Same-booking write races
//! - Realtime events (notification counting, reload triggers)

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code

use super::*;
use crate::backend::{BackendError, ChangeEvent, ChangeKind};
use crate::mocks::{self, MockBookingBackend, Operation};
use crate::types::{BookingId, BookingPatch, BookingStatus, Priority, UserId};
use chrono::{DateTime, Utc};
use kinxplore_core::environment::Clock;
use kinxplore_core::reducer::Reducer;
use kinxplore_testing::{FixedClock, ReducerTest, assertions, drive, test_clock};
use std::sync::Arc;

fn at(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text).unwrap().with_timezone(&Utc)
}

/// Three rows, newest first: pending today, confirmed this month, cancelled last month
fn seeded_backend() -> MockBookingBackend {
    MockBookingBackend::with_rows(vec![
        mocks::booking_created("b-3", BookingStatus::Pending, at("2025-06-18T09:00:00Z")),
        mocks::booking_created("b-2", BookingStatus::Confirmed, at("2025-06-10T12:00:00Z")),
        mocks::booking_created("b-1", BookingStatus::Cancelled, at("2025-05-20T08:00:00Z")),
    ])
}

fn env_with_clock(backend: &MockBookingBackend, clock: FixedClock) -> BookingEnvironment {
    BookingEnvironment::new(Arc::new(clock), Arc::new(backend.clone()))
        .with_actor(UserId::new("admin-1"))
}

fn env_with(backend: &MockBookingBackend) -> BookingEnvironment {
    env_with_clock(backend, test_clock())
}

fn granted() -> BookingState {
    BookingState {
        capability: AdminCapability::Granted,
        ..BookingState::default()
    }
}

async fn loaded(backend: &MockBookingBackend, env: &BookingEnvironment) -> BookingState {
    let mut state = BookingState::new();
    drive(
        &BookingReducer,
        &mut state,
        BookingAction::CapabilityChanged {
            capability: AdminCapability::Granted,
        },
        env,
    )
    .await;
    assert_eq!(state.bookings.len(), backend.rows().len());
    state
}

fn ids(state: &BookingState) -> Vec<&str> {
    state.bookings.iter().map(|b| b.id.as_str()).collect()
}

// ============================================================================
// Capability
// ============================================================================

#[tokio::test]
async fn test_grant_loads_list_and_statistics() {
    let backend = seeded_backend();
    let env = env_with(&backend);

    let state = loaded(&backend, &env).await;

    assert_eq!(ids(&state), vec!["b-3", "b-2", "b-1"]);
    assert_eq!(state.statistics.total, 3);
    assert_eq!(state.statistics.created_today, 1);
    assert_eq!(state.statistics.created_this_month, 2);
    assert!(!state.loading);
    assert!(!state.stats_loading);
    assert_eq!(backend.calls(Operation::List), 1);
    assert_eq!(backend.calls(Operation::Statistics), 1);
}

#[tokio::test]
async fn test_commands_without_capability_make_no_calls() {
    let backend = seeded_backend();
    let env = env_with(&backend);
    let mut state = BookingState::new();

    let produced = drive(
        &BookingReducer,
        &mut state,
        BookingAction::Update {
            request: RequestId::new(1),
            booking_id: BookingId::new("b-3"),
            patch: BookingPatch::status(BookingStatus::Confirmed),
        },
        &env,
    )
    .await;

    assert!(matches!(
        produced.as_slice(),
        [BookingAction::Rejected {
            request: Some(_),
            error: BackendError::CapabilityAbsent
        }]
    ));
    assert_eq!(backend.calls(Operation::Update), 0);

    drive(&BookingReducer, &mut state, BookingAction::Load { request: None }, &env).await;
    assert_eq!(backend.calls(Operation::List), 0);
    assert!(state.bookings.is_empty());
}

#[tokio::test]
async fn test_revocation_releases_data_and_drops_late_responses() {
    let backend = seeded_backend();
    let env = env_with(&backend);
    let mut state = loaded(&backend, &env).await;
    state.notifications.increment();
    let stale_generation = state.load_generation;

    let effects = BookingReducer.reduce(
        &mut state,
        BookingAction::CapabilityChanged {
            capability: AdminCapability::Absent,
        },
        &env,
    );
    assert!(effects.is_empty());
    assert!(state.bookings.is_empty());
    assert_eq!(state.statistics.total, 0);
    assert_eq!(state.notifications.count(), 0);

    // A load issued before revocation completes afterwards
    BookingReducer.reduce(
        &mut state,
        BookingAction::Loaded {
            request: None,
            generation: stale_generation,
            bookings: backend.rows(),
        },
        &env,
    );
    assert!(state.bookings.is_empty());
}

#[test]
fn test_repeated_grant_is_a_no_op() {
    let backend = seeded_backend();

    ReducerTest::new(BookingReducer)
        .with_env(env_with(&backend))
        .given_state(granted())
        .when_action(BookingAction::CapabilityChanged {
            capability: AdminCapability::Granted,
        })
        .then_state(|state| assert!(!state.loading))
        .then_effects(|effects| assertions::assert_no_effects(effects))
        .run();
}

// ============================================================================
// Loads
// ============================================================================

#[tokio::test]
async fn test_load_failure_keeps_previous_list() {
    let backend = seeded_backend();
    let env = env_with(&backend);
    let mut state = loaded(&backend, &env).await;
    backend.fail_next(Operation::List, BackendError::RequestFailed("connection reset".into()));

    let produced = drive(&BookingReducer, &mut state, BookingAction::Load { request: None }, &env).await;

    assert!(matches!(produced.as_slice(), [BookingAction::LoadFailed { .. }]));
    assert_eq!(ids(&state), vec!["b-3", "b-2", "b-1"]);
    assert_eq!(state.error.as_deref(), Some("Request failed: connection reset"));
    assert!(!state.loading);

    // The next successful load clears the error
    drive(&BookingReducer, &mut state, BookingAction::Load { request: None }, &env).await;
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_reload_is_idempotent() {
    let backend = seeded_backend();
    let env = env_with(&backend);
    let mut state = loaded(&backend, &env).await;
    let first = (state.bookings.clone(), state.statistics);

    drive(&BookingReducer, &mut state, BookingAction::Load { request: None }, &env).await;
    drive(&BookingReducer, &mut state, BookingAction::LoadStatistics { request: None }, &env).await;

    assert_eq!((state.bookings.clone(), state.statistics), first);
}

#[test]
fn test_only_newest_load_is_applied() {
    let backend = seeded_backend();
    let env = env_with(&backend);
    let mut state = granted();

    // Two loads in flight
    BookingReducer.reduce(&mut state, BookingAction::Load { request: None }, &env);
    let older = state.load_generation;
    BookingReducer.reduce(&mut state, BookingAction::Load { request: None }, &env);
    let newer = state.load_generation;

    BookingReducer.reduce(
        &mut state,
        BookingAction::Loaded {
            request: None,
            generation: newer,
            bookings: vec![mocks::booking("fresh", BookingStatus::Pending)],
        },
        &env,
    );
    BookingReducer.reduce(
        &mut state,
        BookingAction::Loaded {
            request: None,
            generation: older,
            bookings: vec![mocks::booking("old", BookingStatus::Pending)],
        },
        &env,
    );

    assert_eq!(ids(&state), vec!["fresh"]);
    assert!(!state.loading);
}

#[tokio::test]
async fn test_statistics_load_uses_light_rows() {
    let backend = seeded_backend();
    let env = env_with(&backend);
    let mut state = granted();

    drive(&BookingReducer, &mut state, BookingAction::LoadStatistics { request: None }, &env).await;

    // Only statistics were fetched; the list stays empty
    assert!(state.bookings.is_empty());
    assert_eq!(state.statistics.total, 3);
    assert_eq!(state.statistics.by_status.sum(), state.statistics.total);
    assert_eq!(state.statistics.total_revenue.cents(), 20_000);
}

// ============================================================================
// Updates
// ============================================================================

#[tokio::test]
async fn test_status_update_is_stamped_with_clock_and_actor() {
    let backend = seeded_backend();
    let clock = test_clock();
    let env = env_with_clock(&backend, clock.clone());
    let mut state = loaded(&backend, &env).await;

    let produced = drive(
        &BookingReducer,
        &mut state,
        BookingAction::Update {
            request: RequestId::new(7),
            booking_id: BookingId::new("b-3"),
            patch: BookingPatch::status(BookingStatus::Confirmed),
        },
        &env,
    )
    .await;

    let (id, patch) = backend.patches().pop().unwrap();
    assert_eq!(id.as_str(), "b-3");
    assert_eq!(patch.last_status_change_at, Some(clock.now()));
    assert_eq!(patch.last_status_change_by, Some(UserId::new("admin-1")));

    let [BookingAction::Updated { booking, request, .. }] = produced.as_slice() else {
        panic!("expected Updated, got {produced:?}");
    };
    assert_eq!(*request, RequestId::new(7));
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(state.booking(&id).unwrap().status, BookingStatus::Confirmed);
    assert_eq!(state.statistics.by_status.confirmed, 2);
    assert!(!state.has_pending_write(&id));
}

#[tokio::test]
async fn test_patch_without_status_is_not_stamped() {
    let backend = seeded_backend();
    let env = env_with(&backend);
    let mut state = loaded(&backend, &env).await;

    drive(
        &BookingReducer,
        &mut state,
        BookingAction::Update {
            request: RequestId::new(1),
            booking_id: BookingId::new("b-2"),
            patch: BookingPatch::default()
                .with_priority(Priority::Urgent)
                .with_notes("VIP"),
        },
        &env,
    )
    .await;

    let (_, patch) = backend.patches().pop().unwrap();
    assert!(patch.last_status_change_at.is_none());
    assert!(patch.last_status_change_by.is_none());
    let row = state.booking(&BookingId::new("b-2")).unwrap();
    assert_eq!(row.priority, Priority::Urgent);
    assert_eq!(row.admin_notes.as_deref(), Some("VIP"));
    assert_eq!(state.statistics.by_priority.urgent, 1);
}

#[tokio::test]
async fn test_update_replaces_only_the_target_row() {
    let backend = seeded_backend();
    let env = env_with(&backend);
    let mut state = loaded(&backend, &env).await;
    let before = state.bookings.clone();

    drive(
        &BookingReducer,
        &mut state,
        BookingAction::Update {
            request: RequestId::new(1),
            booking_id: BookingId::new("b-2"),
            patch: BookingPatch::status(BookingStatus::Completed),
        },
        &env,
    )
    .await;

    assert_eq!(ids(&state), vec!["b-3", "b-2", "b-1"]);
    for (old, new) in before.iter().zip(&state.bookings) {
        if old.id.as_str() == "b-2" {
            assert_eq!(new.status, BookingStatus::Completed);
        } else {
            assert_eq!(old, new);
        }
    }
}

#[tokio::test]
async fn test_update_failure_leaves_list_unchanged() {
    let backend = seeded_backend();
    let env = env_with(&backend);
    let mut state = loaded(&backend, &env).await;
    let before = state.bookings.clone();
    backend.fail_next(
        Operation::Update,
        BackendError::Api {
            status: 400,
            message: "invalid input value for enum".into(),
        },
    );

    let produced = drive(
        &BookingReducer,
        &mut state,
        BookingAction::Update {
            request: RequestId::new(3),
            booking_id: BookingId::new("b-3"),
            patch: BookingPatch::status(BookingStatus::Confirmed),
        },
        &env,
    )
    .await;

    assert!(matches!(
        produced.as_slice(),
        [BookingAction::UpdateFailed { error: BackendError::Api { status: 400, .. }, .. }]
    ));
    assert_eq!(state.bookings, before);
    assert!(state.error.is_none());
    assert!(!state.has_pending_write(&BookingId::new("b-3")));
}

#[test]
fn test_superseded_update_response_is_not_applied() {
    let backend = seeded_backend();
    let env = env_with(&backend);
    let id = BookingId::new("b-3");
    let mut state = granted();
    state.bookings = backend.rows();

    BookingReducer.reduce(
        &mut state,
        BookingAction::Update {
            request: RequestId::new(1),
            booking_id: id.clone(),
            patch: BookingPatch::status(BookingStatus::Confirmed),
        },
        &env,
    );
    let first = state.writes[&id].latest;
    BookingReducer.reduce(
        &mut state,
        BookingAction::Update {
            request: RequestId::new(2),
            booking_id: id.clone(),
            patch: BookingPatch::status(BookingStatus::Completed),
        },
        &env,
    );
    let second = state.writes[&id].latest;
    assert!(second > first);

    // The later write answers first
    let mut completed = mocks::booking_created("b-3", BookingStatus::Completed, at("2025-06-18T09:00:00Z"));
    completed.admin_notes = Some("second".into());
    BookingReducer.reduce(
        &mut state,
        BookingAction::Updated {
            request: RequestId::new(2),
            token: second,
            booking: completed,
        },
        &env,
    );
    let confirmed = mocks::booking_created("b-3", BookingStatus::Confirmed, at("2025-06-18T09:00:00Z"));
    BookingReducer.reduce(
        &mut state,
        BookingAction::Updated {
            request: RequestId::new(1),
            token: first,
            booking: confirmed,
        },
        &env,
    );

    let row = state.booking(&id).unwrap();
    assert_eq!(row.status, BookingStatus::Completed);
    assert_eq!(row.admin_notes.as_deref(), Some("second"));
}

/// Issue two writes to `b-3` and return their tokens
fn two_writes(state: &mut BookingState, env: &BookingEnvironment) -> (u64, u64) {
    let id = BookingId::new("b-3");
    let mut tokens = Vec::new();
    for (request, status) in [(1, BookingStatus::Confirmed), (2, BookingStatus::Completed)] {
        BookingReducer.reduce(
            state,
            BookingAction::Update {
                request: RequestId::new(request),
                booking_id: id.clone(),
                patch: BookingPatch::status(status),
            },
            env,
        );
        tokens.push(state.writes[&id].latest);
    }
    (tokens[0], tokens[1])
}

#[test]
fn test_failed_latest_write_applies_earlier_confirmation() {
    let backend = seeded_backend();
    let env = env_with(&backend);
    let id = BookingId::new("b-3");
    let mut state = granted();
    state.bookings = backend.rows();
    let (first, second) = two_writes(&mut state, &env);

    // The earlier write lands on the server and answers first
    let confirmed = mocks::booking_created("b-3", BookingStatus::Confirmed, at("2025-06-18T09:00:00Z"));
    BookingReducer.reduce(
        &mut state,
        BookingAction::Updated {
            request: RequestId::new(1),
            token: first,
            booking: confirmed,
        },
        &env,
    );
    assert_eq!(state.booking(&id).unwrap().status, BookingStatus::Pending);
    assert!(state.has_pending_write(&id));

    BookingReducer.reduce(
        &mut state,
        BookingAction::UpdateFailed {
            request: RequestId::new(2),
            token: second,
            booking_id: id.clone(),
            error: BackendError::RateLimited,
        },
        &env,
    );

    assert_eq!(state.booking(&id).unwrap().status, BookingStatus::Confirmed);
    assert_eq!(state.statistics.by_status.pending, 0);
    assert_eq!(state.statistics.by_status.confirmed, 2);
    assert!(!state.has_pending_write(&id));
}

#[test]
fn test_earlier_confirmation_after_failed_latest_write_is_applied() {
    let backend = seeded_backend();
    let env = env_with(&backend);
    let id = BookingId::new("b-3");
    let mut state = granted();
    state.bookings = backend.rows();
    let (first, second) = two_writes(&mut state, &env);

    BookingReducer.reduce(
        &mut state,
        BookingAction::UpdateFailed {
            request: RequestId::new(2),
            token: second,
            booking_id: id.clone(),
            error: BackendError::RateLimited,
        },
        &env,
    );
    assert_eq!(state.booking(&id).unwrap().status, BookingStatus::Pending);

    let confirmed = mocks::booking_created("b-3", BookingStatus::Confirmed, at("2025-06-18T09:00:00Z"));
    BookingReducer.reduce(
        &mut state,
        BookingAction::Updated {
            request: RequestId::new(1),
            token: first,
            booking: confirmed,
        },
        &env,
    );

    assert_eq!(state.booking(&id).unwrap().status, BookingStatus::Confirmed);
    assert!(!state.has_pending_write(&id));
}

// ============================================================================
// Deletes
// ============================================================================

#[tokio::test]
async fn test_delete_removes_row_and_recomputes_statistics() {
    let backend = seeded_backend();
    let env = env_with(&backend);
    let mut state = loaded(&backend, &env).await;

    let produced = drive(
        &BookingReducer,
        &mut state,
        BookingAction::Delete {
            request: RequestId::new(4),
            booking_id: BookingId::new("b-2"),
        },
        &env,
    )
    .await;

    assert!(matches!(produced.as_slice(), [BookingAction::Deleted { .. }]));
    assert_eq!(ids(&state), vec!["b-3", "b-1"]);
    assert_eq!(state.statistics.total, 2);
    assert_eq!(state.statistics.by_status.confirmed, 0);
}

#[tokio::test]
async fn test_delete_failure_keeps_row() {
    let backend = seeded_backend();
    let env = env_with(&backend);
    let mut state = loaded(&backend, &env).await;
    backend.fail_next(Operation::Delete, BackendError::Unauthorized("JWT expired".into()));

    let produced = drive(
        &BookingReducer,
        &mut state,
        BookingAction::Delete {
            request: RequestId::new(5),
            booking_id: BookingId::new("b-2"),
        },
        &env,
    )
    .await;

    assert!(matches!(
        produced.as_slice(),
        [BookingAction::DeleteFailed { error: BackendError::Unauthorized(_), .. }]
    ));
    assert_eq!(state.bookings.len(), 3);
}

// ============================================================================
// Realtime
// ============================================================================

#[tokio::test]
async fn test_insert_event_counts_and_reloads() {
    let backend = seeded_backend();
    let env = env_with(&backend);
    let mut state = loaded(&backend, &env).await;
    backend.upsert_row(mocks::booking_created("b-4", BookingStatus::Pending, at("2025-06-18T10:00:00Z")));

    drive(
        &BookingReducer,
        &mut state,
        BookingAction::ChangeReceived {
            event: ChangeEvent::insert("b-4"),
        },
        &env,
    )
    .await;

    assert_eq!(state.notifications.count(), 1);
    assert_eq!(ids(&state), vec!["b-4", "b-3", "b-2", "b-1"]);
    assert_eq!(state.statistics.total, 4);
    assert_eq!(backend.calls(Operation::List), 2);
    assert_eq!(backend.calls(Operation::Statistics), 2);
}

#[test]
fn test_update_and_unknown_events_reload_without_counting() {
    let backend = seeded_backend();

    for event in [
        ChangeEvent::update("b-2"),
        ChangeEvent {
            kind: ChangeKind::Other("TRUNCATE".into()),
            booking_id: None,
        },
        ChangeEvent {
            kind: ChangeKind::Other("malformed".into()),
            booking_id: None,
        },
        ChangeEvent {
            kind: ChangeKind::Delete,
            booking_id: None,
        },
    ] {
        ReducerTest::new(BookingReducer)
            .with_env(env_with(&backend))
            .given_state(granted())
            .when_action(BookingAction::ChangeReceived { event })
            .then_state(|state| {
                assert_eq!(state.notifications.count(), 0);
                assert!(state.loading);
                assert!(state.stats_loading);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 2);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }
}

#[test]
fn test_first_feed_session_does_not_reload() {
    let backend = seeded_backend();
    let env = env_with(&backend);
    let mut state = granted();

    let first = BookingReducer.reduce(&mut state, BookingAction::FeedConnected, &env);
    assert!(first.is_empty());
    assert_eq!(state.feed, FeedStatus::Connected);

    BookingReducer.reduce(
        &mut state,
        BookingAction::FeedLost {
            reason: "socket closed".into(),
        },
        &env,
    );
    assert_eq!(state.feed, FeedStatus::Disconnected);

    let second = BookingReducer.reduce(&mut state, BookingAction::FeedConnected, &env);
    assert_eq!(second.len(), 2);
}

#[test]
fn test_clear_notifications() {
    let backend = seeded_backend();
    let mut state = granted();
    state.notifications.increment();
    state.notifications.increment();

    ReducerTest::new(BookingReducer)
        .with_env(env_with(&backend))
        .given_state(state)
        .when_action(BookingAction::ClearNotifications { seen: 2 })
        .then_state(|state| assert_eq!(state.notifications.count(), 0))
        .then_effects(|effects| assertions::assert_no_effects(effects))
        .run();
}

#[test]
fn test_clear_notifications_keeps_inserts_the_board_never_showed() {
    let backend = seeded_backend();
    let mut state = granted();
    for _ in 0..3 {
        state.notifications.increment();
    }

    ReducerTest::new(BookingReducer)
        .with_env(env_with(&backend))
        .given_state(state)
        .when_action(BookingAction::ClearNotifications { seen: 2 })
        .then_state(|state| assert_eq!(state.notifications.count(), 3))
        .then_effects(|effects| assertions::assert_no_effects(effects))
        .run();
}
