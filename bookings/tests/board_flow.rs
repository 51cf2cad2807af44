//! End-to-end tests: booking store, bridge and board together.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

use chrono::{DateTime, Utc};
use kinxplore_bookings::mocks::{self, ManualChangeFeed, MockBookingBackend, Operation};
use kinxplore_bookings::prelude::*;
use kinxplore_bookings::{BackendError, ChangeEvent, DestinationSummary};
use kinxplore_testing::test_clock;
use std::time::Duration;
use tokio::sync::watch;

struct Harness {
    backend: MockBookingBackend,
    feed: ManualChangeFeed,
    store: BookingStore,
    board: BoardStore,
    _capability: watch::Sender<AdminCapability>,
    _guard: SubscriptionGuard,
}

impl Harness {
    async fn start(rows: Vec<Booking>) -> Self {
        let backend = MockBookingBackend::with_rows(rows);
        let feed = ManualChangeFeed::new();
        let env = BookingEnvironment::new(Arc::new(test_clock()), Arc::new(backend.clone()))
            .with_actor(UserId::new("admin-1"));
        let store = BookingStore::new(
            env,
            BookingStoreConfig {
                response_timeout: Duration::from_secs(2),
                resubscribe_delay: Duration::from_millis(20),
            },
        );
        let (capability, signal) = watch::channel(AdminCapability::Granted);
        let guard = store.attach(signal, Arc::new(feed.clone()));
        let board = board_for(&store);
        spawn_bridge(store.clone(), board.clone());
        feed.wait_for_subscriptions(1).await;

        let harness = Self {
            backend,
            feed,
            store,
            board,
            _capability: capability,
            _guard: guard,
        };
        let expected = harness.backend.rows().len();
        harness.view_where(|v| v.statistics.total == expected).await;
        harness
    }

    async fn view(&self) -> BoardView {
        self.board.state(BoardView::of).await
    }

    /// Wait for the board to show a state
    async fn view_where<F>(&self, predicate: F) -> BoardView
    where
        F: Fn(&BoardView) -> bool,
    {
        let mut revisions = self.board.subscribe_state();
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let _ = revisions.borrow_and_update();
                let view = self.view().await;
                if predicate(&view) {
                    return view;
                }
                revisions.changed().await.expect("board dropped");
            }
        })
        .await
        .expect("board never reached the expected state")
    }

    async fn send(&self, action: BoardAction) {
        self.board.send(action).await.unwrap();
    }
}

fn at(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text).unwrap().with_timezone(&Utc)
}

fn card_count(view: &BoardView) -> usize {
    view.columns.iter().map(|c| c.cards.len()).sum()
}

fn column_ids(view: &BoardView, column: BoardColumn) -> Vec<String> {
    view.columns
        .iter()
        .find(|c| c.column == column)
        .map(|c| c.cards.iter().map(|b| b.id.to_string()).collect())
        .unwrap_or_default()
}

fn guest(id: &str, status: BookingStatus, first_name: &str, destination: &str, created: &str) -> Booking {
    let mut booking = mocks::booking_created(id, status, at(created));
    booking.first_name = Some(first_name.to_string());
    booking.destination = Some(DestinationSummary {
        id: format!("d-{id}"),
        name: Some(destination.to_string()),
        image_url: None,
        location: None,
    });
    booking
}

fn three_rows() -> Vec<Booking> {
    vec![
        guest("b1", BookingStatus::Pending, "Alice", "Lisbon", "2025-06-18T09:00:00Z"),
        guest("b2", BookingStatus::Pending, "Bob", "Zanzibar", "2025-06-17T09:00:00Z"),
        guest("b3", BookingStatus::Confirmed, "Chidi", "Cape Town", "2025-06-16T09:00:00Z"),
    ]
}

#[tokio::test]
async fn test_board_partitions_store_list() {
    let harness = Harness::start(three_rows()).await;

    let view = harness.view().await;

    assert_eq!(column_ids(&view, BoardColumn::Pending), vec!["b1", "b2"]);
    assert_eq!(column_ids(&view, BoardColumn::Confirmed), vec!["b3"]);
    assert!(column_ids(&view, BoardColumn::Completed).is_empty());
    assert_eq!(view.columns[2].placeholder(), Some("No bookings"));
    assert_eq!(view.statistics.total, 3);
}

#[tokio::test]
async fn test_search_matches_destination_name() {
    let harness = Harness::start(three_rows()).await;

    harness
        .send(BoardAction::SetSearch {
            query: "LIS".to_string(),
        })
        .await;

    let view = harness.view().await;
    assert_eq!(column_ids(&view, BoardColumn::Pending), vec!["b1"]);
    assert!(column_ids(&view, BoardColumn::Confirmed).is_empty());

    harness
        .send(BoardAction::SetPriorityFilter {
            filter: PriorityFilter::Only(Priority::Urgent),
        })
        .await;
    assert_eq!(card_count(&harness.view().await), 0);
}

#[tokio::test]
async fn test_status_change_from_board_reaches_store_and_statistics() {
    let harness = Harness::start(three_rows()).await;
    harness
        .send(BoardAction::Open {
            booking_id: BookingId::new("b2"),
        })
        .await;

    harness
        .send(BoardAction::ChangeStatus {
            status: BookingStatus::Confirmed,
        })
        .await;

    let view = harness
        .view_where(|v| {
            column_ids(v, BoardColumn::Confirmed) == vec!["b2", "b3"]
                && v.detail.as_ref().is_some_and(|d| !d.busy)
        })
        .await;
    assert_eq!(view.statistics.by_status.pending, 1);
    assert_eq!(view.statistics.by_status.confirmed, 2);
    let detail = view.detail.unwrap();
    assert_eq!(detail.booking.status, BookingStatus::Confirmed);
    assert!(!detail.busy);

    let stamped = harness.backend.patches().pop().unwrap().1;
    assert_eq!(stamped.last_status_change_by, Some(UserId::new("admin-1")));
}

#[tokio::test]
async fn test_saving_draft_updates_store() {
    let harness = Harness::start(three_rows()).await;
    harness
        .send(BoardAction::Open {
            booking_id: BookingId::new("b3"),
        })
        .await;
    harness
        .send(BoardAction::EditPriority {
            priority: Priority::High,
        })
        .await;
    harness
        .send(BoardAction::EditNotes {
            notes: "Airport pickup".to_string(),
        })
        .await;
    assert_eq!(harness.backend.calls(Operation::Update), 0);

    harness.send(BoardAction::Save).await;

    harness
        .view_where(|v| v.statistics.by_priority.high == 1)
        .await;
    let row = harness
        .store
        .bookings()
        .await
        .into_iter()
        .find(|b| b.id.as_str() == "b3")
        .unwrap();
    assert_eq!(row.priority, Priority::High);
    assert_eq!(row.admin_notes.as_deref(), Some("Airport pickup"));
    assert!(row.last_status_change_at.is_none());
}

#[tokio::test]
async fn test_delete_from_board_closes_detail() {
    let harness = Harness::start(three_rows()).await;
    harness
        .send(BoardAction::Open {
            booking_id: BookingId::new("b1"),
        })
        .await;

    harness.send(BoardAction::Delete).await;

    let view = harness
        .view_where(|v| column_ids(v, BoardColumn::Pending) == vec!["b2"] && v.detail.is_none())
        .await;
    assert!(view.detail.is_none());
    assert_eq!(view.statistics.total, 2);
}

#[tokio::test]
async fn test_inserts_badge_and_opening_pending_clears_it() {
    let harness = Harness::start(three_rows()).await;

    for (id, created) in [("b4", "2025-06-18T10:00:00Z"), ("b5", "2025-06-18T10:05:00Z")] {
        harness
            .backend
            .upsert_row(guest(id, BookingStatus::Pending, "Dana", "Mombasa", created));
        harness.feed.emit(ChangeEvent::insert(id));
    }
    let view = harness
        .view_where(|v| v.notification_count == 2 && card_count(v) == 5)
        .await;
    assert_eq!(column_ids(&view, BoardColumn::Pending)[0], "b5");

    harness
        .send(BoardAction::Open {
            booking_id: BookingId::new("b5"),
        })
        .await;

    harness.view_where(|v| v.notification_count == 0).await;
    tokio::time::timeout(Duration::from_secs(5), async {
        while harness.store.notification_count().await != 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_booking_deleted_elsewhere_closes_detail() {
    let harness = Harness::start(three_rows()).await;
    harness
        .send(BoardAction::Open {
            booking_id: BookingId::new("b2"),
        })
        .await;

    harness.backend.remove_row(&BookingId::new("b2"));
    harness.feed.emit(ChangeEvent {
        kind: kinxplore_bookings::ChangeKind::Delete,
        booking_id: Some(BookingId::new("b2")),
    });

    let view = harness.view_where(|v| card_count(v) == 2).await;
    assert!(view.detail.is_none());
}

#[tokio::test]
async fn test_failed_reload_keeps_cards_and_flags_error() {
    let harness = Harness::start(three_rows()).await;
    harness
        .backend
        .fail_always(Operation::List, BackendError::RateLimited);

    harness.feed.emit(ChangeEvent::update("b2"));

    let view = harness
        .view_where(|v| v.store_error.is_some() && !v.loading)
        .await;
    assert_eq!(view.store_error.as_deref(), Some("Rate limited by backend"));
    assert_eq!(card_count(&view), 3);
    assert!(view.error.is_none());

    harness.backend.recover(Operation::List);
    harness.feed.emit(ChangeEvent::update("b2"));
    let view = harness.view_where(|v| v.store_error.is_none()).await;
    assert_eq!(card_count(&view), 3);
}
