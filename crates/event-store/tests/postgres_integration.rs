//! PostgreSQL integration tests
//!
//! These tests share one PostgreSQL container and truncate its tables
//! between cases, so they run serially.
//!
//! ```bash
//! cargo test -p event-store --test postgres_integration
//! ```

use std::sync::Arc;

use event_store::{
    AggregateId, AppendOptions, EventEnvelope, EventStore, EventStoreError, EventStoreExt,
    PostgresEventStore, Snapshot, StreamAppend, Version,
};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresEventStore::new(pool.clone())
                .run_migrations()
                .await
                .unwrap();
            pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

async fn get_test_store() -> PostgresEventStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE events, snapshots")
        .execute(&pool)
        .await
        .unwrap();

    PostgresEventStore::new(pool)
}

fn create_test_event(
    aggregate_id: AggregateId,
    aggregate_type: &str,
    version: Version,
    event_type: &str,
) -> EventEnvelope {
    EventEnvelope::builder()
        .aggregate_id(aggregate_id)
        .aggregate_type(aggregate_type)
        .event_type(event_type)
        .version(version)
        .payload_raw(serde_json::json!({"test": true}))
        .build()
        .unwrap()
}

async fn log_len(store: &PostgresEventStore) -> usize {
    use futures_util::StreamExt;

    store.stream_all_events().await.unwrap().count().await
}

fn single(
    aggregate_id: AggregateId,
    aggregate_type: &str,
    expected: Version,
    event_type: &str,
) -> StreamAppend {
    StreamAppend {
        aggregate_id,
        expected_version: expected,
        events: vec![create_test_event(
            aggregate_id,
            aggregate_type,
            expected.next(),
            event_type,
        )],
    }
}

#[tokio::test]
#[serial]
async fn append_and_retrieve_events() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    let events = vec![
        create_test_event(aggregate_id, "Cart", Version::new(1), "CartItemAdded"),
        create_test_event(aggregate_id, "Cart", Version::new(2), "CartItemAdded"),
    ];
    let version = store
        .append(events, AppendOptions::expect_new())
        .await
        .unwrap();
    assert_eq!(version, Version::new(2));

    let stored = store.get_events_for_aggregate(aggregate_id).await.unwrap();
    let versions: Vec<_> = stored.iter().map(|e| e.version).collect();
    assert_eq!(versions, vec![Version::new(1), Version::new(2)]);
}

#[tokio::test]
#[serial]
async fn append_with_stale_version_conflicts() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    store
        .append(
            vec![create_test_event(aggregate_id, "Cart", Version::first(), "CartItemAdded")],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

    let result = store
        .append(
            vec![create_test_event(aggregate_id, "Cart", Version::new(2), "CartCleared")],
            AppendOptions::expect_version(Version::initial()),
        )
        .await;

    assert!(matches!(
        result,
        Err(EventStoreError::ConcurrencyConflict { .. })
    ));
}

#[tokio::test]
#[serial]
async fn commit_writes_all_streams_in_one_transaction() {
    let store = get_test_store().await;
    let order = AggregateId::new();
    let cart = AggregateId::new();

    store
        .append(
            vec![create_test_event(cart, "Cart", Version::first(), "CartItemAdded")],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

    let versions = store
        .commit(vec![
            single(order, "Order", Version::initial(), "OrderPlaced"),
            single(cart, "Cart", Version::first(), "CartCleared"),
        ])
        .await
        .unwrap();

    assert_eq!(versions, vec![Version::first(), Version::new(2)]);
    assert!(store.aggregate_exists(order).await.unwrap());
}

#[tokio::test]
#[serial]
async fn failed_commit_leaves_no_trace() {
    let store = get_test_store().await;
    let order = AggregateId::new();
    let coupon = AggregateId::new();

    store
        .append(
            vec![create_test_event(coupon, "Coupon", Version::first(), "CouponCreated")],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

    let result = store
        .commit(vec![
            single(order, "Order", Version::initial(), "OrderPlaced"),
            single(coupon, "Coupon", Version::initial(), "CouponRedeemed"),
        ])
        .await;

    assert!(matches!(
        result,
        Err(EventStoreError::ConcurrencyConflict { .. })
    ));
    assert!(!store.aggregate_exists(order).await.unwrap());
    assert_eq!(
        store.get_aggregate_version(coupon).await.unwrap(),
        Some(Version::first())
    );
}

#[tokio::test]
#[serial]
async fn racing_commits_on_one_stream_admit_one_winner() {
    let store = get_test_store().await;
    let coupon = AggregateId::new();

    let mut handles = Vec::new();
    for _ in 0..5 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .commit(vec![
                    single(AggregateId::new(), "Order", Version::initial(), "OrderPlaced"),
                    single(coupon, "Coupon", Version::initial(), "CouponRedeemed"),
                ])
                .await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(e) => assert!(e.is_conflict(), "unexpected error: {e}"),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(
        store.get_aggregate_version(coupon).await.unwrap(),
        Some(Version::first())
    );
}

#[tokio::test]
#[serial]
async fn get_events_from_version() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    let events = (1..=3)
        .map(|v| create_test_event(aggregate_id, "Product", Version::new(v), "StockAdjusted"))
        .collect();
    store.append(events, AppendOptions::new()).await.unwrap();

    let from_v2 = store
        .get_events_for_aggregate_from_version(aggregate_id, Version::new(2))
        .await
        .unwrap();

    let versions: Vec<_> = from_v2.iter().map(|e| e.version).collect();
    assert_eq!(versions, vec![Version::new(2), Version::new(3)]);
}

#[tokio::test]
#[serial]
async fn stream_all_events_follows_commit_order() {
    use futures_util::StreamExt;

    let store = get_test_store().await;
    let later_uuid_first = AggregateId::new();
    let other = AggregateId::new();

    store
        .commit(vec![single(later_uuid_first, "Cart", Version::initial(), "CartItemAdded")])
        .await
        .unwrap();
    store
        .commit(vec![single(other, "Order", Version::initial(), "OrderPlaced")])
        .await
        .unwrap();

    let stream = store.stream_all_events().await.unwrap();
    let events: Vec<_> = stream.collect().await;
    let types: Vec<_> = events
        .into_iter()
        .map(|e| e.unwrap().event_type)
        .collect();
    assert_eq!(types, vec!["CartItemAdded", "OrderPlaced"]);
}

#[tokio::test]
#[serial]
async fn writers_wait_for_an_open_write_transaction() {
    use std::time::Duration;

    let store = get_test_store().await;

    // An earlier writer that has drawn its sequence but not yet committed
    let mut open = store.pool().begin().await.unwrap();
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(PostgresEventStore::LOG_WRITE_LOCK)
        .execute(&mut *open)
        .await
        .unwrap();

    let later = tokio::spawn({
        let store = store.clone();
        async move {
            store
                .commit(vec![single(AggregateId::new(), "Order", Version::initial(), "OrderPlaced")])
                .await
        }
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!later.is_finished());
    assert_eq!(log_len(&store).await, 0);

    open.commit().await.unwrap();
    later.await.unwrap().unwrap();
    assert_eq!(log_len(&store).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn global_log_only_grows_at_the_tail_under_concurrent_commits() {
    use futures_util::StreamExt;

    let store = get_test_store().await;

    let writers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move {
                for _ in 0..10 {
                    let a = AggregateId::new();
                    let b = AggregateId::new();
                    store
                        .commit(vec![
                            single(a, "Order", Version::initial(), "OrderPlaced"),
                            single(b, "Payment", Version::initial(), "PaymentInitiated"),
                        ])
                        .await
                        .unwrap();
                }
            })
        })
        .collect();

    // Every read must extend the previous one; an event never appears
    // ahead of one that was already read
    let mut seen: Vec<EventEnvelope> = Vec::new();
    while writers.iter().any(|w| !w.is_finished()) {
        let current: Vec<_> = store
            .stream_all_events()
            .await
            .unwrap()
            .map(|e| e.unwrap())
            .collect()
            .await;
        assert!(current.len() >= seen.len());
        for (before, now) in seen.iter().zip(&current) {
            assert_eq!(before.event_id, now.event_id);
        }
        seen = current;
    }

    for writer in writers {
        writer.await.unwrap();
    }
    assert_eq!(log_len(&store).await, 80);
}

#[tokio::test]
#[serial]
async fn snapshot_update_replaces_existing() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    for (version, stock) in [(5, 10), (10, 3)] {
        let snapshot = Snapshot::from_state(
            aggregate_id,
            "Product",
            Version::new(version),
            &serde_json::json!({"stock": stock}),
        )
        .unwrap();
        store.save_snapshot(snapshot).await.unwrap();
    }

    let retrieved = store.get_snapshot(aggregate_id).await.unwrap().unwrap();
    assert_eq!(retrieved.version, Version::new(10));
    assert_eq!(retrieved.state, serde_json::json!({"stock": 3}));
}

#[tokio::test]
#[serial]
async fn snapshot_not_found() {
    let store = get_test_store().await;
    assert!(store.get_snapshot(AggregateId::new()).await.unwrap().is_none());
}
