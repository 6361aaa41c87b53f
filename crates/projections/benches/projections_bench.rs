use common::AggregateId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{AddressId, CustomerId, DomainEvent, LineItem, Money, OrderEvent, PlaceOrder};
use event_store::{AppendOptions, EventEnvelope, EventStore, InMemoryEventStore, Version};
use projections::{OrderSummariesView, ProjectionProcessor};

fn make_envelope(aggregate_id: AggregateId, version: i64, event: &OrderEvent) -> EventEnvelope {
    EventEnvelope::builder()
        .aggregate_id(aggregate_id)
        .aggregate_type("Order")
        .event_type(event.event_type())
        .version(Version::new(version))
        .payload(event)
        .unwrap()
        .build()
        .unwrap()
}

/// Populates a store with `n` orders of three events each.
async fn populate_store(store: &InMemoryEventStore, n: usize) {
    for _ in 0..n {
        let order_id = AggregateId::new();
        let placed = OrderEvent::placed(&PlaceOrder {
            order_id,
            customer_id: CustomerId::new(),
            address_id: AddressId::new(),
            items: vec![LineItem::new("SKU-001", 2, Money::from_cents(1000))],
            coupon_code: None,
            discount: Money::zero(),
            payment_provider: "SIMULATED_GATEWAY".to_string(),
        });
        let paid = OrderEvent::payment_completed("sim_1");
        let shipped = OrderEvent::shipped(AggregateId::new(), "UPS", "1Z1");

        let events = vec![
            make_envelope(order_id, 1, &placed),
            make_envelope(order_id, 2, &paid),
            make_envelope(order_id, 3, &shipped),
        ];
        store
            .append(events, AppendOptions::expect_new())
            .await
            .unwrap();
    }
}

fn bench_catch_up(c: &mut Criterion, orders: usize) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    rt.block_on(populate_store(&store, orders));

    c.bench_function(&format!("projections/catch_up_{}_events", orders * 3), |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut processor = ProjectionProcessor::new(store.clone());
                processor.register(Box::new(OrderSummariesView::new()));
                processor.run_catch_up().await.unwrap();
            });
        });
    });
}

fn bench_catch_up_100_orders(c: &mut Criterion) {
    bench_catch_up(c, 100);
}

fn bench_catch_up_1000_orders(c: &mut Criterion) {
    bench_catch_up(c, 1000);
}

fn bench_customer_listing(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    rt.block_on(populate_store(&store, 1000));

    let view = OrderSummariesView::new();
    let mut processor = ProjectionProcessor::new(store);
    processor.register(Box::new(view.clone()));
    rt.block_on(processor.run_catch_up()).unwrap();

    c.bench_function("projections/all_orders_sorted_1000", |b| {
        b.iter(|| rt.block_on(view.all()));
    });
}

criterion_group!(
    benches,
    bench_catch_up_100_orders,
    bench_catch_up_1000_orders,
    bench_customer_listing
);
criterion_main!(benches);
