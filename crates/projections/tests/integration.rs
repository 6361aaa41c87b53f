//! Integration tests: checkout services → ProjectionProcessor → views.

use std::sync::Arc;

use chrono::{Duration, Utc};
use checkout::{
    AddressBook, CartService, CatalogService, CheckoutService, CouponService, InMemoryAddressBook,
    InMemoryMailer, InMemoryUserDirectory, NewAddress, Notifier, OrderService,
    PaymentConfirmationService, RetryPolicy, ShipmentRegistrar,
};
use common::AggregateId;
use domain::{
    Aggregate, AddressId, CustomerId, Discount, Money, NewCoupon, OrderStatus, PaymentStatus,
    ProductId,
};
use event_store::InMemoryEventStore;
use projections::{CouponsView, OrderSummariesView, ProjectionProcessor};

type Store = InMemoryEventStore;

struct Harness {
    addresses: InMemoryAddressBook,
    carts: CartService<Store>,
    coupons: CouponService<Store>,
    checkout: CheckoutService<Store>,
    confirmations: PaymentConfirmationService<Store>,
    shipments: ShipmentRegistrar<Store>,
    orders: OrderService<Store>,
    processor: ProjectionProcessor<Store>,
    summaries: OrderSummariesView,
    coupon_view: CouponsView,
}

async fn setup() -> Harness {
    let store = InMemoryEventStore::new();
    let retry = RetryPolicy::default();
    let addresses = InMemoryAddressBook::new();
    let notifier = Notifier::new(
        Arc::new(InMemoryUserDirectory::new()),
        Arc::new(InMemoryMailer::new()),
        "store@example.com",
    );

    let catalog = CatalogService::new(store.clone(), retry);
    for (sku, cents) in [("A", 1000), ("B", 2500)] {
        catalog
            .list_product(&ProductId::new(sku), "Item", Money::from_cents(cents), 50)
            .await
            .unwrap();
    }

    let summaries = OrderSummariesView::new();
    let coupon_view = CouponsView::new();
    let mut processor = ProjectionProcessor::new(store.clone());
    processor.register(Box::new(summaries.clone()));
    processor.register(Box::new(coupon_view.clone()));

    Harness {
        carts: CartService::new(store.clone(), retry),
        coupons: CouponService::new(store.clone(), retry),
        checkout: CheckoutService::new(
            store.clone(),
            Arc::new(addresses.clone()),
            notifier.clone(),
            retry,
        ),
        confirmations: PaymentConfirmationService::new(store.clone(), notifier.clone(), retry),
        shipments: ShipmentRegistrar::new(store.clone(), notifier, retry),
        orders: OrderService::new(store, retry),
        addresses,
        processor,
        summaries,
        coupon_view,
    }
}

impl Harness {
    async fn customer(&self) -> (CustomerId, AddressId) {
        let customer = CustomerId::new();
        let address = self
            .addresses
            .add(
                customer,
                NewAddress {
                    name: "Home".into(),
                    street: "1 Main St".into(),
                    city: "Springfield".into(),
                    postal_code: "12345".into(),
                },
            )
            .await
            .unwrap();
        (customer, address.id)
    }

    async fn order(
        &self,
        customer: CustomerId,
        address: AddressId,
        sku: &str,
        coupon: Option<&str>,
    ) -> AggregateId {
        self.carts
            .add_item(customer, &ProductId::new(sku), 2)
            .await
            .unwrap();
        let order = self
            .checkout
            .checkout(customer, Some(address), coupon)
            .await
            .unwrap();
        order.id().unwrap()
    }
}

#[tokio::test]
async fn test_order_lifecycle_reaches_summary() {
    let h = setup().await;
    let (customer, address) = h.customer().await;
    let order_id = h.order(customer, address, "A", None).await;

    h.processor.run_catch_up().await.unwrap();
    let summary = h.summaries.get(order_id).await.unwrap();
    assert_eq!(summary.status, OrderStatus::Pending);
    assert_eq!(summary.total.cents(), 2000);
    assert_eq!(summary.item_count, 2);

    h.confirmations.confirm(order_id).await.unwrap();
    h.shipments
        .create_shipment(order_id, "UPS", "1Z1")
        .await
        .unwrap();
    h.orders.update_status(order_id, "DELIVERED").await.unwrap();

    h.processor.run_catch_up().await.unwrap();
    let summary = h.summaries.get(order_id).await.unwrap();
    assert_eq!(summary.status, OrderStatus::Delivered);
    assert_eq!(summary.payment_status, PaymentStatus::Completed);
    assert_eq!(summary.tracking_number.as_deref(), Some("1Z1"));
}

#[tokio::test]
async fn test_customer_listing_only_shows_own_orders() {
    let h = setup().await;
    let (alice, alice_address) = h.customer().await;
    let (bob, bob_address) = h.customer().await;

    let first = h.order(alice, alice_address, "A", None).await;
    let second = h.order(alice, alice_address, "B", None).await;
    h.order(bob, bob_address, "A", None).await;

    h.processor.run_catch_up().await.unwrap();

    let mine: Vec<_> = h
        .summaries
        .for_customer(alice)
        .await
        .into_iter()
        .map(|o| o.order_id)
        .collect();
    assert_eq!(mine.len(), 2);
    assert!(mine.contains(&first));
    assert!(mine.contains(&second));
    assert_eq!(h.summaries.all().await.len(), 3);
}

#[tokio::test]
async fn test_coupon_usage_is_projected() {
    let h = setup().await;
    let now = Utc::now();
    h.coupons
        .create(NewCoupon {
            code: "five".into(),
            discount: Discount::FixedAmount {
                amount: Money::from_cents(500),
            },
            min_order_value: Money::from_cents(1500),
            valid_from: now - Duration::days(1),
            valid_to: now + Duration::days(1),
            usage_limit: 10,
            is_active: true,
        })
        .await
        .unwrap();

    let (customer, address) = h.customer().await;
    let order_id = h.order(customer, address, "A", Some("FIVE")).await;

    h.processor.run_catch_up().await.unwrap();

    let coupon = h.coupon_view.get_by_code("FIVE").await.unwrap();
    assert_eq!(coupon.times_used, 1);
    assert_eq!(coupon.discount_granted.cents(), 500);

    let summary = h.summaries.get(order_id).await.unwrap();
    assert_eq!(summary.coupon_code.as_deref(), Some("FIVE"));
    assert_eq!(summary.total.cents(), 1500);
}

#[tokio::test]
async fn test_rebuild_reproduces_views() {
    let h = setup().await;
    let (customer, address) = h.customer().await;
    let order_id = h.order(customer, address, "A", None).await;
    h.confirmations.confirm(order_id).await.unwrap();

    h.processor.run_catch_up().await.unwrap();
    h.processor.rebuild_all().await.unwrap();

    let summary = h.summaries.get(order_id).await.unwrap();
    assert_eq!(summary.status, OrderStatus::Processing);
    assert_eq!(h.summaries.all().await.len(), 1);
}
