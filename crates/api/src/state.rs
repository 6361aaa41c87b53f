//! Shared application state.

use std::sync::Arc;

use checkout::{
    AddressBook, CartService, CatalogService, CheckoutService, CouponService,
    InMemoryAddressBook, InMemoryUserDirectory, LogMailer, Mailer, Notifier, OrderService,
    PaymentConfirmationService, RetryPolicy, ShipmentRegistrar,
};
use event_store::EventStore;
use projections::{CouponsView, OrderSummariesView, Projection, ProjectionProcessor};

use crate::config::Config;

/// Services and read models shared by every handler.
pub struct AppState<S: EventStore> {
    pub carts: CartService<S>,
    pub catalog: CatalogService<S>,
    pub coupons: CouponService<S>,
    pub checkout: CheckoutService<S>,
    pub confirmations: PaymentConfirmationService<S>,
    pub shipments: ShipmentRegistrar<S>,
    pub orders: OrderService<S>,
    pub addresses: Arc<dyn AddressBook>,
    pub directory: InMemoryUserDirectory,
    pub notifier: Notifier,
    pub order_summaries: OrderSummariesView,
    pub coupon_summaries: CouponsView,
    pub projection_processor: ProjectionProcessor<S>,
}

impl<S: EventStore + Clone + 'static> AppState<S> {
    /// Wires every service over `event_store`, sending mail through `mailer`.
    pub fn new(event_store: S, config: &Config, mailer: Arc<dyn Mailer>) -> Self {
        let retry = RetryPolicy::new(config.tx_max_attempts);
        let directory = InMemoryUserDirectory::new();
        let addresses: Arc<dyn AddressBook> = Arc::new(InMemoryAddressBook::new());
        let notifier = Notifier::new(
            Arc::new(directory.clone()),
            mailer,
            config.mail_from.clone(),
        );

        let order_summaries = OrderSummariesView::new();
        let coupon_summaries = CouponsView::new();
        let mut projection_processor = ProjectionProcessor::new(event_store.clone());
        projection_processor.register(Box::new(order_summaries.clone()) as Box<dyn Projection>);
        projection_processor.register(Box::new(coupon_summaries.clone()) as Box<dyn Projection>);

        Self {
            carts: CartService::new(event_store.clone(), retry),
            catalog: CatalogService::new(event_store.clone(), retry),
            coupons: CouponService::new(event_store.clone(), retry),
            checkout: CheckoutService::new(
                event_store.clone(),
                addresses.clone(),
                notifier.clone(),
                retry,
            ),
            confirmations: PaymentConfirmationService::new(
                event_store.clone(),
                notifier.clone(),
                retry,
            ),
            shipments: ShipmentRegistrar::new(event_store.clone(), notifier.clone(), retry),
            orders: OrderService::new(event_store, retry),
            addresses,
            directory,
            notifier,
            order_summaries,
            coupon_summaries,
            projection_processor,
        }
    }

    /// State with default configuration and log-only mail delivery.
    pub fn with_defaults(event_store: S) -> Self {
        Self::new(event_store, &Config::default(), Arc::new(LogMailer))
    }
}
