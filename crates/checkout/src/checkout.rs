//! Turning a cart into an order.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use common::AggregateId;
use domain::{
    Aggregate, AddressId, Cart, Coupon, CustomerId, Money, Order, Payment, PlaceOrder, Product,
    Quote, UnitOfWork, validate_coupon,
};
use event_store::EventStore;

use crate::error::{CheckoutError, Result};
use crate::notifications::Notifier;
use crate::retry::RetryPolicy;
use crate::services::AddressBook;

/// Provider tag recorded on every payment.
pub const PAYMENT_PROVIDER: &str = "SIMULATED_GATEWAY";

const OUT_OF_STOCK: &str =
    "One or more items in your cart are out of stock. Please review your cart.";

/// Places orders from carts.
///
/// A successful checkout commits the new order, its pending payment, the
/// coupon redemption and the emptied cart together. Any failure leaves all
/// four untouched.
pub struct CheckoutService<S: EventStore> {
    store: S,
    addresses: Arc<dyn AddressBook>,
    notifier: Notifier,
    retry: RetryPolicy,
}

impl<S: EventStore> CheckoutService<S> {
    pub fn new(
        store: S,
        addresses: Arc<dyn AddressBook>,
        notifier: Notifier,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            addresses,
            notifier,
            retry,
        }
    }

    /// Places an order for everything in the customer's cart.
    ///
    /// A blank coupon code counts as no coupon.
    #[tracing::instrument(skip(self))]
    pub async fn checkout(
        &self,
        customer_id: CustomerId,
        address_id: Option<AddressId>,
        coupon_code: Option<&str>,
    ) -> Result<Order> {
        metrics::counter!("checkout_total").increment(1);
        let started = Instant::now();

        let result = self.place(customer_id, address_id, coupon_code).await;

        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());

        match result {
            Ok((order_id, order)) => {
                tracing::info!(%order_id, total = %order.total(), "order placed");
                self.notifier.order_received(order_id, &order);
                Ok(order)
            }
            Err(e) => {
                metrics::counter!("checkout_failures_total").increment(1);
                tracing::info!(error = %e, "checkout rejected");
                Err(e)
            }
        }
    }

    async fn place(
        &self,
        customer_id: CustomerId,
        address_id: Option<AddressId>,
        coupon_code: Option<&str>,
    ) -> Result<(AggregateId, Order)> {
        let address_id = address_id.ok_or_else(|| {
            CheckoutError::Validation("Shipping address ID is required".to_string())
        })?;
        if self.addresses.find(customer_id, address_id).await?.is_none() {
            return Err(CheckoutError::NotFound(
                "Address not found for this user".to_string(),
            ));
        }

        let coupon_code = coupon_code.map(str::trim).filter(|code| !code.is_empty());
        let order_id = AggregateId::new();

        let order = self
            .retry
            .run("place order", || async move {
                self.try_place(order_id, customer_id, address_id, coupon_code)
                    .await
            })
            .await?;
        Ok((order_id, order))
    }

    async fn try_place(
        &self,
        order_id: AggregateId,
        customer_id: CustomerId,
        address_id: AddressId,
        coupon_code: Option<&str>,
    ) -> Result<Order> {
        let mut uow = UnitOfWork::begin(&self.store);

        let cart_id = Cart::id_for(customer_id);
        let mut cart: Cart = uow.load(cart_id).await?;
        if cart.is_empty() {
            return Err(CheckoutError::Validation("Your cart is empty".to_string()));
        }

        let quote = match coupon_code {
            Some(code) => Some(self.redeem(&mut uow, order_id, code, &cart).await?),
            None => None,
        };

        for item in cart.items() {
            let product: Product = uow.load(Product::id_for(&item.product_id)).await?;
            if !product.exists() || !product.has_stock(item.quantity) {
                tracing::debug!(product_id = %item.product_id, "line out of stock");
                return Err(CheckoutError::Validation(OUT_OF_STOCK.to_string()));
            }
        }

        let command = PlaceOrder {
            order_id,
            customer_id,
            address_id,
            items: cart.items().to_vec(),
            coupon_code: quote.as_ref().map(|q| q.code.clone()),
            discount: quote.as_ref().map_or(Money::zero(), |q| q.discount),
            payment_provider: PAYMENT_PROVIDER.to_string(),
        };
        let mut order: Order = uow.load(order_id).await?;
        uow.execute(order_id, &mut order, |o| o.place(&command))?;

        let amount = order.total();
        let payment_id = Payment::id_for(order_id);
        let mut payment: Payment = uow.load(payment_id).await?;
        uow.execute(payment_id, &mut payment, |p| {
            p.initiate(order_id, PAYMENT_PROVIDER, amount)
        })?;

        uow.execute(cart_id, &mut cart, |c| c.clear(Some(order_id)))?;

        uow.commit().await?;
        Ok(order)
    }

    /// Validates the coupon against the cart and stages one redemption.
    async fn redeem(
        &self,
        uow: &mut UnitOfWork<'_, S>,
        order_id: AggregateId,
        code: &str,
        cart: &Cart,
    ) -> Result<Quote> {
        let coupon_id = Coupon::id_for(code);
        let mut coupon: Coupon = uow.load(coupon_id).await?;
        let quote = validate_coupon(&coupon, cart, Utc::now())?;
        uow.execute(coupon_id, &mut coupon, |c| c.redeem(order_id, quote.discount))?;
        Ok(quote)
    }
}
