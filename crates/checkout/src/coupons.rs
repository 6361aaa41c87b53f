//! Coupon administration and cart previews.

use chrono::Utc;
use domain::{
    Cart, CommandHandler, Coupon, CustomerId, NewCoupon, Quote, load_aggregate, normalize_code,
    validate_coupon,
};
use event_store::EventStore;

use crate::error::{CheckoutError, Result};
use crate::retry::RetryPolicy;

/// Creates coupons and prices carts with them.
pub struct CouponService<S: EventStore> {
    coupons: CommandHandler<S, Coupon>,
    retry: RetryPolicy,
}

impl<S: EventStore> CouponService<S> {
    pub fn new(store: S, retry: RetryPolicy) -> Self {
        Self {
            coupons: CommandHandler::new(store),
            retry,
        }
    }

    /// Prices the customer's cart with a coupon without redeeming it.
    ///
    /// Runs the same rules checkout runs, against the cart as it is now.
    #[tracing::instrument(skip(self))]
    pub async fn apply(&self, customer_id: CustomerId, code: &str) -> Result<Quote> {
        if code.trim().is_empty() {
            return Err(CheckoutError::Validation(
                "Coupon code is required.".to_string(),
            ));
        }

        let coupon = self.coupons.load(Coupon::id_for(code)).await?;
        let cart: Cart = load_aggregate(self.coupons.store(), Cart::id_for(customer_id)).await?;

        Ok(validate_coupon(&coupon, &cart, Utc::now())?)
    }

    /// Creates a coupon. Codes are unique after normalization.
    #[tracing::instrument(skip(self, coupon), fields(code = %coupon.code))]
    pub async fn create(&self, coupon: NewCoupon) -> Result<Coupon> {
        let coupon_id = Coupon::id_for(&coupon.code);
        let coupon = &coupon;

        let created = self
            .retry
            .run("create coupon", || async move {
                let result = self
                    .coupons
                    .execute(coupon_id, |c| c.create(coupon_id, coupon))
                    .await?;
                Ok::<_, CheckoutError>(result.aggregate)
            })
            .await?;

        tracing::info!(code = created.code(), "coupon created");
        Ok(created)
    }

    /// Looks up a coupon by code.
    pub async fn get(&self, code: &str) -> Result<Option<Coupon>> {
        if normalize_code(code).is_empty() {
            return Ok(None);
        }
        Ok(self.coupons.load_existing(Coupon::id_for(code)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domain::{Discount, Money};
    use event_store::InMemoryEventStore;

    fn new_coupon(code: &str) -> NewCoupon {
        let now = Utc::now();
        NewCoupon {
            code: code.to_string(),
            discount: Discount::Percentage { percent: 10 },
            min_order_value: Money::zero(),
            valid_from: now - Duration::days(1),
            valid_to: now + Duration::days(1),
            usage_limit: 5,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_code() {
        let service = CouponService::new(InMemoryEventStore::new(), RetryPolicy::default());
        service.create(new_coupon("save10")).await.unwrap();

        let err = service.create(new_coupon(" SAVE10 ")).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Conflict(_)));

        let coupon = service.get("Save10").await.unwrap().unwrap();
        assert_eq!(coupon.code(), "SAVE10");
    }

    #[tokio::test]
    async fn test_apply_without_cart_reports_empty_cart() {
        let service = CouponService::new(InMemoryEventStore::new(), RetryPolicy::default());
        service.create(new_coupon("SAVE10")).await.unwrap();

        let err = service.apply(CustomerId::new(), "save10").await.unwrap_err();
        assert_eq!(err.to_string(), "Your cart is empty.");
    }

    #[tokio::test]
    async fn test_apply_unknown_or_blank_code() {
        let service = CouponService::new(InMemoryEventStore::new(), RetryPolicy::default());

        assert!(matches!(
            service.apply(CustomerId::new(), "NOPE").await,
            Err(CheckoutError::NotFound(_))
        ));
        assert!(matches!(
            service.apply(CustomerId::new(), "  ").await,
            Err(CheckoutError::Validation(_))
        ));
        assert!(service.get(" ").await.unwrap().is_none());
    }
}
