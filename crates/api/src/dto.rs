//! Request and response bodies.
//!
//! Money goes over the wire as integer cents in `*Cents` fields; only the
//! coupon quote adds decimal amounts.

use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{
    AddressId, Aggregate, Cart, Coupon, CustomerId, Discount, LineItem, Money, Order, OrderStatus,
    PaymentStatus, Product, ProductId, Quote, Shipment, ShipmentStatus,
};
use projections::{CouponSummary, OrderSummary};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::response::decimal;

// -- Request types --

fn one() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: String,
    #[serde(default = "one")]
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyCouponRequest {
    #[serde(default)]
    pub coupon_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponRequest {
    pub code: String,
    /// `PERCENTAGE` or `FIXED_AMOUNT`.
    pub discount_type: String,
    /// Whole percent, or cents for a fixed amount.
    pub discount_value: i64,
    #[serde(default)]
    pub min_order_value_cents: i64,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    #[serde(default = "one")]
    pub usage_limit: u32,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

impl CreateCouponRequest {
    pub fn discount(&self) -> Result<Discount, ApiError> {
        match self.discount_type.trim().to_ascii_uppercase().as_str() {
            "PERCENTAGE" => u32::try_from(self.discount_value)
                .map(|percent| Discount::Percentage { percent })
                .map_err(|_| ApiError::BadRequest("Discount value must not be negative".into())),
            "FIXED_AMOUNT" => Ok(Discount::FixedAmount {
                amount: Money::from_cents(self.discount_value),
            }),
            _ => Err(ApiError::BadRequest(
                "Discount type must be PERCENTAGE or FIXED_AMOUNT".into(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub address_id: Option<String>,
    pub coupon_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeclineRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipOrderRequest {
    #[serde(default)]
    pub carrier: String,
    #[serde(default)]
    pub tracking_number: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub sku: String,
    pub title: String,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: u32,
}

#[derive(Debug, Deserialize)]
pub struct RestockRequest {
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddressRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
}

// -- Response types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineResponse {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

impl From<&LineItem> for LineResponse {
    fn from(item: &LineItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price.cents(),
            line_total_cents: item.total_price().cents(),
        }
    }
}

fn lines(items: &[LineItem]) -> Vec<LineResponse> {
    items.iter().map(LineResponse::from).collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub customer_id: Option<CustomerId>,
    pub items: Vec<LineResponse>,
    pub total_cents: i64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        Self {
            customer_id: cart.customer_id(),
            items: lines(cart.items()),
            total_cents: cart.total().cents(),
            updated_at: cart.updated_at(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub original_total: f64,
    pub discount_amount: f64,
    pub final_total: f64,
    pub applied_coupon: String,
}

impl From<Quote> for QuoteResponse {
    fn from(quote: Quote) -> Self {
        Self {
            original_total: decimal(quote.original),
            discount_amount: decimal(quote.discount),
            final_total: decimal(quote.final_total),
            applied_coupon: quote.code,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponResponse {
    pub id: Option<AggregateId>,
    pub code: String,
    pub discount: Discount,
    pub min_order_value_cents: i64,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub usage_limit: u32,
    pub times_used: u32,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_granted_cents: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&Coupon> for CouponResponse {
    fn from(coupon: &Coupon) -> Self {
        Self {
            id: coupon.id(),
            code: coupon.code().to_string(),
            discount: coupon.discount(),
            min_order_value_cents: coupon.min_order_value().cents(),
            valid_from: coupon.valid_from(),
            valid_to: coupon.valid_to(),
            usage_limit: coupon.usage_limit(),
            times_used: coupon.times_used(),
            is_active: coupon.is_active(),
            discount_granted_cents: None,
            created_at: coupon.created_at(),
        }
    }
}

impl From<CouponSummary> for CouponResponse {
    fn from(coupon: CouponSummary) -> Self {
        Self {
            id: Some(coupon.coupon_id),
            code: coupon.code,
            discount: coupon.discount,
            min_order_value_cents: coupon.min_order_value.cents(),
            valid_from: coupon.valid_from,
            valid_to: coupon.valid_to,
            usage_limit: coupon.usage_limit,
            times_used: coupon.times_used,
            is_active: coupon.is_active,
            discount_granted_cents: Some(coupon.discount_granted.cents()),
            created_at: Some(coupon.created_at),
        }
    }
}

/// Full order, loaded from its stream.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Option<AggregateId>,
    pub customer_id: Option<CustomerId>,
    pub address_id: Option<AddressId>,
    pub items: Vec<LineResponse>,
    pub subtotal_cents: i64,
    pub coupon_code: Option<String>,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_provider: Option<String>,
    pub provider_payment_id: Option<String>,
    pub shipment_id: Option<AggregateId>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id(),
            customer_id: order.customer_id(),
            address_id: order.address_id(),
            items: lines(order.items()),
            subtotal_cents: order.subtotal().cents(),
            coupon_code: order.coupon_code().map(String::from),
            discount_cents: order.discount().cents(),
            total_cents: order.total().cents(),
            status: order.status(),
            payment_status: order.payment_status(),
            payment_provider: order.payment_provider().map(String::from),
            provider_payment_id: order.provider_payment_id().map(String::from),
            shipment_id: order.shipment_id(),
            carrier: order.carrier().map(String::from),
            tracking_number: order.tracking_number().map(String::from),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

/// Listing row, read from the order summaries view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListItem {
    pub id: AggregateId,
    pub customer_id: CustomerId,
    pub items: Vec<LineResponse>,
    pub item_count: u32,
    pub subtotal_cents: i64,
    pub coupon_code: Option<String>,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderSummary> for OrderListItem {
    fn from(order: OrderSummary) -> Self {
        Self {
            id: order.order_id,
            customer_id: order.customer_id,
            items: lines(&order.items),
            item_count: order.item_count,
            subtotal_cents: order.subtotal.cents(),
            coupon_code: order.coupon_code,
            discount_cents: order.discount.cents(),
            total_cents: order.total.cents(),
            status: order.status,
            payment_status: order.payment_status,
            carrier: order.carrier,
            tracking_number: order.tracking_number,
            created_at: order.placed_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentResponse {
    pub id: Option<AggregateId>,
    pub order_id: Option<AggregateId>,
    pub carrier: String,
    pub tracking_number: String,
    pub status: ShipmentStatus,
    pub shipped_at: Option<DateTime<Utc>>,
}

impl From<&Shipment> for ShipmentResponse {
    fn from(shipment: &Shipment) -> Self {
        Self {
            id: shipment.id(),
            order_id: shipment.order_id(),
            carrier: shipment.carrier().to_string(),
            tracking_number: shipment.tracking_number().to_string(),
            status: shipment.status(),
            shipped_at: shipment.shipped_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ShipOrderResponse {
    pub order: OrderResponse,
    pub shipment: ShipmentResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub sku: Option<ProductId>,
    pub title: String,
    pub price_cents: i64,
    pub stock: u32,
    pub is_active: bool,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            sku: product.sku().cloned(),
            title: product.title().to_string(),
            price_cents: product.price().cents(),
            stock: product.stock(),
            is_active: product.is_active(),
        }
    }
}
