//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use api::{AppState, Config};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use checkout::{InMemoryMailer, Notifier};
use event_store::InMemoryEventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

/// Who a request is sent as.
#[derive(Clone, Copy)]
enum Caller {
    Anonymous,
    Customer(Uuid),
    Admin,
}

struct TestApp {
    app: axum::Router,
    mailer: InMemoryMailer,
    notifier: Notifier,
}

fn setup() -> TestApp {
    let mailer = InMemoryMailer::new();
    let state = Arc::new(AppState::new(
        InMemoryEventStore::new(),
        &Config::default(),
        Arc::new(mailer.clone()),
    ));
    TestApp {
        notifier: state.notifier.clone(),
        app: api::create_app(state, get_metrics_handle()),
        mailer,
    }
}

impl TestApp {
    async fn send(
        &self,
        method: &str,
        uri: &str,
        caller: Caller,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        match caller {
            Caller::Anonymous => {}
            Caller::Customer(id) => {
                builder = builder
                    .header("x-user-id", id.to_string())
                    .header("x-user-email", format!("{id}@example.com"));
            }
            Caller::Admin => {
                builder = builder
                    .header("x-user-id", Uuid::new_v4().to_string())
                    .header("x-user-role", "admin");
            }
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn create_product(&self, sku: &str, price_cents: i64, stock: u32) {
        let (status, _) = self
            .send(
                "POST",
                "/products/admin/create",
                Caller::Admin,
                Some(json!({"sku": sku, "title": "Widget", "priceCents": price_cents, "stock": stock})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    async fn add_to_cart(&self, customer: Uuid, sku: &str, quantity: u32) -> Value {
        let (status, body) = self
            .send(
                "POST",
                "/cart/add",
                Caller::Customer(customer),
                Some(json!({"productId": sku, "quantity": quantity})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }

    async fn create_address(&self, customer: Uuid) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/addresses",
                Caller::Customer(customer),
                Some(json!({
                    "name": "Home",
                    "street": "1 Main St",
                    "city": "Springfield",
                    "postalCode": "12345"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Places an order for 2 x SKU-A at 10.00 and returns its id.
    async fn place_order(&self, customer: Uuid) -> String {
        self.add_to_cart(customer, "SKU-A", 2).await;
        let address_id = self.create_address(customer).await;
        let (status, body) = self
            .send(
                "POST",
                "/orders/checkout",
                Caller::Customer(customer),
                Some(json!({"addressId": address_id})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_health_check_has_no_envelope() {
    let app = setup();
    let (status, body) = app.send("GET", "/health", Caller::Anonymous, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let app = setup();
    let (status, body) = app.send("GET", "/cart", Caller::Anonymous, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["statusCode"], 401);
    assert!(body["data"].is_null());
    assert_eq!(body["message"], "Authentication required");
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let app = setup();
    let (status, body) = app
        .send(
            "GET",
            "/orders/admin/all",
            Caller::Customer(Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Admin access required");

    let (status, _) = app
        .send("GET", "/orders/admin/all", Caller::Anonymous, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cart_edits() {
    let app = setup();
    app.create_product("SKU-A", 1000, 10).await;
    let customer = Uuid::new_v4();

    // Quantity defaults to one
    let (status, body) = app
        .send(
            "POST",
            "/cart/add",
            Caller::Customer(customer),
            Some(json!({"productId": "SKU-A"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"][0]["quantity"], 1);
    assert_eq!(body["data"]["totalCents"], 1000);

    let (_, body) = app
        .send(
            "PUT",
            "/cart/update",
            Caller::Customer(customer),
            Some(json!({"productId": "SKU-A", "quantity": 3})),
        )
        .await;
    assert_eq!(body["data"]["totalCents"], 3000);

    let (status, body) = app
        .send("DELETE", "/cart/remove/SKU-A", Caller::Customer(customer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"], json!([]));
    assert_eq!(body["data"]["totalCents"], 0);
}

#[tokio::test]
async fn test_adding_unknown_or_excess_stock() {
    let app = setup();
    app.create_product("SKU-A", 1000, 1).await;
    let customer = Uuid::new_v4();

    let (status, body) = app
        .send(
            "POST",
            "/cart/add",
            Caller::Customer(customer),
            Some(json!({"productId": "NOPE"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");

    let (status, body) = app
        .send(
            "POST",
            "/cart/add",
            Caller::Customer(customer),
            Some(json!({"productId": "SKU-A", "quantity": 2})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Not enough stock available");
}

#[tokio::test]
async fn test_coupon_preview_uses_decimal_totals() {
    let app = setup();
    app.create_product("SKU-A", 1000, 10).await;

    let (status, body) = app
        .send(
            "POST",
            "/coupons/admin/create",
            Caller::Admin,
            Some(json!({
                "code": "five",
                "discountType": "FIXED_AMOUNT",
                "discountValue": 500,
                "minOrderValueCents": 1500,
                "validFrom": "2020-01-01T00:00:00Z",
                "validTo": "2099-01-01T00:00:00Z",
                "usageLimit": 5
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["code"], "FIVE");

    let customer = Uuid::new_v4();
    app.add_to_cart(customer, "SKU-A", 2).await;

    let (status, body) = app
        .send(
            "POST",
            "/coupons/apply",
            Caller::Customer(customer),
            Some(json!({"couponCode": "Five"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({
            "originalTotal": 20.0,
            "discountAmount": 5.0,
            "finalTotal": 15.0,
            "appliedCoupon": "FIVE"
        })
    );

    // Previewing does not consume a use
    let (_, body) = app
        .send("GET", "/coupons/admin/all", Caller::Admin, None)
        .await;
    assert_eq!(body["data"][0]["timesUsed"], 0);
}

#[tokio::test]
async fn test_duplicate_coupon_code_conflicts() {
    let app = setup();
    let coupon = json!({
        "code": "SAVE10",
        "discountType": "PERCENTAGE",
        "discountValue": 10,
        "validFrom": "2020-01-01T00:00:00Z",
        "validTo": "2099-01-01T00:00:00Z"
    });

    let (status, _) = app
        .send("POST", "/coupons/admin/create", Caller::Admin, Some(coupon.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .send("POST", "/coupons/admin/create", Caller::Admin, Some(coupon))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_order_lifecycle() {
    let app = setup();
    app.create_product("SKU-A", 1000, 10).await;
    let customer = Uuid::new_v4();
    let order_id = app.place_order(customer).await;

    // Placed order is pending and listed for its owner
    let (status, body) = app
        .send("GET", &format!("/orders/{order_id}"), Caller::Customer(customer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalCents"], 2000);
    assert_eq!(body["data"]["status"], "PENDING");
    assert_eq!(body["data"]["paymentStatus"], "PENDING");

    let (_, body) = app
        .send("GET", "/orders", Caller::Customer(customer), None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["id"], order_id.as_str());

    // Payment confirmation takes stock
    let (status, body) = app
        .send(
            "POST",
            &format!("/orders/payment/verify/{order_id}"),
            Caller::Customer(customer),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["orderId"], order_id.as_str());
    assert_eq!(body["data"]["status"], "SUCCESS");

    let (_, body) = app
        .send("GET", "/products/SKU-A", Caller::Anonymous, None)
        .await;
    assert_eq!(body["data"]["stock"], 8);

    // A second confirmation is rejected and takes nothing
    let (status, _) = app
        .send(
            "POST",
            &format!("/orders/payment/verify/{order_id}"),
            Caller::Customer(customer),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Shipping
    let (status, body) = app
        .send(
            "POST",
            &format!("/orders/admin/ship/{order_id}"),
            Caller::Admin,
            Some(json!({"carrier": "UPS", "trackingNumber": "1Z999"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["order"]["status"], "SHIPPED");
    assert_eq!(body["data"]["shipment"]["trackingNumber"], "1Z999");
    assert_eq!(body["data"]["shipment"]["status"], "SHIPPED");

    let (status, body) = app
        .send(
            "PATCH",
            &format!("/orders/admin/status/{order_id}"),
            Caller::Admin,
            Some(json!({"status": "delivered"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "DELIVERED");

    app.notifier.flush().await;
    let subjects: Vec<String> = app.mailer.sent().await.into_iter().map(|m| m.subject).collect();
    assert_eq!(
        subjects,
        vec![
            format!("Order Received - #{order_id}"),
            format!("Order Confirmed - #{order_id}"),
            format!("Your Order #{order_id} has Shipped!"),
        ]
    );

    let (_, body) = app
        .send("GET", "/orders/admin/all", Caller::Admin, None)
        .await;
    assert_eq!(body["data"][0]["status"], "DELIVERED");
    assert_eq!(body["data"][0]["trackingNumber"], "1Z999");
}

#[tokio::test]
async fn test_checkout_preconditions() {
    let app = setup();
    let customer = Uuid::new_v4();

    let (status, body) = app
        .send("POST", "/orders/checkout", Caller::Customer(customer), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Shipping address ID is required");

    let (status, body) = app
        .send(
            "POST",
            "/orders/checkout",
            Caller::Customer(customer),
            Some(json!({"addressId": Uuid::new_v4().to_string()})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Address not found for this user");

    let address_id = app.create_address(customer).await;
    let (status, body) = app
        .send(
            "POST",
            "/orders/checkout",
            Caller::Customer(customer),
            Some(json!({"addressId": address_id})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Your cart is empty");
}

#[tokio::test]
async fn test_orders_are_private() {
    let app = setup();
    app.create_product("SKU-A", 1000, 10).await;
    let order_id = app.place_order(Uuid::new_v4()).await;

    let stranger = Uuid::new_v4();
    let (status, body) = app
        .send("GET", &format!("/orders/{order_id}"), Caller::Customer(stranger), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Order not found");

    let (_, body) = app
        .send("GET", "/orders", Caller::Customer(stranger), None)
        .await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_shipping_pending_order_names_status() {
    let app = setup();
    app.create_product("SKU-A", 1000, 10).await;
    let order_id = app.place_order(Uuid::new_v4()).await;

    let (status, body) = app
        .send(
            "POST",
            &format!("/orders/admin/ship/{order_id}"),
            Caller::Admin,
            Some(json!({"carrier": "UPS", "trackingNumber": "1Z1"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("PENDING"));
}

#[tokio::test]
async fn test_decline_without_body() {
    let app = setup();
    app.create_product("SKU-A", 1000, 10).await;
    let customer = Uuid::new_v4();
    let order_id = app.place_order(customer).await;

    let (status, body) = app
        .send(
            "POST",
            &format!("/orders/payment/decline/{order_id}"),
            Caller::Customer(customer),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "FAILED");

    let (_, body) = app
        .send("GET", &format!("/orders/{order_id}"), Caller::Customer(customer), None)
        .await;
    assert_eq!(body["data"]["paymentStatus"], "FAILED");
    assert_eq!(body["data"]["status"], "PENDING");
}

#[tokio::test]
async fn test_invalid_status_update() {
    let app = setup();
    app.create_product("SKU-A", 1000, 10).await;
    let order_id = app.place_order(Uuid::new_v4()).await;

    for status_name in ["PENDING", "LOST"] {
        let (status, body) = app
            .send(
                "PATCH",
                &format!("/orders/admin/status/{order_id}"),
                Caller::Admin,
                Some(json!({"status": status_name})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid status update");
    }

    // Unpaid orders reach PROCESSING only through payment verification
    let (status, body) = app
        .send(
            "PATCH",
            &format!("/orders/admin/status/{order_id}"),
            Caller::Admin,
            Some(json!({"status": "PROCESSING"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("PENDING"));
}

#[tokio::test]
async fn test_invalid_order_id_format() {
    let app = setup();
    let (status, body) = app
        .send(
            "GET",
            "/orders/not-a-uuid",
            Caller::Customer(Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid order ID");
}

#[tokio::test]
async fn test_malformed_json_uses_envelope() {
    let app = setup();
    let (status, body) = app
        .send(
            "POST",
            "/cart/add",
            Caller::Customer(Uuid::new_v4()),
            Some(json!({"quantity": "lots"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statusCode"], 400);
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    app.create_product("SKU-A", 1000, 10).await;
    app.place_order(Uuid::new_v4()).await;

    let response = app
        .app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("checkout_total"));
}
