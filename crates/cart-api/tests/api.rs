use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use cart_api::{create_router, AppConfig, AppState};
use cart_core::{
    CartResult, CartStore, CheckoutSession, Currency, FixedPriceResolver, GatewayError,
    InMemoryCartStore, PaymentGateway, Price, SessionRequest,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Gateway double that records requests and can be told to fail.
#[derive(Default)]
struct StubGateway {
    fail: bool,
    requests: Mutex<Vec<SessionRequest>>,
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_session(&self, request: &SessionRequest) -> CartResult<CheckoutSession> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(GatewayError::Rejected {
                status: 402,
                message: "card declined".to_string(),
            }
            .into());
        }
        Ok(CheckoutSession::new(
            "cs_test_1",
            "stub",
            "https://pay.example.com/cs_test_1",
            request.amount,
        ))
    }

    fn is_configured(&self) -> bool {
        true
    }

    fn provider_name(&self) -> &'static str {
        "stub"
    }
}

struct Harness {
    server: TestServer,
    store: Arc<InMemoryCartStore>,
    gateway: Arc<StubGateway>,
}

fn harness_with(config: AppConfig, gateway: StubGateway) -> Harness {
    let store = Arc::new(InMemoryCartStore::new());
    let gateway = Arc::new(gateway);
    let prices = Arc::new(FixedPriceResolver::new(Price::new(10.0, Currency::USD)));

    let state = AppState::from_parts(config, store.clone(), gateway.clone(), prices).unwrap();
    let server = TestServer::new(create_router(state)).unwrap();

    Harness {
        server,
        store,
        gateway,
    }
}

fn harness() -> Harness {
    harness_with(AppConfig::default(), StubGateway::default())
}

async fn add(h: &Harness, item_id: &str, quantity: i64) -> axum_test::TestResponse {
    h.server
        .post("/cart/add")
        .json(&json!({ "item_id": item_id, "quantity": quantity }))
        .await
}

#[tokio::test]
async fn add_to_cart_returns_message() {
    let h = harness();

    let response = add(&h, "item1", 2).await;
    response.assert_status_ok();
    response.assert_json(&json!({ "message": "Item added to cart" }));

    let fields = h.store.fields("cart:item1").await.unwrap();
    assert_eq!(fields.get("quantity").map(String::as_str), Some("2"));
}

#[tokio::test]
async fn add_to_cart_accumulates() {
    let h = harness();

    add(&h, "item1", 2).await.assert_status_ok();
    add(&h, "item1", 3).await.assert_status_ok();

    let fields = h.store.fields("cart:item1").await.unwrap();
    assert_eq!(fields.get("quantity").map(String::as_str), Some("5"));
}

#[tokio::test]
async fn add_to_cart_rejects_zero_quantity() {
    let h = harness();

    let response = add(&h, "item1", 0).await;
    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["code"], "invalid_quantity");
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn add_to_cart_rejects_missing_fields() {
    let h = harness();

    let response = h
        .server
        .post("/cart/add")
        .json(&json!({ "item_id": "item1" }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn add_to_cart_store_down_is_500() {
    let h = harness();
    h.store.set_offline(true);

    let response = add(&h, "item1", 1).await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let body = response.json::<Value>();
    assert_eq!(body["code"], "store_unavailable");
    assert!(!body["detail"].as_str().unwrap().contains("refused"));
}

#[tokio::test]
async fn status_reports_store_outage_with_200() {
    let h = harness();

    let body = h.server.get("/status").await.json::<Value>();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["redis_connected"], true);
    assert_eq!(body["stripe_configured"], true);

    h.store.set_offline(true);
    let response = h.server.get("/status").await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["redis_connected"], false);

    let timestamp = body["timestamp"].as_str().unwrap();
    assert!(chrono::NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.6f").is_ok());
    assert!(!timestamp.ends_with('Z'));
}

#[tokio::test]
async fn checkout_charges_total_and_clears_cart() {
    let h = harness();
    add(&h, "item1", 2).await.assert_status_ok();
    add(&h, "item2", 3).await.assert_status_ok();

    let response = h.server.post("/cart/checkout").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "checkout_url": "https://pay.example.com/cs_test_1" }));

    let requests = h.gateway.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].amount.amount, 5000);
    assert_eq!(requests[0].amount.currency, Currency::USD);
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn checkout_empty_cart_is_400() {
    let h = harness();

    let response = h.server.post("/cart/checkout").await;
    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["code"], "empty_cart");
    assert!(h.gateway.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn checkout_empty_cart_allowed_by_config() {
    let config = AppConfig {
        allow_empty_cart: true,
        ..AppConfig::default()
    };
    let h = harness_with(config, StubGateway::default());

    h.server.post("/cart/checkout").await.assert_status_ok();

    let requests = h.gateway.requests.lock().unwrap().clone();
    assert_eq!(requests[0].amount.amount, 0);
}

#[tokio::test]
async fn checkout_gateway_failure_keeps_cart() {
    let h = harness_with(
        AppConfig::default(),
        StubGateway {
            fail: true,
            ..StubGateway::default()
        },
    );
    add(&h, "item1", 2).await.assert_status_ok();

    let response = h.server.post("/cart/checkout").await;
    response.assert_status_bad_request();

    let body = response.json::<Value>();
    assert_eq!(body["code"], "gateway_unavailable");
    assert!(!body["detail"].as_str().unwrap().contains("declined"));

    let fields = h.store.fields("cart:item1").await.unwrap();
    assert_eq!(fields.get("quantity").map(String::as_str), Some("2"));
}

#[tokio::test]
async fn checkout_malformed_entry_is_400() {
    let h = harness();
    h.store.put_field("cart:item1", "quantity", "lots").await;

    let response = h.server.post("/cart/checkout").await;
    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["code"], "malformed_cart_entry");
}

#[tokio::test]
async fn metrics_expose_counters() {
    let h = harness_with(
        AppConfig::default(),
        StubGateway {
            fail: true,
            ..StubGateway::default()
        },
    );
    add(&h, "item1", 1).await.assert_status_ok();
    h.server.post("/cart/checkout").await.assert_status_bad_request();

    let response = h.server.get("/metrics").await;
    response.assert_status_ok();

    let body = response.text();
    assert!(body.contains("store_failures_total 0"));
    assert!(body.contains("gateway_failures_total 1"));
    assert!(body.contains("store_latency_seconds"));
    assert!(body.contains("gateway_latency_seconds"));
    assert!(body.contains(r#"http_requests_total{method="POST",path="/cart/add",status="200"} 1"#));
    assert!(!body.contains(r#"path="/metrics""#));
}
