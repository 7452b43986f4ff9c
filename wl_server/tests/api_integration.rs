//! Integration tests for the HTTP API over the in-memory ledger.
//!
//! Covers routing, request/response shapes, and error status mapping.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt; // For `oneshot` method
use wallet_ledger::ledger::{Fault, FaultPoint};
use wallet_ledger::{LedgerStore, MemoryLedgerStore};
use wl_server::api::{AppState, create_router, request_id::REQUEST_ID_HEADER};

/// Helper to create a router over a store holding wallets `a` (100.00) and `b` (50.00)
async fn create_test_server() -> (axum::Router, Arc<MemoryLedgerStore>) {
    let store = Arc::new(MemoryLedgerStore::new());
    store.create_wallet("a", dec!(100.00)).await.unwrap();
    store.create_wallet("b", dec!(50.00)).await.unwrap();
    (router_over(Arc::clone(&store)), store)
}

fn router_over(store: Arc<MemoryLedgerStore>) -> axum::Router {
    create_router(AppState::new(store, Duration::from_millis(200)))
}

fn send_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/send")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn decimal(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_endpoint() {
    let (app, _) = create_test_server().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_health_check_reports_unavailable_store() {
    let store = Arc::new(MemoryLedgerStore::new().with_fault(Fault::Fail(FaultPoint::Begin)));
    let app = router_over(store);

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["status"], "unhealthy");
}

#[tokio::test]
async fn test_every_response_has_request_id() {
    let (app, _) = create_test_server().await;

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));

    let request = Request::builder()
        .uri("/api/wallet/missing/balance")
        .header(REQUEST_ID_HEADER, "trace-42")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers().get(REQUEST_ID_HEADER).unwrap(), "trace-42");
}

// ============================================================================
// Transfer Tests
// ============================================================================

#[tokio::test]
async fn test_send_moves_funds_and_returns_receipt() {
    let (app, store) = create_test_server().await;

    let response = app
        .oneshot(send_request(json!({
            "sender_address": "a",
            "receiver_address": "b",
            "amount": "30.00"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    assert_eq!(body["message"], "Transaction completed");
    let receipt = &body["transaction"];
    assert_eq!(receipt["sender_address"], "a");
    assert_eq!(receipt["receiver_address"], "b");
    assert_eq!(decimal(&receipt["amount"]), dec!(30.00));
    assert_eq!(decimal(&receipt["sender_balance"]), dec!(70.00));
    assert_eq!(decimal(&receipt["receiver_balance"]), dec!(80.00));

    assert_eq!(store.balance_of("a").await.unwrap(), Some(dec!(70.00)));
    assert_eq!(store.balance_of("b").await.unwrap(), Some(dec!(80.00)));
}

#[tokio::test]
async fn test_send_accepts_numeric_amount() {
    let (app, store) = create_test_server().await;

    let response = app
        .oneshot(send_request(json!({
            "sender_address": "b",
            "receiver_address": "a",
            "amount": 12.5
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(store.balance_of("b").await.unwrap(), Some(dec!(37.50)));
}

#[tokio::test]
async fn test_send_rejections_are_bad_requests() {
    let (app, store) = create_test_server().await;

    let cases = [
        json!({"sender_address": "a", "receiver_address": "b", "amount": "0"}),
        json!({"sender_address": "a", "receiver_address": "b", "amount": "-5"}),
        json!({"sender_address": "a", "receiver_address": "b", "amount": "1.001"}),
        json!({"sender_address": "a", "receiver_address": "b", "amount": "100.01"}),
        json!({"sender_address": "a", "receiver_address": "ghost", "amount": "1"}),
        json!({"sender_address": "ghost", "receiver_address": "b", "amount": "1"}),
        json!({"sender_address": "", "receiver_address": "b", "amount": "1"}),
    ];

    for case in cases {
        let response = app.clone().oneshot(send_request(case.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "case {case}");
        let body = json_body(response).await;
        assert!(body["error"].is_string(), "case {case}");
    }

    assert_eq!(store.balance_of("a").await.unwrap(), Some(dec!(100.00)));
    assert_eq!(store.balance_of("b").await.unwrap(), Some(dec!(50.00)));
    assert!(store.recent_transactions(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_send_malformed_json_is_bad_request() {
    let (app, _) = create_test_server().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/send")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(send_request(json!({"sender_address": "a"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
}

#[tokio::test]
async fn test_send_storage_failure_is_internal_error() {
    let (_, store) = create_test_server().await;
    let app = router_over(Arc::new(
        store.without_fault().with_fault(Fault::Fail(FaultPoint::Commit)),
    ));

    let response = app
        .oneshot(send_request(json!({
            "sender_address": "a",
            "receiver_address": "b",
            "amount": "10"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["error"], "Internal server error");

    assert_eq!(store.balance_of("a").await.unwrap(), Some(dec!(100.00)));
}

#[tokio::test]
async fn test_send_timeout_is_service_unavailable() {
    let (_, store) = create_test_server().await;
    let app = router_over(Arc::new(
        store.without_fault().with_fault(Fault::Stall(FaultPoint::Record)),
    ));

    let response = app
        .oneshot(send_request(json!({
            "sender_address": "a",
            "receiver_address": "b",
            "amount": "10"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    assert_eq!(store.balance_of("a").await.unwrap(), Some(dec!(100.00)));
    assert_eq!(store.balance_of("b").await.unwrap(), Some(dec!(50.00)));
}

#[tokio::test]
async fn test_send_slow_commit_acknowledgement_is_created() {
    let (_, store) = create_test_server().await;
    let app = router_over(Arc::new(store.without_fault().with_fault(Fault::DelayAfter(
        FaultPoint::Commit,
        Duration::from_millis(400),
    ))));

    let response = app
        .oneshot(send_request(json!({
            "sender_address": "a",
            "receiver_address": "b",
            "amount": "30"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    assert_eq!(store.balance_of("a").await.unwrap(), Some(dec!(70.00)));
    assert_eq!(store.balance_of("b").await.unwrap(), Some(dec!(80.00)));
}

// ============================================================================
// Query Tests
// ============================================================================

#[tokio::test]
async fn test_balance_endpoint() {
    let (app, _) = create_test_server().await;

    let response = app.clone().oneshot(get("/api/wallet/a/balance")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["address"], "a");
    assert_eq!(decimal(&body["balance"]), dec!(100.00));

    let response = app.oneshot(get("/api/wallet/nobody/balance")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_transactions_newest_first_and_bounded() {
    let (app, _) = create_test_server().await;

    for amount in ["1.00", "2.00", "3.00"] {
        let response = app
            .clone()
            .oneshot(send_request(json!({
                "sender_address": "a",
                "receiver_address": "b",
                "amount": amount
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(get("/api/transactions?count=2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(decimal(&records[0]["amount"]), dec!(3.00));
    assert_eq!(decimal(&records[1]["amount"]), dec!(2.00));

    let response = app.oneshot(get("/api/transactions?count=0")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(json_body(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_transactions_count_validation() {
    let (app, _) = create_test_server().await;

    for uri in [
        "/api/transactions",
        "/api/transactions?count=abc",
        "/api/transactions?count=-1",
        "/api/transactions?count=",
    ] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri {uri}");
    }
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (app, _) = create_test_server().await;

    let response = app.oneshot(get("/api/nothing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
