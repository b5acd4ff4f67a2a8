// File: tests/ledger_api_tests.rs
//
// End-to-end tests of the HTTP ledger API over the in-memory store.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use moneymind_tests::test_helpers::{session_cookie, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

async fn send(app: &TestApp, method: Method, uri: &str, user: Option<Uuid>, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        request = request.header(header::COOKIE, session_cookie(user));
    }

    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        Value::Number(n) => n.to_string().parse().unwrap(),
        other => panic!("not a decimal: {}", other),
    }
}

async fn create_account(app: &TestApp, user: Uuid, name: &str, balance: &str, is_default: bool) -> Value {
    let (status, body) = send(app, Method::POST, "/accounts", Some(user), Some(json!({
        "accountName": name,
        "accountType": "broker",
        "currency": "USD",
        "initialBalance": balance,
        "isDefault": is_default,
    }))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["account"].clone()
}

async fn open_order(app: &TestApp, user: Uuid, account_id: &str, symbol: &str, side: &str, qty: &str, price: &str) -> Value {
    let (status, body) = send(app, Method::POST, "/orders", Some(user), Some(json!({
        "accountId": account_id,
        "symbol": symbol,
        "type": "stocks",
        "side": side,
        "quantity": qty,
        "entryPrice": price,
    }))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["order"].clone()
}

#[tokio::test]
async fn test_health_needs_no_session() {
    let app = TestApp::new();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "status": "ok"}));
}

#[tokio::test]
async fn test_requests_without_identity_are_rejected() {
    let app = TestApp::new();

    for (method, uri) in [
        (Method::GET, "/accounts"),
        (Method::GET, "/orders"),
        (Method::GET, "/orders/history"),
        (Method::DELETE, "/accounts/6f1c1b3e-3f4e-4c7a-9d55-0c2f3b7a9e10"),
    ] {
        let (status, body) = send(&app, method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["code"], json!("unauthorized"));
    }

    let request = Request::builder()
        .uri("/accounts")
        .header(header::COOKIE, "session=not-a-user-id")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_account_lifecycle() {
    let app = TestApp::new();
    let user = Uuid::new_v4();

    let main = create_account(&app, user, "Main", "1000", true).await;
    assert_eq!(main["account_name"], json!("Main"));
    assert_eq!(main["account_type"], json!("broker"));
    assert_eq!(main["currency"], json!("USD"));
    assert_eq!(main["is_default"], json!(true));
    assert_eq!(decimal(&main["balance"]), dec!(1000));

    // snake_case bodies are accepted too
    let (status, body) = send(&app, Method::POST, "/accounts", Some(user), Some(json!({
        "account_name": "Savings",
        "account_type": "bank",
        "currency": "eur",
        "initial_balance": -5,
    }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    let savings = body["account"].clone();
    assert_eq!(savings["currency"], json!("EUR"));
    assert_eq!(decimal(&savings["balance"]), dec!(0));
    assert_eq!(savings["is_default"], json!(false));

    let (status, body) = send(&app, Method::GET, "/accounts", Some(user), None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["accounts"].as_array().unwrap().iter()
        .map(|a| a["account_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Main", "Savings"]);

    // Switch the default
    let uri = format!("/accounts/{}/default", savings["id"].as_str().unwrap());
    let (status, body) = send(&app, Method::PATCH, &uri, Some(user), None).await;
    assert_eq!(status, StatusCode::OK);
    let defaults: Vec<&str> = body["accounts"].as_array().unwrap().iter()
        .filter(|a| a["is_default"] == json!(true))
        .map(|a| a["account_name"].as_str().unwrap())
        .collect();
    assert_eq!(defaults, vec!["Savings"]);

    // Balance override
    let uri = format!("/accounts/{}/balance", main["id"].as_str().unwrap());
    let (status, body) = send(&app, Method::PATCH, &uri, Some(user), Some(json!({"balance": "2500.50"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["account"]["balance"]), dec!(2500.5));
    assert_eq!(decimal(&body["account"]["initial_balance"]), dec!(1000));

    let (status, body) = send(&app, Method::PATCH, &uri, Some(user), Some(json!({"balance": -1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("invalid_argument"));

    // Delete
    let uri = format!("/accounts/{}", main["id"].as_str().unwrap());
    let (status, body) = send(&app, Method::DELETE, &uri, Some(user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "message": "Account deleted"}));

    let (status, body) = send(&app, Method::DELETE, &uri, Some(user), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("account_not_found"));
}

#[tokio::test]
async fn test_invalid_requests_are_client_errors() {
    let app = TestApp::new();
    let user = Uuid::new_v4();

    let (status, body) = send(&app, Method::POST, "/accounts", Some(user), Some(json!({
        "accountName": "Yen",
        "accountType": "broker",
        "currency": "JPY",
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));

    // Missing required field
    let (status, body) = send(&app, Method::POST, "/accounts", Some(user), Some(json!({"currency": "USD"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("bad_request"));

    // Malformed JSON
    let request = Request::builder()
        .method(Method::POST)
        .uri("/accounts")
        .header(header::COOKIE, session_cookie(user))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Bad path id
    let (status, _) = send(&app, Method::POST, "/orders/nope/close", Some(user), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Bad account filter; an empty one means no filter
    let (status, _) = send(&app, Method::GET, "/orders?accountId=nope", Some(user), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = send(&app, Method::GET, "/orders?accountId=", Some(user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["orders"], json!([]));

    let account = create_account(&app, user, "Main", "100", false).await;
    let account_id = account["id"].as_str().unwrap();
    let (status, body) = send(&app, Method::POST, "/orders", Some(user), Some(json!({
        "accountId": account_id,
        "symbol": "AAPL",
        "side": "buy",
        "quantity": 0,
        "entryPrice": 10,
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("invalid_argument"));
}

#[tokio::test]
async fn test_open_and_close_positions() {
    let app = TestApp::new();
    let user = Uuid::new_v4();
    app.quotes.set("AAPL", dec!(55));
    app.quotes.set("MSFT", dec!(180));

    let account = create_account(&app, user, "Main", "1000", true).await;
    let account_id = account["id"].as_str().unwrap();

    let buy = open_order(&app, user, account_id, "AAPL", "buy", "10", "50").await;
    assert_eq!(buy["status"], json!("open"));
    assert_eq!(buy["side"], json!("buy"));
    assert_eq!(buy["currency"], json!("USD"));
    assert_eq!(buy["name"], json!("AAPL"));

    // Opening leaves the balance alone
    let (_, body) = send(&app, Method::GET, "/accounts", Some(user), None).await;
    assert_eq!(decimal(&body["accounts"][0]["balance"]), dec!(1000));

    let uri = format!("/orders/{}/close", buy["id"].as_str().unwrap());
    let (status, body) = send(&app, Method::POST, &uri, Some(user), None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["order"]["status"], json!("closed"));
    assert_eq!(decimal(&body["order"]["close_price"]), dec!(55));
    assert_eq!(decimal(&body["order"]["profit_loss"]), dec!(50));
    assert_eq!(decimal(&body["account"]["balance"]), dec!(1050));

    // Closing twice is rejected without touching the balance
    let (status, body) = send(&app, Method::POST, &uri, Some(user), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("invalid_state"));

    let sell = open_order(&app, user, account_id, "MSFT", "sell", "4", "200").await;
    let uri = format!("/orders/{}/close", sell["id"].as_str().unwrap());
    let (status, body) = send(&app, Method::POST, &uri, Some(user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["order"]["profit_loss"]), dec!(80));
    assert_eq!(decimal(&body["account"]["balance"]), dec!(1080));

    let (_, body) = send(&app, Method::GET, "/orders", Some(user), None).await;
    assert_eq!(body["orders"], json!([]));

    let (status, body) = send(&app, Method::GET, &format!("/orders/history?accountId={}", account_id), Some(user), None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["orders"].as_array().unwrap().iter()
        .map(|o| o["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![sell["id"].as_str().unwrap(), buy["id"].as_str().unwrap()]);
}

#[tokio::test]
async fn test_quote_outage_is_bad_gateway() {
    let app = TestApp::new();
    let user = Uuid::new_v4();

    let account = create_account(&app, user, "Main", "1000", false).await;
    let account_id = account["id"].as_str().unwrap();
    let order = open_order(&app, user, account_id, "TSLA", "buy", "2", "250").await;

    let uri = format!("/orders/{}/close", order["id"].as_str().unwrap());
    let (status, body) = send(&app, Method::POST, &uri, Some(user), None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], json!("upstream_unavailable"));

    let (_, body) = send(&app, Method::GET, "/orders", Some(user), None).await;
    assert_eq!(body["orders"][0]["status"], json!("open"));

    let (_, body) = send(&app, Method::GET, "/accounts", Some(user), None).await;
    assert_eq!(decimal(&body["accounts"][0]["balance"]), dec!(1000));

    // Recovery
    app.quotes.set("TSLA", dec!(260));
    let (status, body) = send(&app, Method::POST, &uri, Some(user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["account"]["balance"]), dec!(1020));

    app.quotes.remove("TSLA");
}

#[tokio::test]
async fn test_out_of_range_amounts_are_bad_requests() {
    let app = TestApp::new();
    let user = Uuid::new_v4();
    app.quotes.set("AAPL", dec!(3000000000000000));

    let account = create_account(&app, user, "Main", "1000", false).await;
    let account_id = account["id"].as_str().unwrap();

    let (status, body) = send(&app, Method::POST, "/orders", Some(user), Some(json!({
        "accountId": account_id,
        "symbol": "AAPL",
        "side": "buy",
        "quantity": "100000000000000000000",
        "entryPrice": "50",
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("invalid_argument"));

    // Both legs fit, their product overflows
    let order = open_order(&app, user, account_id, "AAPL", "buy", "1000000000000000", "1000000000000000").await;
    let uri = format!("/orders/{}/close", order["id"].as_str().unwrap());
    let (status, body) = send(&app, Method::POST, &uri, Some(user), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("invalid_argument"));

    let (_, body) = send(&app, Method::GET, "/orders", Some(user), None).await;
    assert_eq!(body["orders"][0]["status"], json!("open"));

    let (_, body) = send(&app, Method::GET, "/accounts", Some(user), None).await;
    assert_eq!(decimal(&body["accounts"][0]["balance"]), dec!(1000));
}

#[tokio::test]
async fn test_other_users_resources_are_not_found() {
    let app = TestApp::new();
    let owner = Uuid::new_v4();
    let intruder = Uuid::new_v4();
    app.quotes.set("AAPL", dec!(60));

    let account = create_account(&app, owner, "Main", "1000", true).await;
    let account_id = account["id"].as_str().unwrap();
    let order = open_order(&app, owner, account_id, "AAPL", "buy", "1", "50").await;
    let order_id = order["id"].as_str().unwrap();

    let (status, _) = send(&app, Method::POST, &format!("/orders/{}/close", order_id), Some(intruder), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::POST, "/orders", Some(intruder), Some(json!({
        "accountId": account_id,
        "symbol": "AAPL",
        "side": "buy",
        "quantity": 1,
        "entryPrice": 50,
    }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &format!("/accounts/{}", account_id), Some(intruder), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::PATCH, &format!("/accounts/{}/default", account_id), Some(intruder), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, Method::GET, "/accounts", Some(intruder), None).await;
    assert_eq!(body["accounts"], json!([]));
    let (_, body) = send(&app, Method::GET, "/orders", Some(intruder), None).await;
    assert_eq!(body["orders"], json!([]));

    // Still intact for the owner
    let (_, body) = send(&app, Method::GET, "/orders", Some(owner), None).await;
    assert_eq!(body["orders"].as_array().unwrap().len(), 1);
    assert_eq!(app.ledger.list_accounts(owner).await.unwrap()[0].balance, dec!(1000));
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = TestApp::new();
    let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/accounts").is_some());
    assert!(body["paths"].get("/orders/{id}/close").is_some());
}
