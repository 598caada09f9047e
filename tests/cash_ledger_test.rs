//! Integration tests for the append-only cash ledger: signed amounts,
//! summed balance, the overdraw guard, and the recent-transactions view.

mod common;

use axum::http::Method;
use common::{cash_balance, money, response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

async fn update_cash(app: &TestApp, action: &str, amount: &str) -> axum::response::Response {
    app.request(
        Method::POST,
        "/api/v1/cash/update",
        Some(json!({
            "action": action,
            "amount": amount,
            "description": format!("{action} {amount}"),
        })),
    )
    .await
}

#[tokio::test]
async fn balance_is_the_sum_of_signed_amounts() {
    let app = TestApp::new().await;

    let response = update_cash(&app, "add", "100.00").await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(money(&body["data"]["newBalance"]), dec!(100.00));
    assert_eq!(body["data"]["transaction"]["transaction_type"], "cash_in");
    assert_eq!(money(&body["data"]["transaction"]["amount"]), dec!(100.00));

    let response = update_cash(&app, "remove", "40.00").await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(money(&body["data"]["newBalance"]), dec!(60.00));
    assert_eq!(body["data"]["transaction"]["transaction_type"], "cash_out");
    // The stored amount carries the sign.
    assert_eq!(money(&body["data"]["transaction"]["amount"]), dec!(-40.00));

    assert_eq!(cash_balance(&app).await, dec!(60.00));
}

#[tokio::test]
async fn add_then_remove_round_trips_to_the_original_balance() {
    let app = TestApp::new().await;

    update_cash(&app, "add", "250.00").await;
    let original = cash_balance(&app).await;

    update_cash(&app, "add", "33.25").await;
    update_cash(&app, "remove", "33.25").await;

    assert_eq!(cash_balance(&app).await, original);
}

#[tokio::test]
async fn overdraw_is_rejected_and_the_balance_is_unchanged() {
    let app = TestApp::new().await;
    update_cash(&app, "add", "40.00").await;

    let response = update_cash(&app, "remove", "100.00").await;
    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Insufficient cash"), "got: {message}");
    // The message names the shortfall.
    assert!(message.contains("60"), "got: {message}");

    assert_eq!(cash_balance(&app).await, dec!(40.00));
}

#[tokio::test]
async fn non_positive_amounts_are_rejected() {
    let app = TestApp::new().await;

    for amount in ["0", "-5.00"] {
        let response = update_cash(&app, "add", amount).await;
        assert_eq!(response.status(), 400, "amount {amount} must be rejected");
    }

    assert_eq!(cash_balance(&app).await, dec!(0));
}

#[tokio::test]
async fn recent_returns_the_newest_transactions_with_display_fields() {
    let app = TestApp::new().await;

    update_cash(&app, "add", "10.00").await;
    update_cash(&app, "add", "20.00").await;
    update_cash(&app, "add", "30.00").await;

    let response = app
        .request(Method::GET, "/api/v1/cash/recent?limit=2", None)
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;

    let transactions = body["data"]["transactions"].as_array().unwrap();
    assert_eq!(transactions.len(), 2);

    // Newest first.
    assert_eq!(money(&transactions[0]["amount"]), dec!(30.00));
    assert_eq!(money(&transactions[1]["amount"]), dec!(20.00));

    for t in transactions {
        assert_eq!(t["type"], "cash_in");
        assert!(t["formattedDate"].as_str().is_some());
        assert!(t["formattedTime"].as_str().is_some());
        assert!(t["description"].as_str().is_some());
    }
}

#[tokio::test]
async fn full_listing_shows_every_movement() {
    let app = TestApp::new().await;

    update_cash(&app, "add", "100.00").await;
    update_cash(&app, "remove", "25.00").await;

    let response = app.request(Method::GET, "/api/v1/cash", None).await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);

    let total: rust_decimal::Decimal = rows.iter().map(|row| money(&row["amount"])).sum();
    assert_eq!(total, dec!(75.00));
}
