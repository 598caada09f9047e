//! Integration tests for the returns-and-reconciliation workflow: customer
//! and supplier-side returns, the proportional refund cap, inventory
//! restocking, party cascade, and the cash fold-in.

mod common;

use axum::http::Method;
use common::{
    cash_balance, inventory_rows_by_code, money, response_json, seed_cash,
    seed_customer_purchase, seed_supplier_product, TestApp,
};
use rust_decimal_macros::dec;
use serde_json::json;

// ==================== Customer returns ====================

#[tokio::test]
async fn partial_customer_return_with_default_refund() {
    let app = TestApp::new().await;
    seed_cash(&app, "100.00").await;

    // 10 units at 5.00, fully paid: amount_paid is forced to 50.00.
    let line = seed_customer_purchase(&app, "Dana Cruz", "P-100", 10, "5.00", "fully_paid").await;
    assert_eq!(money(&line["amount_paid"]), dec!(50.00));
    let product_id = line["product_id"].as_i64().unwrap();

    // Return 4 units with no explicit refund: defaults to 4 x 5.00 = 20.00,
    // exactly the proportional cap (4/10 of 50.00).
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/customers/{product_id}/return"),
            Some(json!({ "returnQuantity": 4 })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;

    let data = &body["data"];
    assert_eq!(data["return_type"], "customer");
    assert_eq!(data["status"], "completed");
    assert_eq!(money(&data["total_amount"]), dec!(20.00));
    assert_eq!(data["party_name"], "Dana Cruz");
    assert_eq!(data["original_order_id"], "P-100");
    assert_eq!(data["item"]["quantity"], 4);
    assert_eq!(money(&data["item"]["total_price"]), dec!(20.00));

    // The sale line shrank and stayed fully paid (30.00 == 6 x 5.00).
    let customer_id = line["customer_id"].as_i64().unwrap();
    let response = app
        .request(Method::GET, &format!("/api/v1/customers/{customer_id}"), None)
        .await;
    let rows = response_json(response).await;
    let row = &rows["data"][0];
    assert_eq!(row["quantity"], 6);
    assert_eq!(money(&row["amount_paid"]), dec!(30.00));
    assert_eq!(row["payment_status"], "fully_paid");
    assert_eq!(money(&row["balance"]), dec!(0));

    // The refund left the cash ledger inside the same operation.
    assert_eq!(cash_balance(&app).await, dec!(80.00));
}

#[tokio::test]
async fn refund_above_proportional_cap_is_rejected_without_writes() {
    let app = TestApp::new().await;
    seed_cash(&app, "100.00").await;

    let line = seed_customer_purchase(&app, "Dana Cruz", "P-101", 10, "5.00", "fully_paid").await;
    let product_id = line["product_id"].as_i64().unwrap();
    let customer_id = line["customer_id"].as_i64().unwrap();

    // Cap for returning 4 of 10 on 50.00 paid is 20.00; 25.00 must fail.
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/customers/{product_id}/return"),
            Some(json!({ "returnQuantity": 4, "refundAmount": "25.00" })),
        )
        .await;
    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("proportional cap"));

    // Nothing moved: line, returns, and cash are untouched.
    let response = app
        .request(Method::GET, &format!("/api/v1/customers/{customer_id}"), None)
        .await;
    let rows = response_json(response).await;
    assert_eq!(rows["data"][0]["quantity"], 10);
    assert_eq!(money(&rows["data"][0]["amount_paid"]), dec!(50.00));

    let response = app.request(Method::GET, "/api/v1/returns", None).await;
    let returns = response_json(response).await;
    assert_eq!(returns["data"].as_array().unwrap().len(), 0);

    assert_eq!(cash_balance(&app).await, dec!(100.00));
}

#[tokio::test]
async fn invalid_return_quantities_are_rejected() {
    let app = TestApp::new().await;
    let line = seed_customer_purchase(&app, "Lee Wong", "P-102", 5, "2.00", "unpaid").await;
    let product_id = line["product_id"].as_i64().unwrap();

    for quantity in [0, -2, 6] {
        let response = app
            .request(
                Method::POST,
                &format!("/api/v1/customers/{product_id}/return"),
                Some(json!({ "returnQuantity": quantity, "refundAmount": "0" })),
            )
            .await;
        assert_eq!(response.status(), 400, "quantity {quantity} must be rejected");
    }
}

#[tokio::test]
async fn full_return_deletes_the_line_and_the_customer() {
    let app = TestApp::new().await;

    // Unpaid line, so the only acceptable refund is zero.
    let line = seed_customer_purchase(&app, "Sam Reyes", "P-103", 2, "5.00", "unpaid").await;
    let product_id = line["product_id"].as_i64().unwrap();
    let customer_id = line["customer_id"].as_i64().unwrap();

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/customers/{product_id}/return"),
            Some(json!({ "returnQuantity": 2, "refundAmount": "0" })),
        )
        .await;
    assert_eq!(response.status(), 200);

    // It was the customer's only line, so the customer is gone too.
    let response = app
        .request(Method::GET, &format!("/api/v1/customers/{customer_id}"), None)
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn customer_return_merges_stock_into_the_existing_inventory_row() {
    let app = TestApp::new().await;

    // Inventory row for P-104 sits at quantity 3.
    seed_supplier_product(&app, "Acme Parts", "P-104", 3, "4.00", "unpaid").await;
    let before = inventory_rows_by_code(&app, "P-104").await;
    assert_eq!(before.len(), 1);
    assert_eq!(before[0]["quantity"], 3);

    // A customer returns 2 units of the same product.
    let line = seed_customer_purchase(&app, "Ana Silva", "P-104", 2, "4.00", "unpaid").await;
    let product_id = line["product_id"].as_i64().unwrap();

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/customers/{product_id}/return"),
            Some(json!({ "returnQuantity": 2, "refundAmount": "0" })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["inventory_restocked"], true);

    // The stock merged into the original row: 3 + 2 = 5. No synthetic
    // "Returned Items" row appeared.
    let after = inventory_rows_by_code(&app, "P-104").await;
    assert_eq!(after.len(), 1);
    assert_eq!(after[0]["id"], before[0]["id"]);
    assert_eq!(after[0]["quantity"], 5);

    let response = app.request(Method::GET, "/api/v1/inventory", None).await;
    let all = response_json(response).await;
    assert!(all["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|row| row["supplier_name"] != "Returned Items"));
}

#[tokio::test]
async fn customer_return_without_inventory_row_completes_with_a_warning_flag() {
    let app = TestApp::new().await;

    let line = seed_customer_purchase(&app, "Jo Park", "GHOST-1", 3, "2.00", "unpaid").await;
    let product_id = line["product_id"].as_i64().unwrap();

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/customers/{product_id}/return"),
            Some(json!({ "returnQuantity": 1, "refundAmount": "0" })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    // Best-effort restock: the return committed, the flag says inventory
    // was not touched.
    assert_eq!(body["data"]["inventory_restocked"], false);

    let response = app.request(Method::GET, "/api/v1/returns", None).await;
    let returns = response_json(response).await;
    assert_eq!(returns["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn refund_larger_than_cash_on_hand_aborts_the_whole_return() {
    let app = TestApp::new().await;
    seed_cash(&app, "10.00").await;

    let line = seed_customer_purchase(&app, "Dana Cruz", "P-105", 10, "5.00", "fully_paid").await;
    let product_id = line["product_id"].as_i64().unwrap();
    let customer_id = line["customer_id"].as_i64().unwrap();

    // Default refund would be 20.00 but only 10.00 is on hand.
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/customers/{product_id}/return"),
            Some(json!({ "returnQuantity": 4 })),
        )
        .await;
    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("Insufficient cash"));

    // The transaction rolled back as a unit: no return row, line intact,
    // balance untouched.
    let response = app.request(Method::GET, "/api/v1/returns", None).await;
    let returns = response_json(response).await;
    assert_eq!(returns["data"].as_array().unwrap().len(), 0);

    let response = app
        .request(Method::GET, &format!("/api/v1/customers/{customer_id}"), None)
        .await;
    let rows = response_json(response).await;
    assert_eq!(rows["data"][0]["quantity"], 10);

    assert_eq!(cash_balance(&app).await, dec!(10.00));
}

// ==================== Supplier-side (inventory) returns ====================

#[tokio::test]
async fn partial_inventory_return_reconciles_the_row_and_cash() {
    let app = TestApp::new().await;
    seed_cash(&app, "100.00").await;

    seed_supplier_product(&app, "Acme Parts", "P-200", 10, "5.00", "fully_paid").await;
    let rows = inventory_rows_by_code(&app, "P-200").await;
    let item_id = rows[0]["id"].as_i64().unwrap();

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/inventory/{item_id}/return"),
            Some(json!({ "return_quantity": 4, "return_reason": "Damaged on arrival" })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["return_type"], "supplier");
    assert_eq!(money(&body["data"]["total_amount"]), dec!(20.00));
    assert_eq!(body["data"]["party_name"], "Acme Parts");

    // The inventory row shrank and its payment state re-derived.
    let rows = inventory_rows_by_code(&app, "P-200").await;
    assert_eq!(rows[0]["quantity"], 6);
    assert_eq!(money(&rows[0]["amount_paid"]), dec!(30.00));
    assert_eq!(rows[0]["payment_status"], "fully_paid");

    assert_eq!(cash_balance(&app).await, dec!(80.00));
}

#[tokio::test]
async fn full_inventory_return_deletes_the_row() {
    let app = TestApp::new().await;
    seed_cash(&app, "100.00").await;

    seed_supplier_product(&app, "Acme Parts", "P-201", 3, "5.00", "fully_paid").await;
    let rows = inventory_rows_by_code(&app, "P-201").await;
    let item_id = rows[0]["id"].as_i64().unwrap();

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/inventory/{item_id}/return"),
            Some(json!({ "return_quantity": 3 })),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .request(Method::GET, &format!("/api/v1/inventory/{item_id}"), None)
        .await;
    assert_eq!(response.status(), 404);
    assert!(inventory_rows_by_code(&app, "P-201").await.is_empty());
}

#[tokio::test]
async fn inventory_return_quantity_cannot_exceed_stock() {
    let app = TestApp::new().await;
    seed_supplier_product(&app, "Acme Parts", "P-202", 2, "5.00", "unpaid").await;
    let rows = inventory_rows_by_code(&app, "P-202").await;
    let item_id = rows[0]["id"].as_i64().unwrap();

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/inventory/{item_id}/return"),
            Some(json!({ "return_quantity": 5, "refund_amount": "0" })),
        )
        .await;
    assert_eq!(response.status(), 400);

    let rows = inventory_rows_by_code(&app, "P-202").await;
    assert_eq!(rows[0]["quantity"], 2);
}

// ==================== Returns administration ====================

#[tokio::test]
async fn returns_are_listed_newest_first_with_item_product_names() {
    let app = TestApp::new().await;
    seed_cash(&app, "100.00").await;

    let line = seed_customer_purchase(&app, "Dana Cruz", "P-300", 6, "5.00", "fully_paid").await;
    let product_id = line["product_id"].as_i64().unwrap();

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/customers/{product_id}/return"),
            Some(json!({ "returnQuantity": 2 })),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app.request(Method::GET, "/api/v1/returns", None).await;
    let body = response_json(response).await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["product_name"], "Product P-300");
    assert!(rows[0]["return_id"].as_str().unwrap().starts_with("RET"));
}

#[tokio::test]
async fn administrative_edit_and_delete_touch_only_the_return_record() {
    let app = TestApp::new().await;
    seed_cash(&app, "100.00").await;

    let line = seed_customer_purchase(&app, "Dana Cruz", "P-301", 6, "5.00", "fully_paid").await;
    let product_id = line["product_id"].as_i64().unwrap();
    let customer_id = line["customer_id"].as_i64().unwrap();

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/customers/{product_id}/return"),
            Some(json!({ "returnQuantity": 2 })),
        )
        .await;
    let processed = response_json(response).await;
    let record_id = processed["data"]["id"].as_i64().unwrap();

    // Edit descriptive fields.
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/returns/{record_id}"),
            Some(json!({
                "party_name": "Dana Cruz",
                "total_amount": "10.00",
                "status": "completed",
                "reason": "Adjusted after review",
                "notes": "manual correction",
            })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["reason"], "Adjusted after review");

    // The edit did not re-reconcile: the sale line still shows the original
    // post-return state and the cash balance is unchanged.
    let response = app
        .request(Method::GET, &format!("/api/v1/customers/{customer_id}"), None)
        .await;
    let rows = response_json(response).await;
    assert_eq!(rows["data"][0]["quantity"], 4);
    assert_eq!(cash_balance(&app).await, dec!(90.00));

    // Delete cascades to items, nothing else.
    let response = app
        .request(Method::DELETE, &format!("/api/v1/returns/{record_id}"), None)
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .request(Method::GET, &format!("/api/v1/returns/{record_id}"), None)
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn getting_a_missing_return_is_a_404() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/api/v1/returns/999", None).await;
    assert_eq!(response.status(), 404);
}
