use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use shopledger_api::{
    config::AppConfig,
    db,
    events::{self, EventSender},
    handlers::AppServices,
    AppState,
};

/// Helper harness: the real router over a throwaway SQLite database.
pub struct TestApp {
    router: Router,
    #[allow(dead_code)]
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: tempfile::TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("create temp dir for test database");
        let db_path = db_dir.path().join("shopledger_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(db_arc.clone(), event_sender.clone());
        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .nest("/api/v1", shopledger_api::api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    /// Send a JSON request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Parse a response body into JSON.
pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// Read a monetary field that may arrive as a JSON string or number.
#[allow(dead_code)]
pub fn money(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("not a monetary value: {other:?}"),
    }
}

/// Registers a supplier purchase (which also creates the parallel inventory
/// row) and returns the created row's JSON.
#[allow(dead_code)]
pub async fn seed_supplier_product(
    app: &TestApp,
    supplier_name: &str,
    product_code: &str,
    quantity: i32,
    unit_price: &str,
    payment_status: &str,
) -> Value {
    let response = app
        .request(
            Method::POST,
            "/api/v1/suppliers",
            Some(serde_json::json!({
                "supplier_name": supplier_name,
                "product_name": format!("Product {product_code}"),
                "product_code": product_code,
                "quantity": quantity,
                "unit_price": unit_price,
                "payment_status": payment_status,
            })),
        )
        .await;
    assert_eq!(response.status(), 201, "seed supplier product");
    response_json(response).await["data"].clone()
}

/// Records a sale to a customer and returns the created row's JSON.
#[allow(dead_code)]
pub async fn seed_customer_purchase(
    app: &TestApp,
    customer_name: &str,
    product_code: &str,
    quantity: i32,
    unit_price: &str,
    payment_status: &str,
) -> Value {
    let response = app
        .request(
            Method::POST,
            "/api/v1/customers",
            Some(serde_json::json!({
                "customer_name": customer_name,
                "product_name": format!("Product {product_code}"),
                "product_code": product_code,
                "quantity": quantity,
                "unit_price": unit_price,
                "payment_status": payment_status,
            })),
        )
        .await;
    assert_eq!(response.status(), 201, "seed customer purchase");
    response_json(response).await["data"].clone()
}

/// Puts cash into the ledger so refunds have something to draw from.
#[allow(dead_code)]
pub async fn seed_cash(app: &TestApp, amount: &str) {
    let response = app
        .request(
            Method::POST,
            "/api/v1/cash/update",
            Some(serde_json::json!({
                "action": "add",
                "amount": amount,
                "description": "opening balance",
            })),
        )
        .await;
    assert_eq!(response.status(), 200, "seed cash");
}

#[allow(dead_code)]
pub async fn cash_balance(app: &TestApp) -> Decimal {
    let response = app.request(Method::GET, "/api/v1/cash/balance", None).await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    money(&body["data"]["balance"])
}

/// Finds the inventory rows carrying a product code, oldest first.
#[allow(dead_code)]
pub async fn inventory_rows_by_code(app: &TestApp, product_code: &str) -> Vec<Value> {
    let response = app.request(Method::GET, "/api/v1/inventory", None).await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    let mut rows: Vec<Value> = body["data"]
        .as_array()
        .expect("inventory list")
        .iter()
        .filter(|row| row["product_code"] == product_code)
        .cloned()
        .collect();
    rows.sort_by_key(|row| row["id"].as_i64());
    rows
}
