use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    entities::{customer, customer_product},
    errors::ServiceError,
    models::PaymentStatus,
    services::{
        customers::{CreateCustomerPurchase, UpdateCustomerPurchase},
        returns::ProcessReturn,
    },
    ApiResponse, ApiResult, AppState,
};

use super::returns::ProcessedReturnResponse;

/// One customer sale line, flattened with its customer for table views.
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct CustomerProductRow {
    pub customer_id: i32,
    pub customer_name: String,
    pub product_id: i32,
    pub product_name: String,
    pub product_code: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub payment_status: String,
    pub amount_paid: Decimal,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl CustomerProductRow {
    fn from_pair(customer: &customer::Model, product: &customer_product::Model) -> Self {
        Self {
            customer_id: customer.id,
            customer_name: customer.name.clone(),
            product_id: product.id,
            product_name: product.product_name.clone(),
            product_code: product.product_code.clone(),
            quantity: product.quantity,
            unit_price: product.unit_price,
            payment_status: product.payment_status.clone(),
            amount_paid: product.amount_paid,
            balance: product.balance(),
            created_at: product.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, message = "Customer name cannot be empty"))]
    pub customer_name: String,
    #[serde(default = "default_product_name")]
    pub product_name: String,
    /// Defaults to a generated `CUST-` code for walk-in purchases.
    pub product_code: Option<String>,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[serde(default)]
    pub unit_price: Decimal,
    #[serde(default = "default_payment_status")]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub amount_paid: Decimal,
    /// When set, the sale consumes stock from this inventory row; the whole
    /// creation fails if the row cannot cover the quantity.
    pub inventory_id: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, message = "Customer name cannot be empty"))]
    pub customer_name: String,
    #[validate(length(min = 1, message = "Product name cannot be empty"))]
    pub product_name: String,
    #[validate(length(min = 1, message = "Product code cannot be empty"))]
    pub product_code: String,
    #[validate(range(min = 0))]
    pub quantity: i32,
    pub unit_price: Decimal,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub amount_paid: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddCustomerProductRequest {
    #[validate(length(min = 1, message = "Product name cannot be empty"))]
    pub product_name: String,
    #[validate(length(min = 1, message = "Product code cannot be empty"))]
    pub product_code: String,
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[serde(default)]
    pub unit_price: Decimal,
    #[serde(default = "default_payment_status")]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub amount_paid: Decimal,
}

/// Customer-return request (field names match the browser client).
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerReturnRequest {
    pub return_quantity: i32,
    pub refund_amount: Option<Decimal>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

fn default_product_name() -> String {
    "General Purchase".to_string()
}

fn default_quantity() -> i32 {
    1
}

fn default_payment_status() -> PaymentStatus {
    PaymentStatus::Unpaid
}

async fn get_stats(
    State(state): State<AppState>,
) -> ApiResult<crate::services::customers::CustomerStats> {
    let stats = state.services.customers.stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}

async fn get_receivables(
    State(state): State<AppState>,
) -> ApiResult<crate::services::customers::ReceivablesStats> {
    let stats = state.services.customers.receivables().await?;
    Ok(Json(ApiResponse::success(stats)))
}

async fn list_customers(State(state): State<AppState>) -> ApiResult<Vec<CustomerProductRow>> {
    let customers = state.services.customers.list().await?;
    let rows = customers
        .iter()
        .flat_map(|(customer, products)| {
            products
                .iter()
                .map(|product| CustomerProductRow::from_pair(customer, product))
        })
        .collect();
    Ok(Json(ApiResponse::success(rows)))
}

async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Vec<CustomerProductRow>> {
    let (customer, products) = state.services.customers.get(id).await?;
    let rows = products
        .iter()
        .map(|product| CustomerProductRow::from_pair(&customer, product))
        .collect();
    Ok(Json(ApiResponse::success(rows)))
}

async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CreateCustomerRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    let product_code = payload.product_code.unwrap_or_else(|| {
        format!("CUST-{}", chrono::Utc::now().timestamp_millis())
    });

    let (customer, product) = state
        .services
        .customers
        .create(CreateCustomerPurchase {
            customer_name: payload.customer_name,
            product_name: payload.product_name,
            product_code,
            quantity: payload.quantity,
            unit_price: payload.unit_price,
            payment_status: payload.payment_status,
            amount_paid: payload.amount_paid,
            inventory_id: payload.inventory_id,
        })
        .await?;

    let row = CustomerProductRow::from_pair(&customer, &product);
    Ok((StatusCode::CREATED, Json(ApiResponse::success(row))))
}

async fn update_customer_product(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    Json(payload): Json<UpdateCustomerRequest>,
) -> ApiResult<CustomerProductRow> {
    payload.validate()?;

    let (customer, product) = state
        .services
        .customers
        .update(
            product_id,
            UpdateCustomerPurchase {
                customer_name: payload.customer_name,
                product_name: payload.product_name,
                product_code: payload.product_code,
                quantity: payload.quantity,
                unit_price: payload.unit_price,
                payment_status: payload.payment_status,
                amount_paid: payload.amount_paid,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(CustomerProductRow::from_pair(
        &customer, &product,
    ))))
}

async fn delete_customer_product(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> ApiResult<serde_json::Value> {
    state.services.customers.delete(product_id).await?;
    Ok(Json(ApiResponse::success(json!({
        "message": "Customer product deleted successfully"
    }))))
}

async fn add_customer_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<AddCustomerProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    let product = state
        .services
        .customers
        .add_product(
            id,
            payload.product_name,
            payload.product_code,
            payload.quantity,
            payload.unit_price,
            payload.payment_status,
            payload.amount_paid,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(product))))
}

/// Processes a return of a customer purchase. Validation failures leave the
/// books untouched; on success the sale line, inventory, and cash ledger are
/// reconciled in one transaction.
async fn process_customer_return(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    Json(payload): Json<CustomerReturnRequest>,
) -> ApiResult<ProcessedReturnResponse> {
    let processed = state
        .services
        .returns
        .process_customer_return(
            product_id,
            ProcessReturn {
                return_quantity: payload.return_quantity,
                refund_amount: payload.refund_amount,
                reason: payload.reason,
                notes: payload.notes,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(processed.into())))
}

pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/stats/receivables", get(get_receivables))
        .route("/", get(list_customers).post(create_customer))
        .route(
            "/:id",
            get(get_customer)
                .put(update_customer_product)
                .delete(delete_customer_product),
        )
        .route("/:id/products", post(add_customer_product))
        .route("/:id/return", post(process_customer_return))
}
