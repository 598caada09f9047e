use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    entities::{supplier, supplier_product},
    errors::ServiceError,
    models::PaymentStatus,
    services::suppliers::{CreateSupplierProduct, UpdateSupplierProduct},
    ApiResponse, ApiResult, AppState,
};

/// One supplier purchase line, flattened with its supplier for table views.
/// `balance` is derived on the way out.
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct SupplierProductRow {
    pub supplier_id: i32,
    pub supplier_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub contact_person: Option<String>,
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

impl SupplierProductRow {
    fn from_pair(supplier: &supplier::Model, product: &supplier_product::Model) -> Self {
        Self {
            supplier_id: supplier.id,
            supplier_name: supplier.name.clone(),
            email: supplier.email.clone(),
            phone: supplier.phone.clone(),
            address: supplier.address.clone(),
            contact_person: supplier.contact_person.clone(),
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
pub struct CreateSupplierRequest {
    #[validate(length(min = 1, message = "Supplier name cannot be empty"))]
    pub supplier_name: String,
    #[validate(length(min = 1, message = "Product name cannot be empty"))]
    pub product_name: String,
    #[validate(length(min = 1, message = "Product code cannot be empty"))]
    pub product_code: String,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[serde(default)]
    pub unit_price: Decimal,
    #[serde(default = "default_payment_status")]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub amount_paid: Decimal,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub contact_person: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSupplierRequest {
    #[validate(length(min = 1, message = "Supplier name cannot be empty"))]
    pub supplier_name: String,
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

fn default_payment_status() -> PaymentStatus {
    PaymentStatus::Unpaid
}

async fn get_stats(
    State(state): State<AppState>,
) -> ApiResult<crate::services::suppliers::SupplierStats> {
    let stats = state.services.suppliers.stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}

async fn get_payables(
    State(state): State<AppState>,
) -> ApiResult<crate::services::suppliers::PayablesStats> {
    let stats = state.services.suppliers.payables().await?;
    Ok(Json(ApiResponse::success(stats)))
}

async fn list_suppliers(State(state): State<AppState>) -> ApiResult<Vec<SupplierProductRow>> {
    let suppliers = state.services.suppliers.list().await?;
    let rows = suppliers
        .iter()
        .flat_map(|(supplier, products)| {
            products
                .iter()
                .map(|product| SupplierProductRow::from_pair(supplier, product))
        })
        .collect();
    Ok(Json(ApiResponse::success(rows)))
}

async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Vec<SupplierProductRow>> {
    let (supplier, products) = state.services.suppliers.get(id).await?;
    let rows = products
        .iter()
        .map(|product| SupplierProductRow::from_pair(&supplier, product))
        .collect();
    Ok(Json(ApiResponse::success(rows)))
}

async fn create_supplier(
    State(state): State<AppState>,
    Json(payload): Json<CreateSupplierRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    let (supplier, product) = state
        .services
        .suppliers
        .create(CreateSupplierProduct {
            supplier_name: payload.supplier_name,
            product_name: payload.product_name,
            product_code: payload.product_code,
            quantity: payload.quantity,
            unit_price: payload.unit_price,
            payment_status: payload.payment_status,
            amount_paid: payload.amount_paid,
            email: payload.email,
            phone: payload.phone,
            address: payload.address,
            contact_person: payload.contact_person,
        })
        .await?;

    let row = SupplierProductRow::from_pair(&supplier, &product);
    Ok((StatusCode::CREATED, Json(ApiResponse::success(row))))
}

async fn update_supplier_product(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    Json(payload): Json<UpdateSupplierRequest>,
) -> ApiResult<SupplierProductRow> {
    payload.validate()?;

    let (supplier, product) = state
        .services
        .suppliers
        .update(
            product_id,
            UpdateSupplierProduct {
                supplier_name: payload.supplier_name,
                product_name: payload.product_name,
                product_code: payload.product_code,
                quantity: payload.quantity,
                unit_price: payload.unit_price,
                payment_status: payload.payment_status,
                amount_paid: payload.amount_paid,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(SupplierProductRow::from_pair(
        &supplier, &product,
    ))))
}

async fn delete_supplier_product(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> ApiResult<serde_json::Value> {
    state.services.suppliers.delete(product_id).await?;
    Ok(Json(ApiResponse::success(json!({
        "message": "Supplier product deleted successfully"
    }))))
}

pub fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/stats/payables", get(get_payables))
        .route("/", get(list_suppliers).post(create_supplier))
        .route(
            "/:id",
            get(get_supplier)
                .put(update_supplier_product)
                .delete(delete_supplier_product),
        )
}
