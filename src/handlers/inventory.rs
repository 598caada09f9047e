use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    entities::inventory_item,
    models::PaymentStatus,
    services::{
        inventory::UpdateInventoryItem,
        returns::ProcessReturn,
    },
    ApiResponse, ApiResult, AppState,
};

use super::returns::ProcessedReturnResponse;

/// An inventory row as clients see it, with the balance derived on the way
/// out.
#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryItemResponse {
    pub id: i32,
    pub supplier_name: String,
    pub product_name: String,
    pub product_code: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub payment_status: String,
    pub amount_paid: Decimal,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<inventory_item::Model> for InventoryItemResponse {
    fn from(model: inventory_item::Model) -> Self {
        let balance = model.balance();
        Self {
            id: model.id,
            supplier_name: model.supplier_name,
            product_name: model.product_name,
            product_code: model.product_code,
            quantity: model.quantity,
            unit_price: model.unit_price,
            payment_status: model.payment_status,
            amount_paid: model.amount_paid,
            balance,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateInventoryRequest {
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

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReduceStockRequest {
    pub quantity_sold: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReduceStockResponse {
    pub message: String,
    pub item: InventoryItemResponse,
    pub quantity_sold: i32,
    pub previous_quantity: i32,
    pub new_quantity: i32,
}

/// Supplier-side return request (field names match the browser client).
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct InventoryReturnRequest {
    pub return_quantity: i32,
    pub refund_amount: Option<Decimal>,
    pub return_reason: Option<String>,
    pub return_notes: Option<String>,
}

async fn get_stats(
    State(state): State<AppState>,
) -> ApiResult<crate::services::inventory::InventoryStats> {
    let stats = state.services.inventory.stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}

async fn list_inventory(State(state): State<AppState>) -> ApiResult<Vec<InventoryItemResponse>> {
    let items = state.services.inventory.list().await?;
    Ok(Json(ApiResponse::success(
        items.into_iter().map(InventoryItemResponse::from).collect(),
    )))
}

async fn get_inventory_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<InventoryItemResponse> {
    let item = state.services.inventory.get(id).await?;
    Ok(Json(ApiResponse::success(item.into())))
}

async fn search_inventory(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> ApiResult<Vec<InventoryItemResponse>> {
    let items = state.services.inventory.search(&term).await?;
    Ok(Json(ApiResponse::success(
        items.into_iter().map(InventoryItemResponse::from).collect(),
    )))
}

async fn get_inventory_by_supplier(
    State(state): State<AppState>,
    Path(supplier_name): Path<String>,
) -> ApiResult<Vec<InventoryItemResponse>> {
    let items = state.services.inventory.by_supplier(&supplier_name).await?;
    Ok(Json(ApiResponse::success(
        items.into_iter().map(InventoryItemResponse::from).collect(),
    )))
}

async fn update_inventory_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateInventoryRequest>,
) -> ApiResult<InventoryItemResponse> {
    payload.validate()?;

    let item = state
        .services
        .inventory
        .update(
            id,
            UpdateInventoryItem {
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

    Ok(Json(ApiResponse::success(item.into())))
}

async fn reduce_stock(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ReduceStockRequest>,
) -> ApiResult<ReduceStockResponse> {
    let reduction = state
        .services
        .inventory
        .reduce_stock(id, payload.quantity_sold)
        .await?;

    Ok(Json(ApiResponse::success(ReduceStockResponse {
        message: "Inventory stock updated successfully".to_string(),
        item: reduction.item.into(),
        quantity_sold: reduction.quantity_sold,
        previous_quantity: reduction.previous_quantity,
        new_quantity: reduction.new_quantity,
    })))
}

async fn delete_inventory_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<serde_json::Value> {
    state.services.inventory.delete(id).await?;
    Ok(Json(ApiResponse::success(json!({
        "message": "Inventory item deleted successfully"
    }))))
}

/// Processes a supplier-side return against an inventory row. The stock
/// leaves the shelf and the refund leaves the cash ledger, atomically.
async fn process_inventory_return(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<InventoryReturnRequest>,
) -> ApiResult<ProcessedReturnResponse> {
    let processed = state
        .services
        .returns
        .process_inventory_return(
            id,
            ProcessReturn {
                return_quantity: payload.return_quantity,
                refund_amount: payload.refund_amount,
                reason: payload.return_reason,
                notes: payload.return_notes,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(processed.into())))
}

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/", get(list_inventory))
        .route("/search/:term", get(search_inventory))
        .route("/supplier/:supplier_name", get(get_inventory_by_supplier))
        .route(
            "/:id",
            get(get_inventory_item)
                .put(update_inventory_item)
                .delete(delete_inventory_item),
        )
        .route("/:id/reduce-stock", put(reduce_stock))
        .route("/:id/return", axum::routing::post(process_inventory_return))
}
