use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    entities::{return_item, return_record},
    models::ReturnStatus,
    services::returns::{ProcessedReturn, UpdateReturn},
    ApiResponse, ApiResult, AppState,
};

use super::cash::CashTransactionResponse;

#[derive(Debug, Serialize, ToSchema)]
pub struct ReturnItemResponse {
    pub product_name: String,
    pub product_code: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

impl From<return_item::Model> for ReturnItemResponse {
    fn from(model: return_item::Model) -> Self {
        Self {
            product_name: model.product_name,
            product_code: model.product_code,
            quantity: model.quantity,
            unit_price: model.unit_price,
            total_price: model.total_price,
        }
    }
}

/// Flat list row: the return plus the product name of its first item.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReturnSummary {
    pub id: i32,
    pub return_id: String,
    pub return_type: String,
    pub original_order_id: String,
    pub party_name: String,
    pub return_date: NaiveDate,
    pub total_amount: Decimal,
    pub status: String,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub product_name: Option<String>,
}

impl ReturnSummary {
    fn from_pair(record: return_record::Model, items: &[return_item::Model]) -> Self {
        Self {
            id: record.id,
            return_id: record.return_id,
            return_type: record.return_type,
            original_order_id: record.original_order_id,
            party_name: record.party_name,
            return_date: record.return_date,
            total_amount: record.total_amount,
            status: record.status,
            reason: record.reason,
            notes: record.notes,
            created_at: record.created_at,
            product_name: items.first().map(|item| item.product_name.clone()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReturnDetail {
    #[serde(flatten)]
    pub summary: ReturnSummary,
    pub items: Vec<ReturnItemResponse>,
}

/// Response of a processed return: the committed record plus what the
/// reconciliation touched.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProcessedReturnResponse {
    #[serde(flatten)]
    pub summary: ReturnSummary,
    pub item: ReturnItemResponse,
    /// False when no inventory row existed to merge returned stock into.
    pub inventory_restocked: bool,
    pub cash_transaction: Option<CashTransactionResponse>,
    pub new_cash_balance: Option<Decimal>,
}

impl From<ProcessedReturn> for ProcessedReturnResponse {
    fn from(processed: ProcessedReturn) -> Self {
        let items = std::slice::from_ref(&processed.item);
        Self {
            summary: ReturnSummary::from_pair(processed.record, items),
            item: processed.item.into(),
            inventory_restocked: processed.inventory_restocked,
            cash_transaction: processed.cash_transaction.map(CashTransactionResponse::from),
            new_cash_balance: processed.new_cash_balance,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateReturnRequest {
    #[validate(length(min = 1, message = "Party name cannot be empty"))]
    pub party_name: String,
    pub total_amount: Decimal,
    pub status: ReturnStatus,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

async fn list_returns(State(state): State<AppState>) -> ApiResult<Vec<ReturnSummary>> {
    let returns = state.services.returns.list().await?;
    let rows = returns
        .into_iter()
        .map(|(record, items)| ReturnSummary::from_pair(record, &items))
        .collect();
    Ok(Json(ApiResponse::success(rows)))
}

async fn get_return(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<ReturnDetail> {
    let (record, items) = state.services.returns.get(id).await?;
    Ok(Json(ApiResponse::success(ReturnDetail {
        summary: ReturnSummary::from_pair(record, &items),
        items: items.into_iter().map(ReturnItemResponse::from).collect(),
    })))
}

/// Administrative edit: descriptive fields only, no reconciliation.
async fn update_return(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateReturnRequest>,
) -> ApiResult<ReturnSummary> {
    payload.validate()?;

    let record = state
        .services
        .returns
        .update(
            id,
            UpdateReturn {
                party_name: payload.party_name,
                total_amount: payload.total_amount,
                status: payload.status,
                reason: payload.reason,
                notes: payload.notes,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(ReturnSummary::from_pair(
        record,
        &[],
    ))))
}

async fn delete_return(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<serde_json::Value> {
    state.services.returns.delete(id).await?;
    Ok(Json(ApiResponse::success(json!({
        "message": "Return deleted successfully"
    }))))
}

pub fn return_routes() -> Router<AppState> {
    Router::new().route("/", get(list_returns)).route(
        "/:id",
        get(get_return).put(update_return).delete(delete_return),
    )
}
