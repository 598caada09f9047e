use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    entities::cash_transaction, models::CashDirection, ApiResponse, ApiResult, AppState,
};

/// A ledger row as clients see it.
#[derive(Debug, Serialize, ToSchema)]
pub struct CashTransactionResponse {
    pub id: i32,
    pub transaction_type: String,
    pub amount: Decimal,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<cash_transaction::Model> for CashTransactionResponse {
    fn from(model: cash_transaction::Model) -> Self {
        Self {
            id: model.id,
            transaction_type: model.transaction_type,
            amount: model.amount,
            description: model.description,
            created_at: model.created_at,
        }
    }
}

/// Recent-transactions row, annotated for display.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentTransaction {
    pub id: i32,
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub amount: Decimal,
    pub description: String,
    pub date: DateTime<Utc>,
    pub formatted_date: String,
    pub formatted_time: String,
}

impl From<cash_transaction::Model> for RecentTransaction {
    fn from(model: cash_transaction::Model) -> Self {
        Self {
            id: model.id,
            transaction_type: model.transaction_type,
            amount: model.amount,
            description: model
                .description
                .unwrap_or_else(|| "No description".to_string()),
            date: model.created_at,
            formatted_date: model.created_at.format("%m/%d/%Y").to_string(),
            formatted_time: model.created_at.format("%H:%M:%S").to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CashAction {
    Add,
    Remove,
}

impl From<CashAction> for CashDirection {
    fn from(action: CashAction) -> Self {
        match action {
            CashAction::Add => CashDirection::CashIn,
            CashAction::Remove => CashDirection::CashOut,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CashUpdateRequest {
    pub action: CashAction,
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashUpdateResponse {
    pub transaction: CashTransactionResponse,
    pub new_balance: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub balance: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecentTransactionsResponse {
    pub transactions: Vec<RecentTransaction>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecentQuery {
    pub limit: Option<u64>,
}

async fn list_transactions(
    State(state): State<AppState>,
) -> ApiResult<Vec<CashTransactionResponse>> {
    let transactions = state.services.cash.list().await?;
    Ok(Json(ApiResponse::success(
        transactions
            .into_iter()
            .map(CashTransactionResponse::from)
            .collect(),
    )))
}

async fn update_cash(
    State(state): State<AppState>,
    Json(payload): Json<CashUpdateRequest>,
) -> ApiResult<CashUpdateResponse> {
    let recorded = state
        .services
        .cash
        .record(payload.action.into(), payload.amount, payload.description)
        .await?;

    Ok(Json(ApiResponse::success(CashUpdateResponse {
        transaction: recorded.transaction.into(),
        new_balance: recorded.new_balance,
    })))
}

async fn get_balance(State(state): State<AppState>) -> ApiResult<BalanceResponse> {
    let balance = state.services.cash.balance().await?;
    Ok(Json(ApiResponse::success(BalanceResponse { balance })))
}

async fn get_recent(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> ApiResult<RecentTransactionsResponse> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let transactions = state.services.cash.recent(limit).await?;
    Ok(Json(ApiResponse::success(RecentTransactionsResponse {
        transactions: transactions
            .into_iter()
            .map(RecentTransaction::from)
            .collect(),
    })))
}

pub fn cash_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions))
        .route("/update", post(update_cash))
        .route("/balance", get(get_balance))
        .route("/recent", get(get_recent))
}
