use axum::{
    extract::State,
    routing::{delete, get},
    Json, Router,
};
use serde_json::json;

use crate::{services::settings::DataCounts, ApiResponse, ApiResult, AppState};

async fn get_counts(State(state): State<AppState>) -> ApiResult<DataCounts> {
    let counts = state.services.settings.counts().await?;
    Ok(Json(ApiResponse::success(counts)))
}

/// Wipes every table. Destructive and unrecoverable; gated behind an
/// explicit DELETE.
async fn reset_data(State(state): State<AppState>) -> ApiResult<serde_json::Value> {
    state.services.settings.reset().await?;
    Ok(Json(ApiResponse::success(json!({
        "success": true,
        "message": "All data has been successfully reset"
    }))))
}

pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/counts", get(get_counts))
        .route("/reset", delete(reset_data))
}
