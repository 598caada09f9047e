use axum::{extract::State, routing::get, Json, Router};

use crate::{services::reports::DashboardStats, ApiResponse, ApiResult, AppState};

async fn get_stats(State(state): State<AppState>) -> ApiResult<DashboardStats> {
    let stats = state.services.reports.dashboard_stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/stats", get(get_stats))
}
