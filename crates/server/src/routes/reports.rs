use axum::{
    Router,
    extract::{Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use services::services::reports::{MonthlyRevenue, ReportsService, SummaryReport};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct RevenueParams {
    pub year: Option<i32>,
}

pub async fn summary(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<SummaryReport>>, ApiError> {
    let service = ReportsService::new(state.db.pool.clone());
    let report = service.summary(Utc::now().date_naive()).await?;
    Ok(ResponseJson(ApiResponse::success(report)))
}

pub async fn monthly_revenue(
    State(state): State<AppState>,
    Query(params): Query<RevenueParams>,
) -> Result<ResponseJson<ApiResponse<Vec<MonthlyRevenue>>>, ApiError> {
    let year = params.year.unwrap_or_else(|| Utc::now().year());
    let service = ReportsService::new(state.db.pool.clone());
    let revenue = service.monthly_revenue(year).await?;
    Ok(ResponseJson(ApiResponse::success(revenue)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reports/summary", get(summary))
        .route("/reports/monthly-revenue", get(monthly_revenue))
}
