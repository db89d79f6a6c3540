use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use chrono::Utc;
use db::models::monthly_payment::{MonthlyPayment, UpdateMonthlyPayment};
use services::services::payment_schedule::PaymentScheduleService;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// Installments for a contract, with overdue derived for display.
pub async fn list_contract_payments(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<MonthlyPayment>>>, ApiError> {
    let service = PaymentScheduleService::new(state.db.pool.clone());
    let payments = service
        .list_for_contract(contract_id, Utc::now().date_naive())
        .await?;
    Ok(ResponseJson(ApiResponse::success(payments)))
}

pub async fn update_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateMonthlyPayment>,
) -> Result<ResponseJson<ApiResponse<MonthlyPayment>>, ApiError> {
    let service = PaymentScheduleService::new(state.db.pool.clone());
    let payment = service.update(id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(payment)))
}

pub async fn mark_paid(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<MonthlyPayment>>, ApiError> {
    let service = PaymentScheduleService::new(state.db.pool.clone());
    let payment = service.mark_paid(id).await?;
    Ok(ResponseJson(ApiResponse::success(payment)))
}

pub async fn delete_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let service = PaymentScheduleService::new(state.db.pool.clone());
    service.delete(id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/contracts/{id}/payments", get(list_contract_payments))
        .route("/payments/{id}", put(update_payment).delete(delete_payment))
        .route("/payments/{id}/mark-paid", post(mark_paid))
}
