use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use chrono::Utc;
use db::models::receipt::{CreateReceipt, Receipt};
use serde::Deserialize;
use tracing::info;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ReceiptFilter {
    pub contract_id: Option<Uuid>,
}

pub async fn list_receipts(
    State(state): State<AppState>,
    Query(filter): Query<ReceiptFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<Receipt>>>, ApiError> {
    let receipts = match filter.contract_id {
        Some(contract_id) => Receipt::find_by_contract_id(&state.db.pool, contract_id).await?,
        None => Receipt::find_all(&state.db.pool).await?,
    };
    Ok(ResponseJson(ApiResponse::success(receipts)))
}

pub async fn get_receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Receipt>>, ApiError> {
    let receipt = Receipt::find_by_id(&state.db.pool, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(ResponseJson(ApiResponse::success(receipt)))
}

pub async fn create_receipt(
    State(state): State<AppState>,
    user: CurrentUser,
    axum::Json(payload): axum::Json<CreateReceipt>,
) -> Result<ResponseJson<ApiResponse<Receipt>>, ApiError> {
    let number = match &payload.number {
        Some(number) => number.clone(),
        None => Receipt::next_number(&state.db.pool).await?,
    };
    let issued_date = payload.issued_date.unwrap_or_else(|| Utc::now().date_naive());

    let receipt = Receipt::create(&state.db.pool, number, issued_date, &payload).await?;
    info!(
        receipt = %receipt.number,
        issued_by = user.0.display_name(),
        "receipt issued"
    );
    Ok(ResponseJson(ApiResponse::success(receipt)))
}

pub async fn delete_receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let deleted = Receipt::delete(&state.db.pool, id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/receipts", get(list_receipts).post(create_receipt))
        .route("/receipts/{id}", get(get_receipt).delete(delete_receipt))
}
