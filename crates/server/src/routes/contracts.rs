use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use chrono::NaiveDate;
use db::models::{
    contract::{Contract, CreateContract, UpdateContract},
    equipment::Equipment,
    monthly_payment::MonthlyPayment,
};
use serde::{Deserialize, Serialize};
use services::services::payment_schedule::PaymentScheduleService;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Clone, Serialize)]
pub struct ContractDetail {
    #[serde(flatten)]
    pub contract: Contract,
    pub equipment: Vec<Equipment>,
}

/// Optional overrides for schedule generation; each field defaults to the
/// contract row's value.
#[derive(Debug, Default, Deserialize)]
pub struct GeneratePaymentsRequest {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_value_cents: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecomputedTotal {
    pub contract_id: Uuid,
    pub total_value_cents: i64,
}

pub async fn list_contracts(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Contract>>>, ApiError> {
    let contracts = Contract::find_all(&state.db.pool).await?;
    Ok(ResponseJson(ApiResponse::success(contracts)))
}

pub async fn get_contract(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<ContractDetail>>, ApiError> {
    let contract = Contract::find_by_id(&state.db.pool, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let equipment = Contract::equipment(&state.db.pool, id).await?;
    Ok(ResponseJson(ApiResponse::success(ContractDetail {
        contract,
        equipment,
    })))
}

pub async fn create_contract(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<CreateContract>,
) -> Result<ResponseJson<ApiResponse<Contract>>, ApiError> {
    if payload.start_date > payload.end_date {
        return Err(ApiError::BadRequest(
            "start date is after end date".to_string(),
        ));
    }
    let contract = Contract::create(&state.db.pool, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(contract)))
}

pub async fn update_contract(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateContract>,
) -> Result<ResponseJson<ApiResponse<Contract>>, ApiError> {
    let contract = Contract::update(&state.db.pool, id, &payload)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(ResponseJson(ApiResponse::success(contract)))
}

pub async fn delete_contract(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let deleted = Contract::delete(&state.db.pool, id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

/// Generate the monthly installment schedule for a contract.
pub async fn generate_payments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<GeneratePaymentsRequest>,
) -> Result<ResponseJson<ApiResponse<Vec<MonthlyPayment>>>, ApiError> {
    let contract = Contract::find_by_id(&state.db.pool, id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let service = PaymentScheduleService::new(state.db.pool.clone());
    let payments = service
        .generate(
            contract.id,
            payload.start_date.unwrap_or(contract.start_date),
            payload.end_date.unwrap_or(contract.end_date),
            payload
                .total_value_cents
                .unwrap_or(contract.total_value_cents),
        )
        .await?;

    Ok(ResponseJson(ApiResponse::success(payments)))
}

pub async fn recompute_total(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<RecomputedTotal>>, ApiError> {
    let service = PaymentScheduleService::new(state.db.pool.clone());
    let total_value_cents = service.recompute_contract_total(id).await?;
    Ok(ResponseJson(ApiResponse::success(RecomputedTotal {
        contract_id: id,
        total_value_cents,
    })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/contracts", get(list_contracts).post(create_contract))
        .route(
            "/contracts/{id}",
            get(get_contract)
                .put(update_contract)
                .delete(delete_contract),
        )
        .route("/contracts/{id}/generate-payments", post(generate_payments))
        .route("/contracts/{id}/recompute-total", post(recompute_total))
}
