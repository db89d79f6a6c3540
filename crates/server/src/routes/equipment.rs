use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::equipment::{CreateEquipment, Equipment, EquipmentStatus, UpdateEquipment};
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct EquipmentFilter {
    pub status: Option<EquipmentStatus>,
}

pub async fn list_equipment(
    State(state): State<AppState>,
    Query(filter): Query<EquipmentFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<Equipment>>>, ApiError> {
    let equipment = Equipment::find_all(&state.db.pool, filter.status).await?;
    Ok(ResponseJson(ApiResponse::success(equipment)))
}

pub async fn get_equipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Equipment>>, ApiError> {
    let equipment = Equipment::find_by_id(&state.db.pool, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(ResponseJson(ApiResponse::success(equipment)))
}

pub async fn create_equipment(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<CreateEquipment>,
) -> Result<ResponseJson<ApiResponse<Equipment>>, ApiError> {
    let equipment = Equipment::create(&state.db.pool, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(equipment)))
}

pub async fn update_equipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateEquipment>,
) -> Result<ResponseJson<ApiResponse<Equipment>>, ApiError> {
    let equipment = Equipment::update(&state.db.pool, id, &payload)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(ResponseJson(ApiResponse::success(equipment)))
}

pub async fn delete_equipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let deleted = Equipment::delete(&state.db.pool, id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/equipment", get(list_equipment).post(create_equipment))
        .route(
            "/equipment/{id}",
            get(get_equipment)
                .put(update_equipment)
                .delete(delete_equipment),
        )
}
