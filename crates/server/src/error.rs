use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{
    contract_expiry::ContractExpiryError, payment_schedule::ScheduleError, reports::ReportsError,
};
use utils::response::ApiResponse;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Expiry(#[from] ContractExpiryError),
    #[error(transparent)]
    Reports(#[from] ReportsError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Schedule(ScheduleError::InvalidPeriod(_))
            | ApiError::Schedule(ScheduleError::NegativeTotal)
            | ApiError::Schedule(ScheduleError::StoredOverdue)
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Schedule(ScheduleError::ScheduleExists(_)) => StatusCode::CONFLICT,
            ApiError::Schedule(ScheduleError::PaymentNotFound(_))
            | ApiError::Schedule(ScheduleError::ContractNotFound(_))
            | ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Schedule(ScheduleError::Database(_))
            | ApiError::Expiry(_)
            | ApiError::Reports(_)
            | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("request failed: {self}");
        }
        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}
