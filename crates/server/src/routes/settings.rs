use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::get,
};
use chrono::Utc;
use db::models::app_settings::AppSettings;
use serde::Deserialize;
use services::services::contract_expiry::CycleOutcome;
use tracing::info;
use utils::response::ApiResponse;

use crate::{AppState, auth::CurrentUser, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct UpdateNotificationSettings {
    pub enabled: bool,
}

pub async fn get_notification_settings(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<AppSettings>>, ApiError> {
    let settings = AppSettings::get(&state.db.pool).await?;
    Ok(ResponseJson(ApiResponse::success(settings)))
}

/// Persist the flag and mirror it into the running poller so the next cycle
/// honors it without a restart.
pub async fn update_notification_settings(
    State(state): State<AppState>,
    user: CurrentUser,
    axum::Json(payload): axum::Json<UpdateNotificationSettings>,
) -> Result<ResponseJson<ApiResponse<AppSettings>>, ApiError> {
    let settings =
        AppSettings::set_notifications_enabled(&state.db.pool, payload.enabled).await?;
    state.expiry.set_enabled(payload.enabled);
    info!(
        enabled = payload.enabled,
        changed_by = user.0.display_name(),
        "notification setting updated"
    );
    Ok(ResponseJson(ApiResponse::success(settings)))
}

/// Run one expiry check immediately instead of waiting for the next tick.
pub async fn run_notification_check(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<CycleOutcome>>, ApiError> {
    let outcome = state.expiry.check_cycle(Utc::now().date_naive()).await?;
    Ok(ResponseJson(ApiResponse::success(outcome)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/settings/notifications",
            get(get_notification_settings).put(update_notification_settings),
        )
        .route(
            "/settings/notifications/check",
            axum::routing::post(run_notification_check),
        )
}
