pub mod auth;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use db::DBService;
use services::services::{
    config::Config, contract_expiry::ContractExpiryService, notification::NotificationService,
};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub config: Config,
    pub notifications: NotificationService,
    pub expiry: Arc<ContractExpiryService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
