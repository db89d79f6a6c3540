pub mod clients;
pub mod contracts;
pub mod equipment;
pub mod notifications;
pub mod payments;
pub mod products;
pub mod receipts;
pub mod reports;
pub mod settings;

use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(clients::router())
        .merge(contracts::router())
        .merge(equipment::router())
        .merge(notifications::router())
        .merge(payments::router())
        .merge(products::router())
        .merge(receipts::router())
        .merge(reports::router())
        .merge(settings::router())
}
