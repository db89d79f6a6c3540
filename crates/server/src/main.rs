use db::{DBService, models::app_settings::AppSettings};
use server::AppState;
use services::services::{
    config::Config, contract_expiry::ContractExpiryService, notification::NotificationService,
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    utils::logging::init();

    let config = Config::from_env();
    let db = DBService::new(&config.db_path).await?;

    let notifications = NotificationService::new();
    let expiry = ContractExpiryService::new(db.clone(), notifications.clone(), &config);

    // Seed the poller's enabled flag from the persisted setting.
    let settings = AppSettings::get(&db.pool).await?;
    expiry.set_enabled(settings.notifications_enabled);
    expiry.start();

    let state = AppState {
        db,
        config: config.clone(),
        notifications,
        expiry: expiry.clone(),
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("listening on {}", config.bind_addr);
    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    expiry.stop();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
}
