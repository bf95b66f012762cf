use anyhow::Context;
use tokio::net::TcpListener;

use kitten_api::app::{app, AppState};
use kitten_api::config::AppConfig;
use kitten_api::database::Store;
use kitten_api::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env();
    logging::init(logging::server_filter(&config.api));
    config.validate()?;
    tracing::info!("Starting Kitten API in {:?} mode", config.environment);

    let store = Store::connect(&config.database)
        .await
        .with_context(|| format!("failed to open database {}", config.database.url))?;
    store.migrate().await.context("failed to migrate database")?;

    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Kitten API listening on http://{}", bind_addr);

    let state = AppState::new(config, store.clone());
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    store.close().await;
    tracing::info!("Kitten API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
