use std::sync::Arc;

use delivery_engine::api;
use delivery_engine::config::{Config, LogFormat};
use delivery_engine::error::AppError;
use delivery_engine::state::AppState;
use delivery_engine::store::memory::{MemoryStore, Seed};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false);
    match config.log_format {
        LogFormat::Compact => subscriber.compact().init(),
        LogFormat::Json => subscriber.json().init(),
    }

    let store = match &config.seed_file {
        Some(path) => {
            let seed = Seed::from_file(path)?;
            tracing::info!(
                seed_file = %path,
                restaurants = seed.restaurants.len(),
                couriers = seed.couriers.len(),
                orders = seed.orders.len(),
                "loaded seed data"
            );
            MemoryStore::from_seed(seed)
        }
        None => MemoryStore::new(),
    };

    let shared_state = Arc::new(AppState::new(
        config.engine.clone(),
        Arc::new(store),
        config.event_buffer_size,
    ));

    let app = api::rest::router(shared_state);

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(
        http_port = config.http_port,
        dispatch_radius_km = config.engine.dispatch_radius_km,
        "http server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
