use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use seatlock_api::{app, AppState};
use seatlock_core::TokioScheduler;
use seatlock_store::{app_config::Config, SeatRegistry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seatlock_api=debug,seatlock_store=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;

    let scheduler = TokioScheduler::current().context("Failed to bind expiry scheduler")?;
    let registry = SeatRegistry::new(config.registry_config(), Arc::new(scheduler))
        .context("Invalid seat configuration")?;

    let app = app(AppState::new(registry));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
