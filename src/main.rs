use anyhow::Context;
use batepapo::{AppState, app, clock::SystemClock, config::Config, store::SqliteStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let store = SqliteStore::connect(&config.database_url, config.max_connections)
        .await
        .map_err(|err| err.0)
        .with_context(|| format!("could not open {}", config.database_url))?;

    let app = app(AppState::new(store, SystemClock));

    let listener = tokio::net::TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("could not bind {}", config.listen_addr()))?;
    tracing::info!("Server running on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
