use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use greenlight::cli::Cli;
use greenlight::config::{AppConfig, Environment, StorageBackend};
use greenlight::database::{DatabaseManager, Models};
use greenlight::mailer::LogMailer;
use greenlight::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and friends
    let _ = dotenvy::dotenv();

    let config = Cli::parse().apply(AppConfig::from_env());

    // Human-readable output while developing, one JSON object per line elsewhere
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.environment == Environment::Development {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    }

    info!("Starting greenlight-api in {} mode", config.environment.as_str());

    let models = match config.storage {
        StorageBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database)
                .await
                .context("database connection failed")?;
            info!("Database connection pool established");
            Models::postgres(pool, config.database.query_timeout())
        }
        StorageBackend::Memory => {
            info!("Using in-memory store");
            Models::memory()
        }
    };

    let mailer = Arc::new(LogMailer::new(config.mailer.sender.clone()));
    let port = config.port;
    let state = AppState::new(config, models, mailer).context("failed to register metrics")?;
    let _sweeper = state.limiter.spawn_sweeper();

    let bind_addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Server listening on http://{}", bind_addr);

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install shutdown handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
