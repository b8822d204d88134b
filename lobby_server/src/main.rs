//! Poker lobby server: table seating, wallets and realtime rooms over
//! HTTP and WebSocket.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use lobby_server::{
    api::{self, AppState},
    config::{ServerConfig, StorageBackend},
    logging, metrics,
};
use pico_args::Arguments;
use poker_lobby::{Lobby, auth::TokenVerifier, db::Database};

const HELP: &str = "\
Run the poker lobby server

USAGE:
  lobby_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  --memory                 Keep all state in process memory instead of PostgreSQL
  -h, --help               Print help information

ENVIRONMENT:
  JWT_SECRET               Shared HS256 secret, at least 32 characters (required)
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  METRICS_BIND             Prometheus endpoint address, disabled when unset
  STORAGE                  postgres (default) or memory
  DATABASE_URL             PostgreSQL connection string
  RUST_LOG                 Log filter [default: info,sqlx=warn,hyper=warn]
  (See .env.example for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let memory = pargs.contains("--memory");
    let bind: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;

    let config = ServerConfig::from_env(bind, database_url, memory)?;

    logging::init();
    tracing::info!("Starting poker lobby server at {}", config.bind);

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        tracing::info!("Prometheus metrics available at http://{}/metrics", addr);
    }

    let (lobby, db) = match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; all state is lost on shutdown");
            (Lobby::in_memory(config.lobby.clone()), None)
        }
        StorageBackend::Postgres => {
            let db = Database::new(&config.database)
                .await
                .context("Failed to connect to database")?;
            db.run_migrations()
                .await
                .context("Failed to apply database schema")?;
            tracing::info!("Database connected successfully");

            let lobby = Lobby::new(Arc::new(db.store()), config.lobby.clone());
            (lobby, Some(db))
        }
    };

    let state = AppState {
        lobby,
        verifier: Arc::new(TokenVerifier::new(&config.jwt_secret)),
        db: db.clone(),
    };
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    tracing::info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutting down server...");
    if let Some(db) = db {
        db.close().await;
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
