//! Gate verification server.
//!
//! Runs the HTTP endpoints the event gate depends on:
//! - `GET /scan` verifies QR tokens and records every attempt
//! - `GET /api/tickets/:code` shows ticket status to holders
//! - `POST /api/admin/*` login, counters and code maintenance
//!
//! # Usage
//!
//! ```bash
//! # Configuration comes from the environment / .env
//! cargo run --bin server
//! ```

use gatekeeper_server::{build_router, AdminSessions, AppState, Config};
use gatekeeper_ticketing::{ScanLog, SqliteStore, VerificationEngine};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "info,gatekeeper_server=debug,gatekeeper_ticketing=debug,sqlx=warn".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting gate verification server...");

    let config = Config::from_env();
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        database = %config.database.path.display(),
        reuse_window_hours = config.verification.reuse_window_hours,
        "Loaded configuration"
    );

    // Wire up the store, engine and session registry
    let store = SqliteStore::new(&config.database.path).await?;
    let scan_log = ScanLog::new(&config.verification.scan_log_path);
    let engine = VerificationEngine::new(store.clone(), scan_log.clone()).with_reuse_window(
        chrono::Duration::hours(config.verification.reuse_window_hours),
    );
    let sessions = AdminSessions::new(
        config.admin.password.clone(),
        chrono::Duration::minutes(config.admin.session_ttl_minutes),
    );

    let state = AppState::new(engine, store, sessions, scan_log);
    let app = build_router(state);

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Gate server listening on {address}, Ctrl+C stops it");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gate server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
}
