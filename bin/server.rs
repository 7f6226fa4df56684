// DanBiz Insight - Web Server
// JSON API for the dashboard front-end, built on the core library.

use anyhow::{Context, Result};
use danbiz_insight::{config::Config, db, logging, server, PasswordService};
use std::path::PathBuf;

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;
    logging::init(&config.log_filter);

    tracing::info!(version = danbiz_insight::VERSION, "DanBiz Insight - Web Server");

    // Open database
    let conn = db::open(&config.database_path)
        .with_context(|| format!("Failed to open database {}", config.database_path.display()))?;
    db::setup_database(&conn).context("Failed to initialize users table")?;
    tracing::info!(path = %config.database_path.display(), "database ready");

    let passwords = PasswordService::new(config.hashing).context("Invalid hashing configuration")?;

    // Create shared state + router
    let app = server::router(server::AppState::new(conn, passwords));

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.bind_addr))?;

    tracing::info!(addr = %config.server.bind_addr, "server running, API under /api");

    axum::serve(listener, app)
        .await
        .context("Server stopped unexpectedly")?;

    Ok(())
}
