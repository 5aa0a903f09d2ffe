//! Border registry server entry point.
//!
//! Loads configuration, opens the store once, serves the HTTP API, and
//! shuts down gracefully on SIGINT/SIGTERM.

mod signals;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use border_registry_core::config::AppConfig;
use border_registry_core::db::Database;
use border_registry_web::WebServer;

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// Border crossing record registry.
#[derive(Parser, Debug)]
#[command(
    name = "border-registry",
    version,
    about = "HTTP API recording border crossings and confiscated items"
)]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Override the listen address, e.g. `0.0.0.0:5000`.
    #[arg(long)]
    listen: Option<String>,

    /// Override the SQLite database path.
    #[arg(long)]
    db: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_file(path).context("failed to load configuration file")?,
        None => AppConfig::default(),
    };
    if let Some(listen) = &args.listen {
        config.server.listen = listen.clone();
    }
    if let Some(db) = &args.db {
        config.store.path = db.clone();
    }
    config
        .validate()
        .context("configuration validation failed")?;

    // Initialize tracing
    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.server.log_level);

    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .init();

    // Startup banner
    info!("========================================");
    info!("  Border Registry v{}", env!("CARGO_PKG_VERSION"));
    info!("========================================");
    match &args.config {
        Some(path) => info!("Config file   : {}", path.display()),
        None => info!("Config file   : (defaults)"),
    }
    info!("Listen        : {}", config.server.listen);
    info!("Database      : {}", config.store.path.display());
    info!("Busy timeout  : {}ms", config.store.busy_timeout_ms);
    info!("Listing window: {}", config.registry.last_n);
    info!("Log level     : {}", log_level);
    info!("========================================");

    if let Some(parent) = config.store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = Database::open(&config.store).context("failed to open database")?;
    db.initialize()
        .context("failed to initialize database schema")?;
    info!("Database initialized at {}", config.store.path.display());

    let listen_addr = config.server.listen.clone();
    let web_server = WebServer::new(config, db);
    web_server
        .start(&listen_addr, signals::wait_for_shutdown())
        .await
        .context("web server failed")?;

    info!("Border registry stopped.");
    Ok(())
}
