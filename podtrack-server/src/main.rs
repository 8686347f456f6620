//! podtrack-server - Podcast production tracking service
//!
//! HTTP backend that keeps podcasts, episodes, and production tasks in sync
//! with the studio's recording calendar. Two workflow triggers drive the
//! automation: a daily run for today's recordings and a lookahead calendar
//! sync.

use anyhow::Result;
use clap::Parser;
use podtrack_common::config::{CliOverrides, Settings};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use podtrack_server::services::calendar::HttpCalendarClient;
use podtrack_server::AppState;

#[derive(Parser, Debug)]
#[command(name = "podtrack-server", version, about = "Podcast production tracking service")]
struct Args {
    /// Path to TOML config file
    #[arg(long)]
    config: Option<String>,

    /// SQLite database URL
    #[arg(long)]
    database_url: Option<String>,

    /// HTTP bind address (host:port)
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let settings = Settings::resolve(CliOverrides {
        config_file: args.config,
        database_url: args.database_url,
        bind_addr: args.bind,
    })?;

    info!("Starting podtrack-server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Database: {}", settings.database_url);
    info!(
        "Calendar: {} ({})",
        if settings.calendar.enabled { "enabled" } else { "disabled" },
        settings.calendar.timezone
    );

    let db_pool = podtrack_server::db::init_database_pool(&settings.database_url).await?;
    info!("Database connection established");

    let calendar = Arc::new(HttpCalendarClient::new(settings.calendar.clone())?);
    let bind_addr = settings.bind_addr.clone();

    let state = AppState::new(db_pool, calendar, settings);
    let app = podtrack_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
