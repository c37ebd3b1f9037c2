//! Tally Gateway - HTTP API for the counter service
//!
//! This binary exposes the hit / bulk-counts / top / reset operations
//! over HTTP. Destructive admin operations are gated by a shared secret.

mod admin;
mod api;

use anyhow::Result;
use api::AppState;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tally_common::config::LimitsConfig;
use tally_store::CounterStore;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "tally-gateway")]
#[command(about = "Tally counting and ranking service")]
#[command(version)]
struct Args {
    /// Listen address for the HTTP API
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    listen: String,

    /// Path to the redb database file
    #[arg(long, default_value = "/var/lib/tally/tally.redb")]
    db_path: PathBuf,

    /// Shared secret for admin operations (reset). When unset, every
    /// admin request is denied.
    #[arg(long, env = "TALLY_ADMIN_TOKEN")]
    admin_token: Option<String>,

    /// Maximum entries retained per metric's ranked view
    #[arg(long, default_value_t = 500)]
    top_cap: usize,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tally Gateway");
    info!("Database: {}", args.db_path.display());
    if args.admin_token.is_some() {
        info!("Admin operations are ENABLED (shared secret configured)");
    } else {
        info!("Admin operations are DISABLED (no shared secret configured)");
    }

    let limits = LimitsConfig {
        top_cap: args.top_cap,
        ..LimitsConfig::default()
    };
    let store = CounterStore::open(&args.db_path, limits.clone())
        .map_err(|e| anyhow::anyhow!("Failed to open counter store: {e}"))?;

    let state = Arc::new(AppState {
        store,
        admin_token: args.admin_token,
        limits,
    });

    // Counter bodies are tiny; 1 MB covers the largest bulk request
    let body_limit = DefaultBodyLimit::max(1024 * 1024);

    let app = Router::new()
        .route("/health", get(api::health_check))
        .route("/api/hit", post(api::hit))
        .route("/api/counts", post(api::bulk_counts))
        .route("/api/top", get(api::top_page))
        .route("/api/reset", post(api::reset))
        .layer(body_limit)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = args
        .listen
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address {}: {}", args.listen, e))?;

    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down...");
        })
        .await?;

    info!("Gateway shut down gracefully");

    Ok(())
}
