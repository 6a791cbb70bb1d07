//! # llr-api — Binary Entry Point
//!
//! Loads `.env`, parses flags, connects and migrates the database when
//! configured, hydrates the in-memory stores, and serves until SIGINT or
//! SIGTERM. The database pool is closed after the server drains.

use anyhow::Context;
use clap::Parser;
use llr_api::auth::TokenSigner;
use llr_api::config::ServerConfig;
use llr_api::middleware::metrics::MetricsHandle;
use llr_api::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real environment variables still apply.
    dotenvy::dotenv().ok();
    let config = ServerConfig::parse();

    init_tracing(config.log_json);
    tracing::debug!(?config, "configuration loaded");

    let metrics = match MetricsHandle::install() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Prometheus recorder not installed; /metrics will return 503");
            None
        }
    };

    let signer = TokenSigner::from_hex_or_ephemeral(
        config.token_signing_key_hex.as_deref(),
        config.token_ttl_secs,
    )
    .context("loading token signing key")?;

    let db_pool = llr_api::db::init_pool(config.database_url.as_deref(), config.db_max_connections)
        .await
        .context("database initialization failed")?;

    let mut state = AppState::with_config(config.app_config(), signer, db_pool.clone());
    state.metrics = metrics;
    state
        .hydrate_from_db()
        .await
        .context("database hydration failed")?;

    let app = llr_api::app(state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, require_auth = config.require_auth, "LLR Desk API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = db_pool {
        pool.close().await;
        tracing::info!("database pool closed");
    }
    tracing::info!("shutdown complete");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
