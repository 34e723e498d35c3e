//! # Inkwell Binary
//!
//! Assembles the engagement engine from settings and serves the HTTP API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use api_adapters::{build_router, AppState};
use auth_adapters::StaticRoleAuthorizer;
use configs::{LogFormat, LogSettings, Settings};
use domains::SystemClock;
use services::{DeliveryPolicy, Engine, EngineConfig, FeedLimits};
use storage_adapters::MemoryStore;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(log: &LogSettings) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&log.level)
            .with_context(|| format!("invalid log level {:?}", log.level))?,
    };
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    }
    .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

fn engine_config(settings: &Settings) -> anyhow::Result<EngineConfig> {
    let window_secs = i64::try_from(settings.engagement.view_window_secs)
        .context("engagement.view_window_secs is out of range")?;
    Ok(EngineConfig {
        view_window: chrono::Duration::seconds(window_secs),
        feed: FeedLimits {
            trending: settings.feed.trending_limit,
            recent: settings.feed.recent_limit,
            category_cap: settings.feed.category_cap,
            recommendations: settings.feed.recommendation_limit,
        },
        delivery: DeliveryPolicy {
            attempts: settings.notifications.delivery_attempts,
            backoff: Duration::from_millis(settings.notifications.retry_backoff_ms),
        },
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Settings: .env, config/*.toml, INKWELL__* environment
    let settings = Settings::load().context("failed to load settings")?;

    // 2. Logging
    init_tracing(&settings.log)?;

    // 3. Adapters
    let store = Arc::new(MemoryStore::new());
    let authorizer = StaticRoleAuthorizer::new(&settings.auth.admin_ids);
    info!(admins = authorizer.admin_count(), "role authorizer ready");

    // 4. Services
    let engine = Engine::new(
        store,
        Arc::new(authorizer),
        Arc::new(SystemClock),
        engine_config(&settings)?,
    );

    // 5. HTTP
    let app = build_router(AppState::new(engine));
    let addr = settings.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Inkwell listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}
