//! ff-daemon entry point.
//!
//! Thin: load config and secrets, connect and migrate the database, build the
//! platform, wire middleware, serve.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use ff_config::{
    report_unused_keys, secrets::resolve_secrets, ConfigSurface, PlatformConfig, UnusedKeyPolicy,
};
use ff_daemon::{routes, state};
use ff_service::Platform;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let loaded = ff_config::load_from_env().context("load config")?;
    let report = report_unused_keys(
        ConfigSurface::Daemon,
        &loaded.config_json,
        UnusedKeyPolicy::Warn,
    )?;
    if !report.is_clean() {
        warn!(unused = ?report.unused_leaf_pointers, "config keys not consumed by the daemon");
    }
    let config = PlatformConfig::from_json(&loaded.config_json)?;
    let secrets = resolve_secrets(&loaded.config_json, ConfigSurface::Daemon)?;
    info!(config_hash = %loaded.config_hash, "config loaded");

    let pool = ff_db::connect_from_env().await?;
    ff_db::migrate(&pool).await?;

    let cors = cors_from(&config.server.cors_origins);
    let addr = bind_addr_from_env()
        .or_else(|| config.server.addr.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8080)));

    let platform = Platform::from_secrets(pool, config, &secrets)?;
    let shared = Arc::new(state::AppState::new(platform));

    state::spawn_heartbeat(shared.bus.clone(), Duration::from_secs(15));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    info!("ff-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var("FF_DAEMON_ADDR").ok()?.parse().ok()
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

/// CORS restricted to the configured browser origins.
fn cors_from(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(tower_http::cors::Any)
}
