use std::net::SocketAddr;

use axum::Router;
use common::utils::logging::init_logging_from_env;
use configs::AppConfig;
use dotenvy::dotenv;
use tracing::info;

use crate::routes::{self, ServerState};
use service::runtime;

/// Build the router for a loaded configuration: backends, console state,
/// routes.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let backends = service::build_backends(cfg).await?;
    let state = ServerState {
        console: backends.console(cfg),
        secure_cookies: cfg.server.secure_cookies,
    };
    Ok(routes::build_router(
        state,
        &cfg.server.assets_dir,
        backends.local_storage_root.as_deref(),
    ))
}

/// Public entry: load configuration, build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = AppConfig::load_and_validate()?;
    runtime::ensure_env(&cfg).await?;
    let app = build_app(&cfg).await?;

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!(%addr, backend = ?cfg.backend.kind, "starting portfolio console");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
