//! # msgboard
//!
//! Wires the SQLite store and Argon2 credentials into the board service
//! and serves the HTTP API until interrupted.

mod settings;
mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use mb_api::AppState;
use mb_auth_argon2::Argon2Credentials;
use mb_core::BoardService;
use mb_db_sqlite::SqliteBoardRepo;
use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tracing::info;

use crate::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load().context("failed to load configuration")?;
    telemetry::init(&settings.log)?;

    // 1. Storage
    let repo = SqliteBoardRepo::connect(
        settings.database.url.expose_secret(),
        settings.database.max_connections,
    )
    .await
    .context("failed to open board database")?;

    // 2. Credentials
    let credentials = Argon2Credentials::with_params(
        settings.auth.memory_kib,
        settings.auth.iterations,
        settings.auth.parallelism,
    )?;

    // 3. Service and routes
    let service = BoardService::new(Arc::new(repo.clone()), Arc::new(credentials))
        .with_limits(settings.board.limits());
    let app = mb_api::router(AppState::new(service));

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "message board listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    repo.close().await;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
