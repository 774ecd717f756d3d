//! # Cajas API Server
//!
//! ```text
//! ApiConfig::load ──► Database::new (pool + migrations) ──► AppState
//!                                                              │
//!                              axum::serve ◄── build_router ◄──┘
//!                                   │
//!                       Ctrl+C / SIGTERM → graceful shutdown → pool close
//! ```

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cajas_api::{build_router, ApiConfig, AppState};
use cajas_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,cajas=debug,sqlx=warn")),
        )
        .with_target(true)
        .init();

    info!("Starting Cajas API server...");

    let config = ApiConfig::load().context("Invalid configuration")?;
    info!(
        addr = %config.bind_address(),
        db_url = %config.database_url.split('@').last().unwrap_or_default(),
        mail = config.smtp().is_some(),
        "Configuration loaded"
    );

    let db = Database::new(DbConfig::new(config.database_url.clone()).max_connections(config.db_max_connections))
        .await
        .context("Failed to connect to MySQL")?;
    info!("Connected to MySQL");

    let addr = config.bind_address();
    let state = AppState::new(db.clone(), config);
    let app = build_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
