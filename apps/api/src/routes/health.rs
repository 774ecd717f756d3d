//! Health check for monitoring and load balancers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::warn;

use cajas_db::migrations::migration_status;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` or `unavailable`
    pub status: &'static str,
    pub database: bool,
    /// `applied/total`, absent when the database is down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrations: Option<String>,
    pub mail: bool,
    pub version: &'static str,
}

/// 200 when the database answers, 503 otherwise.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;

    let migrations = if database {
        match migration_status(state.db.pool()).await {
            Ok((total, applied)) => Some(format!("{}/{}", applied, total)),
            Err(e) => {
                warn!(error = %e, "Could not read migration status");
                None
            }
        }
    } else {
        None
    };

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = HealthResponse {
        status: if database { "ok" } else { "unavailable" },
        database,
        migrations,
        mail: state.mailer.is_enabled(),
        version: env!("CARGO_PKG_VERSION"),
    };

    (status, Json(body))
}
