//! # Cajas API
//!
//! REST server for the Cajas point of sale.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Cajas API                                     │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  auth / users  │  │  clientes      │  │  ventas                    ││
//! │  │                │  │  productos     │  │                            ││
//! │  │ • login (JWT)  │  │  zonas         │  │ • registro (transaction)   ││
//! │  │ • register     │  │ • CRUD, buscar │  │ • estado (restock)         ││
//! │  └────────────────┘  └────────────────┘  │ • enviar-comprobante       ││
//! │                                          └────────────────────────────┘│
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  pagos         │  │  comprobantes  │  │  reportes                  ││
//! │  │                │  │                │  │                            ││
//! │  │ • record +     │  │ • JSON         │  │ • summary, filters         ││
//! │  │   issue serie  │  │ • PDF + QR     │  │ • per day / month / avg    ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │                                                                   │  │
//! │  │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────┐│  │
//! │  │  │    MySQL     │  │     SMTP     │  │    JWT Auth              ││  │
//! │  │  │  (cajas-db)  │  │   (lettre)   │  │  Bearer + role policies  ││  │
//! │  │  └──────────────┘  └──────────────┘  └──────────────────────────┘│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (or `cajas.toml`):
//! - `PORT`, `BIND_ADDR` - listen address (default: 0.0.0.0:3000)
//! - `DATABASE_URL` - MySQL connection string
//! - `JWT_SECRET`, `JWT_EXPIRY_SECS` - token signing (default lifetime: 1 day)
//! - `ALLOWED_ORIGINS` - comma separated CORS origins
//! - `COMPANY_RUC`, `COMPANY_NAME`, `COMPANY_ADDRESS` - comprobante issuer
//! - `EMAIL_HOST`, `EMAIL_PORT`, `EMAIL_SECURE`, `EMAIL_USER`, `EMAIL_PASS`, `EMAIL_FROM`

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod mailer;
pub mod pdf;
pub mod routes;

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::auth::JwtManager;
use crate::mailer::{DisabledMailer, InvoiceMailer, SmtpMailer};

// Re-exports
pub use crate::config::ApiConfig;
pub use crate::error::{ApiError, ApiResult, ErrorCode};

use cajas_db::Database;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
    pub jwt: Arc<JwtManager>,
    pub mailer: Arc<dyn InvoiceMailer>,
}

impl AppState {
    /// Builds the state, choosing the SMTP mailer when it is configured.
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let mailer: Arc<dyn InvoiceMailer> = match config.smtp() {
            Some(settings) => match SmtpMailer::new(&settings) {
                Ok(mailer) => Arc::new(mailer),
                Err(e) => {
                    warn!(error = %e, "SMTP configuration rejected, mail disabled");
                    Arc::new(DisabledMailer)
                }
            },
            None => Arc::new(DisabledMailer),
        };

        Self::with_mailer(db, config, mailer)
    }

    pub fn with_mailer(db: Database, config: ApiConfig, mailer: Arc<dyn InvoiceMailer>) -> Self {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_expiry_secs);
        AppState {
            db,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            mailer,
        }
    }
}

/// Builds the application router with CORS and request tracing.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .merge(routes::health::router())
        .merge(routes::api_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .origins()
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}
