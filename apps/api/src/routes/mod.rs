//! # Routes
//!
//! HTTP handlers grouped by resource. Every router is a
//! `Router<AppState>`; the state is attached once in [`crate::build_router`].
//!
//! ```text
//! /health                      public
//! /api/login                   public
//! /api/                        any authenticated user
//! /api/users...                admin
//! /api/clientes...             admin, caja (search and zone: any role)
//! /api/zonas                   any role
//! /api/productos...            read: any role, write: admin
//! /api/ventas...               admin, vendedor (estado, comprobante: caja)
//! /api/pagos, /api/comprobantes, /api/reportes, /api/reporte   any role
//! ```
//!
//! Role checks are the first extractor of each handler, so a caller
//! without the role gets 403 before its body is parsed.

pub mod auth;
pub mod clients;
pub mod health;
pub mod invoices;
pub mod payments;
pub mod products;
pub mod reports;
pub mod sales;
pub mod users;
pub mod zones;

use axum::routing::get;
use axum::{Json, Router};

use crate::auth::AuthUser;
use crate::AppState;

/// All `/api` routes. Paths are spelled out in full so `/api/` itself is
/// routable.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/", get(whoami))
        .merge(auth::router())
        .merge(users::router())
        .merge(clients::router())
        .merge(zones::router())
        .merge(products::router())
        .merge(sales::router())
        .merge(payments::router())
        .merge(invoices::router())
        .merge(reports::router())
}

/// Echoes the authenticated caller.
async fn whoami(user: AuthUser) -> Json<AuthUser> {
    Json(user)
}
