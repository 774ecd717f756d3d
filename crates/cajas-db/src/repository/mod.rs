//! # Repository Module
//!
//! Database repository implementations for Cajas POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  axum handler                                                          │
//! │       │                                                                 │
//! │       │  db.clients().search("ferre", 10)                              │
//! │       ▼                                                                 │
//! │  ClientRepository                                                      │
//! │  ├── list / search / by_zone / get_by_id                               │
//! │  ├── insert(&ClientInput)                                              │
//! │  ├── update(id, &ClientInput)                                          │
//! │  └── delete(id)                                                        │
//! │       │                                                                 │
//! │       │  parameterized SQL (query_as + bind)                           │
//! │       ▼                                                                 │
//! │  MySQL                                                                 │
//! │                                                                         │
//! │  Multi-statement work (sale registration, payment) runs inside one     │
//! │  `Transaction<MySql>` owned by the repository method.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`user::UserRepository`] - Accounts and login credentials
//! - [`zone::ZoneRepository`] - Sales zones
//! - [`client::ClientRepository`] - Client CRUD and search
//! - [`product::ProductRepository`] - Product CRUD
//! - [`sale::SaleRepository`] - Sale registration and status changes
//! - [`payment::PaymentRepository`] - Payments and comprobante issuing
//! - [`invoice::InvoiceRepository`] - Comprobantes and numbering series
//! - [`report::ReportRepository`] - Aggregated sales reports

pub mod client;
pub mod invoice;
pub mod payment;
pub mod product;
pub mod report;
pub mod sale;
pub mod user;
pub mod zone;

use sqlx::{MySql, MySqlPool, Transaction};
use tracing::warn;

use crate::error::{DbError, DbResult};

/// Opens a transaction on the pool.
pub(crate) async fn begin(pool: &MySqlPool) -> DbResult<Transaction<'static, MySql>> {
    pool.begin()
        .await
        .map_err(|e| DbError::TransactionFailed(e.to_string()))
}

/// Commits when `result` is `Ok`, rolls back otherwise.
///
/// A failed rollback is only logged; the original error is returned.
pub(crate) async fn settle<T>(tx: Transaction<'static, MySql>, result: DbResult<T>, operation: &str) -> DbResult<T> {
    match result {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(operation = operation, error = %rollback_err, "Rollback failed");
            }
            warn!(operation = operation, error = %err, "Transaction rolled back");
            Err(err)
        }
    }
}
