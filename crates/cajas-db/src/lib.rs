//! # cajas-db: Database Layer for Cajas POS
//!
//! This crate provides MySQL access for the Cajas POS backend using sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cajas POS Data Flow                              │
//! │                                                                         │
//! │  axum handler (POST /api/ventas/registro)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     cajas-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ SaleRepo      │    │              │  │   │
//! │  │   │ MySqlPool     │◄───│ PaymentRepo   │    │ 0001_init    │  │   │
//! │  │   │ UTC sessions  │    │ ReportRepo... │    │ 0002_series  │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │ pricing, transitions, QR hash │   │
//! │  │                                ▼                               │   │
//! │  │                           cajas-core                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     MySQL 8 (InnoDB)                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cajas_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new(std::env::var("DATABASE_URL")?)).await?;
//! let pending = db.sales().pending().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::client::{ClientInput, ClientRepository};
pub use repository::invoice::{InvoiceDetail, InvoiceRepository};
pub use repository::payment::{PaymentReceipt, PaymentRepository, PaymentSummary};
pub use repository::product::{ProductInput, ProductRepository};
pub use repository::report::{
    CategorySales, DailySales, MonthlySales, ReportRepository, SalesAverage, SalesSummary, TopProduct,
};
pub use repository::sale::{SaleDetail, SaleRepository, SaleSummary};
pub use repository::user::{NewUser, UserCredentials, UserRepository};
pub use repository::zone::ZoneRepository;
