//! # cajas-core: Pure Business Logic for Cajas POS
//!
//! This crate holds the rules of the point-of-sale backend as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cajas POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Web frontend (sellers, cashiers)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ REST /api/*                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  │    auth, handlers, PDF comprobantes, SMTP                       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cajas-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   sale    │  │   sunat   │  │   │
//! │  │   │  entities │  │   Money   │  │  pricing  │  │  QR, hash │  │   │
//! │  │   │  statuses │  │ IGV split │  │  totals   │  │  buyers   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    cajas-db (Database Layer)                    │   │
//! │  │              MySQL queries, migrations, repositories            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities and text-backed enums (SaleStatus, DocumentType, ...)
//! - [`money`] - Money in céntimos with the IGV-inclusive split
//! - [`sale`] - Line pricing, stock checks, sale totals
//! - [`sunat`] - Buyer rules, QR payload, invoice digest
//! - [`calendar`] - Lima business days and report ranges
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use cajas_core::money::Money;
//! use cajas_core::IGV_RATE;
//!
//! // Prices include IGV; split it out for the comprobante
//! let total = Money::from_cents(11800);
//! let (base, igv) = total.split_inclusive(IGV_RATE);
//! assert_eq!(base.cents(), 10000);
//! assert_eq!(igv.cents(), 1800);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calendar;
pub mod error;
pub mod money;
pub mod sale;
pub mod sunat;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines in a single sale.
pub const MAX_SALE_LINES: usize = 100;

/// Maximum quantity of a single line.
///
/// Hardware stores sell screws and nails by the unit, so this is higher
/// than a supermarket limit would be.
pub const MAX_ITEM_QUANTITY: i64 = 9999;

/// Highest unit or list price, in céntimos (S/ 1,000,000.00).
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// SUNAT unit code for "unit" (catalog 03).
pub const DEFAULT_UNIT: &str = "NIU";
