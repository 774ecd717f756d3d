//! # Error Types
//!
//! Domain-specific error types for cajas-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cajas-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  cajas-db errors (separate crate)                                      │
//! │  └── DbError          - Database failures, carries CoreError raised    │
//! │                         inside transactions                            │
//! │                                                                         │
//! │  API errors (apps/api)                                                 │
//! │  └── ApiError         - { code, message } JSON + HTTP status           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → HTTP client  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Insufficient stock to register a sale line.
    ///
    /// ## User Workflow
    /// ```text
    /// Registrar venta (Cemento x 12)
    ///      │
    ///      ▼
    /// Check stock: available=10
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Cemento", available: 10, requested: 12 }
    ///      │
    ///      ▼
    /// 409: "Stock insuficiente para Cemento: disponible 10, solicitado 12"
    /// ```
    #[error("Stock insuficiente para {product}: disponible {available}, solicitado {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Product exists but is deactivated.
    #[error("Producto inactivo: {0}")]
    ProductInactive(String),

    /// A sale needs at least one line.
    #[error("La venta debe tener al menos un producto")]
    EmptySale,

    /// Sale has more lines than allowed.
    #[error("La venta no puede tener más de {max} productos")]
    TooManyLines { max: usize },

    /// Status change not allowed by the sale lifecycle.
    #[error("No se puede cambiar una venta de {from} a {to}")]
    InvalidTransition { from: String, to: String },

    /// Operation requires the sale to be in a specific status.
    ///
    /// ## When This Occurs
    /// - Paying a sale that is not pending
    /// - Emailing the comprobante of a sale that was never paid
    #[error("La venta {sale} está {status}, se requiere {required}")]
    InvalidSaleStatus {
        sale: String,
        status: String,
        required: String,
    },

    /// A factura was requested for a buyer without a valid RUC.
    #[error("Una factura requiere un cliente con RUC de 11 dígitos (documento: {documento})")]
    FacturaRequiresRuc { documento: String },

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any database access so bad requests fail fast.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
