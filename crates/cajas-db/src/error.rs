//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  MySQL Error (sqlx::Error)          CoreError (stock, status, RUC)      │
//! │       │                                  │                              │
//! │       ▼                                  ▼                              │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (apps/api) ← { code, message } + HTTP status                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Domain errors raised inside a transaction travel as [`DbError::Domain`]
//! so the caller sees *why* the transaction was rolled back.

use cajas_core::CoreError;
use sqlx::error::ErrorKind;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_optional` returns no rows for an ID lookup
    /// - UPDATE/DELETE target does not exist
    /// - A sale references a product that does not exist
    #[error("{entity} no encontrado: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate user email
    /// - Duplicate client document
    /// - Sale number collision (two sales in the same millisecond)
    #[error("Ya existe un registro con {field} '{value}'")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Deleting a client that still has sales
    /// - Referencing a zone that does not exist
    #[error("Violación de integridad referencial: {message}")]
    ForeignKeyViolation { message: String },

    /// A business rule rejected the operation; the transaction was rolled back.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed to begin or commit.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound              → DbError::NotFound
/// Database (ER_DUP_ENTRY, 1062)         → DbError::UniqueViolation
/// Database (ER_ROW_IS_REFERENCED, 1451,
///           ER_NO_REFERENCED_ROW, 1452) → DbError::ForeignKeyViolation
/// sqlx::Error::PoolTimedOut             → DbError::PoolExhausted
/// Other                                 → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Registro".to_string(),
                id: "desconocido".to_string(),
            },

            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::UniqueViolation => {
                    let (field, value) = parse_duplicate_entry(db_err.message());
                    DbError::UniqueViolation { field, value }
                }
                ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation {
                    message: db_err.message().to_string(),
                },
                _ => DbError::QueryFailed(db_err.message().to_string()),
            },

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::Io(e) => DbError::ConnectionFailed(e.to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Extracts `(field, value)` from a MySQL duplicate-entry message.
///
/// ```text
/// Duplicate entry 'ana@ferreteria.pe' for key 'users.uq_users_correo'
///                  └──── value ────┘           └ table ┘└── key ─────┘
///                                                       field = "correo"
/// ```
///
/// Keys follow the `uq_<table>_<field>` naming of the migrations. Unknown
/// shapes fall back to the raw key name.
pub(crate) fn parse_duplicate_entry(message: &str) -> (String, String) {
    let mut quoted = message.split('\'').skip(1).step_by(2);
    let value = quoted.next().unwrap_or_default().to_string();
    let key = quoted.next().unwrap_or_default();

    // MySQL 8 prefixes the table: `users.uq_users_correo`
    let (table, index) = match key.split_once('.') {
        Some((table, index)) => (table, index),
        None => ("", key),
    };

    let field = index
        .strip_prefix("uq_")
        .map(|rest| {
            rest.strip_prefix(table)
                .and_then(|r| r.strip_prefix('_'))
                .unwrap_or(rest)
        })
        .unwrap_or(index);

    let field = if field.is_empty() { "valor" } else { field };
    (field.to_string(), value)
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duplicate_entry_mysql8() {
        let (field, value) =
            parse_duplicate_entry("Duplicate entry 'ana@ferreteria.pe' for key 'users.uq_users_correo'");
        assert_eq!(field, "correo");
        assert_eq!(value, "ana@ferreteria.pe");
    }

    #[test]
    fn test_parse_duplicate_entry_without_table_prefix() {
        let (field, value) = parse_duplicate_entry("Duplicate entry '20600000001' for key 'uq_clients_documento'");
        // Without the table segment the table name stays in the field
        assert_eq!(field, "clients_documento");
        assert_eq!(value, "20600000001");
    }

    #[test]
    fn test_parse_duplicate_entry_composite_key() {
        let (field, value) =
            parse_duplicate_entry("Duplicate entry 'B001-7' for key 'invoices.uq_invoices_serie_numero'");
        assert_eq!(field, "serie_numero");
        assert_eq!(value, "B001-7");
    }

    #[test]
    fn test_parse_duplicate_entry_unknown_shape() {
        let (field, value) = parse_duplicate_entry("something else entirely");
        assert_eq!(field, "valor");
        assert_eq!(value, "");
    }

    #[test]
    fn test_domain_error_is_transparent() {
        let err = DbError::from(CoreError::EmptySale);
        assert_eq!(err.to_string(), CoreError::EmptySale.to_string());
    }
}
