//! # Validation Module
//!
//! Input validation for request bodies, run before any database access.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: serde (apps/api)                                             │
//! │  ├── Types, enums, decimal amounts                                     │
//! │  └── Malformed JSON → 400                                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Required fields, lengths, document shapes                         │
//! │  └── Quantity / price / stock bounds                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: MySQL                                                        │
//! │  ├── UNIQUE (correo, documento, numero_venta, serie+numero)            │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::IdentityDocument;
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS, MIN_PASSWORD_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required text field and returns it trimmed.
///
/// ## Example
/// ```rust
/// use cajas_core::validation::validate_required;
///
/// assert_eq!(validate_required("nombre", "  Ana ", 100).unwrap(), "Ana");
/// assert!(validate_required("nombre", "   ", 100).is_err());
/// ```
pub fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Validates an optional text field. Blank strings become `None`.
pub fn validate_optional(field: &str, value: Option<&str>, max: usize) -> ValidationResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => validate_required(field, v, max).map(Some),
    }
}

/// Validates an email address shape (`local@domain.tld`) and lowercases it.
pub fn validate_email(field: &str, email: &str) -> ValidationResult<String> {
    let email = validate_required(field, email, 150)?.to_lowercase();

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::invalid_format(field, "not a valid email address"));
    }

    Ok(email)
}

/// Validates a password for a new account.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::invalid_format(
            "password",
            format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
        ));
    }

    Ok(())
}

/// Validates an identity document number against its kind.
///
/// ## Rules
/// | Kind      | Shape                      |
/// |-----------|----------------------------|
/// | DNI       | exactly 8 digits           |
/// | RUC       | exactly 11 digits, 10/15/17/20 prefix |
/// | CE        | up to 12 alphanumerics     |
/// | Pasaporte | up to 12 alphanumerics     |
/// | Otro      | up to 15 characters        |
pub fn validate_document(kind: IdentityDocument, number: &str) -> ValidationResult<String> {
    let number = validate_required("documento", number, 15)?;
    let all_digits = number.chars().all(|c| c.is_ascii_digit());

    let ok = match kind {
        IdentityDocument::Dni => number.len() == 8 && all_digits,
        IdentityDocument::Ruc => is_valid_ruc(&number),
        IdentityDocument::Ce | IdentityDocument::Pasaporte => {
            number.len() <= 12 && number.chars().all(|c| c.is_ascii_alphanumeric())
        }
        IdentityDocument::Otro => true,
    };

    if !ok {
        return Err(ValidationError::invalid_format(
            "documento",
            format!("not a valid {} number", kind.as_str().to_uppercase()),
        ));
    }

    Ok(number)
}

/// RUC shape check: 11 digits with a taxpayer-type prefix.
pub fn is_valid_ruc(ruc: &str) -> bool {
    ruc.len() == 11
        && ruc.chars().all(|c| c.is_ascii_digit())
        && matches!(&ruc[..2], "10" | "15" | "17" | "20")
}

/// Validates a search query and returns it trimmed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    validate_required("q", query, 100)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity: `1..=MAX_ITEM_QUANTITY`.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "cantidad".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "cantidad".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in céntimos: `0..=MAX_PRICE_CENTS`. Zero is allowed
/// (promotional items).
pub fn validate_price(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    if cents > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "stock".to_string(),
        });
    }
    Ok(())
}

/// Validates a star rating (0-5).
pub fn validate_rating(stars: i64) -> ValidationResult<()> {
    if !(0..=5).contains(&stars) {
        return Err(ValidationError::OutOfRange {
            field: "nestrella".to_string(),
            min: 0,
            max: 5,
        });
    }
    Ok(())
}

/// Validates latitude/longitude when both are present.
pub fn validate_coordinates(lat: Option<f64>, lng: Option<f64>) -> ValidationResult<()> {
    if let Some(lat) = lat {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::OutOfRange {
                field: "latitud".to_string(),
                min: -90,
                max: 90,
            });
        }
    }
    if let Some(lng) = lng {
        if !(-180.0..=180.0).contains(&lng) {
            return Err(ValidationError::OutOfRange {
                field: "longitud".to_string(),
                min: -180,
                max: 180,
            });
        }
    }
    Ok(())
}

/// Validates a month/year pair used by report filters.
pub fn validate_month(month: u32, year: i32) -> ValidationResult<()> {
    if !(1..=12).contains(&month) {
        return Err(ValidationError::OutOfRange {
            field: "mes".to_string(),
            min: 1,
            max: 12,
        });
    }
    validate_year(year)
}

pub fn validate_year(year: i32) -> ValidationResult<()> {
    if !(2000..=2100).contains(&year) {
        return Err(ValidationError::OutOfRange {
            field: "anio".to_string(),
            min: 2000,
            max: 2100,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required() {
        assert_eq!(validate_required("nombre", " Ferretería ", 10).unwrap(), "Ferretería");
        assert!(matches!(
            validate_required("nombre", "", 10),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_required("nombre", "abcdefghijk", 10),
            Err(ValidationError::TooLong { max: 10, .. })
        ));
    }

    #[test]
    fn test_validate_optional() {
        assert_eq!(validate_optional("telefono", None, 20).unwrap(), None);
        assert_eq!(validate_optional("telefono", Some("  "), 20).unwrap(), None);
        assert_eq!(
            validate_optional("telefono", Some(" 987654321 "), 20).unwrap(),
            Some("987654321".to_string())
        );
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email("correo", "Ana@Example.PE").unwrap(), "ana@example.pe");
        assert!(validate_email("correo", "ana").is_err());
        assert!(validate_email("correo", "ana@local").is_err());
        assert!(validate_email("correo", "@example.com").is_err());
        assert!(validate_email("correo", "a b@example.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secreto1").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password("abc").is_err());
    }

    #[test]
    fn test_validate_document() {
        assert!(validate_document(IdentityDocument::Dni, "12345678").is_ok());
        assert!(validate_document(IdentityDocument::Dni, "1234567").is_err());
        assert!(validate_document(IdentityDocument::Dni, "1234567A").is_err());

        assert!(validate_document(IdentityDocument::Ruc, "20123456789").is_ok());
        assert!(validate_document(IdentityDocument::Ruc, "10456789012").is_ok());
        assert!(validate_document(IdentityDocument::Ruc, "30123456789").is_err());
        assert!(validate_document(IdentityDocument::Ruc, "2012345678").is_err());

        assert!(validate_document(IdentityDocument::Ce, "X12345").is_ok());
        assert!(validate_document(IdentityDocument::Pasaporte, "AB-123").is_err());
        assert!(validate_document(IdentityDocument::Otro, "S/N").is_ok());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-2).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_numeric_bounds() {
        assert!(validate_price("precio", 0).is_ok());
        assert!(validate_price("precio", -1).is_err());
        assert!(validate_price("precio", MAX_PRICE_CENTS).is_ok());
        assert!(matches!(
            validate_price("precio", MAX_PRICE_CENTS + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(-5).is_err());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(6).is_err());
        assert!(validate_coordinates(Some(-12.05), Some(-77.04)).is_ok());
        assert!(validate_coordinates(Some(91.0), None).is_err());
        assert!(validate_coordinates(None, Some(-181.0)).is_err());
    }

    #[test]
    fn test_validate_month() {
        assert!(validate_month(1, 2025).is_ok());
        assert!(validate_month(13, 2025).is_err());
        assert!(validate_month(0, 2025).is_err());
        assert!(validate_month(6, 1999).is_err());
    }
}
