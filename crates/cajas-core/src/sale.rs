//! # Sale Pricing
//!
//! Pure rules applied while registering a sale: price resolution, stock
//! checks, line totals and the IGV split of the sale total.
//!
//! ## Registration Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/ventas/registro                                             │
//! │                                                                         │
//! │  LineRequest { product_id, cantidad, precio? }                          │
//! │       │                                                                 │
//! │       ▼  (cajas-db locks the product row: SELECT ... FOR UPDATE)       │
//! │  price_line(&product, &request) ← THIS MODULE                          │
//! │       │                                                                 │
//! │       ├── quantity out of range?  → ValidationError                    │
//! │       ├── product inactive?       → ProductInactive                    │
//! │       ├── stock < cantidad?       → InsufficientStock                  │
//! │       └── OK → PricedLine (snapshot + subtotal)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SaleTotals::from_lines(&lines)                                        │
//! │       total = Σ subtotal,  (op. gravada, IGV) = split_inclusive(total) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Product, SaleLine, TaxRate, IGV_RATE};
use crate::validation::{validate_price, validate_quantity};
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS, MAX_SALE_LINES};

// =============================================================================
// Inputs
// =============================================================================

/// One requested line of a new sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRequest {
    pub product_id: i64,
    pub quantity: i64,
    /// Negotiated unit price; the list price applies when absent.
    pub unit_price: Option<Money>,
}

// =============================================================================
// Outputs
// =============================================================================

/// A validated sale line ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricedLine {
    pub product_id: i64,
    pub descripcion: String,
    pub unidad: String,
    pub cantidad: i64,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// Stored lines are priced lines already; used when a pending sale is paid.
impl From<&SaleLine> for PricedLine {
    fn from(line: &SaleLine) -> Self {
        PricedLine {
            product_id: line.product_id,
            descripcion: line.descripcion.clone(),
            unidad: line.unidad.clone(),
            cantidad: line.cantidad,
            unit_price: Money::from_cents(line.unit_price_cents),
            subtotal: Money::from_cents(line.subtotal_cents),
        }
    }
}

/// Totals of a sale. Prices include IGV, so `subtotal + igv == total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleTotals {
    /// Taxable base (op. gravada).
    pub subtotal: Money,
    pub igv: Money,
    pub total: Money,
}

impl SaleTotals {
    /// Sums line subtotals and splits IGV out of the total.
    pub fn from_lines(lines: &[PricedLine]) -> Self {
        Self::from_total(lines.iter().map(|l| l.subtotal).sum(), IGV_RATE)
    }

    /// Splits an IGV-inclusive total.
    pub fn from_total(total: Money, rate: TaxRate) -> Self {
        let (subtotal, igv) = total.split_inclusive(rate);
        SaleTotals { subtotal, igv, total }
    }
}

// =============================================================================
// Rules
// =============================================================================

/// Checks the shape of a sale request before touching the database.
pub fn validate_lines(lines: &[LineRequest]) -> CoreResult<()> {
    if lines.is_empty() {
        return Err(CoreError::EmptySale);
    }

    if lines.len() > MAX_SALE_LINES {
        return Err(CoreError::TooManyLines { max: MAX_SALE_LINES });
    }

    for line in lines {
        validate_quantity(line.quantity)?;
        if let Some(price) = line.unit_price {
            validate_price("precio", price.cents())?;
        }
    }

    Ok(())
}

/// Resolves the price of one line against the (locked) product row.
///
/// `already_reserved` is the quantity of the same product taken by earlier
/// lines of this sale, so repeated lines cannot oversell.
pub fn price_line(product: &Product, request: &LineRequest, already_reserved: i64) -> CoreResult<PricedLine> {
    validate_quantity(request.quantity)?;

    if !product.activo {
        return Err(CoreError::ProductInactive(product.nombre.clone()));
    }

    let available = product.stock - already_reserved;
    if available < request.quantity {
        return Err(CoreError::InsufficientStock {
            product: product.nombre.clone(),
            available: available.max(0),
            requested: request.quantity,
        });
    }

    let unit_price = request.unit_price.unwrap_or_else(|| product.price());
    validate_price("precio", unit_price.cents())?;
    let subtotal = unit_price
        .multiply_quantity(request.quantity)
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "subtotal".to_string(),
            min: 0,
            max: i64::MAX,
        })?;

    Ok(PricedLine {
        product_id: product.id,
        descripcion: product.nombre.clone(),
        unidad: product.unidad_medida.clone(),
        cantidad: request.quantity,
        unit_price,
        subtotal,
    })
}

/// Sale number in the `V-<epoch millis>` format.
pub fn sale_number(now: DateTime<Utc>) -> String {
    format!("V-{}", now.timestamp_millis())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn product(stock: i64, price_cents: i64) -> Product {
        Product {
            id: 7,
            nombre: "Cemento Sol 42.5kg".to_string(),
            descripcion: None,
            categoria: Some("Construcción".to_string()),
            price_cents,
            stock,
            unidad_medida: "NIU".to_string(),
            activo: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request(quantity: i64, unit_price: Option<i64>) -> LineRequest {
        LineRequest {
            product_id: 7,
            quantity,
            unit_price: unit_price.map(Money::from_cents),
        }
    }

    #[test]
    fn test_price_line_uses_list_price() {
        let line = price_line(&product(50, 2890), &request(3, None), 0).unwrap();
        assert_eq!(line.unit_price.cents(), 2890);
        assert_eq!(line.subtotal.cents(), 8670);
        assert_eq!(line.descripcion, "Cemento Sol 42.5kg");
        assert_eq!(line.unidad, "NIU");
    }

    #[test]
    fn test_price_line_uses_override() {
        let line = price_line(&product(50, 2890), &request(2, Some(2700)), 0).unwrap();
        assert_eq!(line.unit_price.cents(), 2700);
        assert_eq!(line.subtotal.cents(), 5400);
    }

    #[test]
    fn test_insufficient_stock_is_rejected() {
        let err = price_line(&product(10, 2890), &request(12, None), 0).unwrap_err();
        match err {
            CoreError::InsufficientStock { available, requested, .. } => {
                assert_eq!(available, 10);
                assert_eq!(requested, 12);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_repeated_lines_share_stock() {
        let p = product(10, 100);
        assert!(price_line(&p, &request(6, None), 0).is_ok());
        let err = price_line(&p, &request(6, None), 6).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { available: 4, .. }));
    }

    #[test]
    fn test_inactive_product_is_rejected() {
        let mut p = product(10, 100);
        p.activo = false;
        assert!(matches!(
            price_line(&p, &request(1, None), 0),
            Err(CoreError::ProductInactive(_))
        ));
    }

    #[test]
    fn test_validate_lines() {
        assert!(matches!(validate_lines(&[]), Err(CoreError::EmptySale)));
        assert!(matches!(
            validate_lines(&[request(0, None)]),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            validate_lines(&[request(1, Some(-5))]),
            Err(CoreError::Validation(_))
        ));

        let many: Vec<_> = (0..=MAX_SALE_LINES).map(|_| request(1, None)).collect();
        assert!(matches!(validate_lines(&many), Err(CoreError::TooManyLines { .. })));

        assert!(validate_lines(&[request(2, None), request(1, Some(0))]).is_ok());
    }

    #[test]
    fn test_oversized_price_is_rejected() {
        let huge = Money::parse_decimal("90000000000000000").unwrap();
        let line = LineRequest {
            product_id: 7,
            quantity: MAX_ITEM_QUANTITY,
            unit_price: Some(huge),
        };

        assert!(matches!(
            validate_lines(std::slice::from_ref(&line)),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert!(matches!(
            price_line(&product(MAX_ITEM_QUANTITY, 100), &line, 0),
            Err(CoreError::Validation(_))
        ));

        // Same through a stored list price that predates the cap
        assert!(price_line(&product(MAX_ITEM_QUANTITY, huge.cents()), &request(MAX_ITEM_QUANTITY, None), 0).is_err());
    }

    #[test]
    fn test_largest_sale_fits() {
        let p = product(i64::MAX, MAX_PRICE_CENTS);
        let lines: Vec<_> = (0..MAX_SALE_LINES)
            .map(|_| price_line(&p, &request(MAX_ITEM_QUANTITY, None), 0).unwrap())
            .collect();
        let totals = SaleTotals::from_lines(&lines);

        let expected = MAX_PRICE_CENTS * MAX_ITEM_QUANTITY * MAX_SALE_LINES as i64;
        assert_eq!(totals.total.cents(), expected);
        assert_eq!(totals.subtotal + totals.igv, totals.total);
    }

    #[test]
    fn test_totals_split_igv() {
        let p = product(100, 5900);
        let lines = vec![
            price_line(&p, &request(1, None), 0).unwrap(),
            price_line(&p, &request(1, None), 1).unwrap(),
        ];
        let totals = SaleTotals::from_lines(&lines);
        assert_eq!(totals.total.cents(), 11800);
        assert_eq!(totals.subtotal.cents(), 10000);
        assert_eq!(totals.igv.cents(), 1800);
    }

    #[test]
    fn test_sale_number_format() {
        let now = Utc.timestamp_millis_opt(1_717_171_717_171).unwrap();
        assert_eq!(sale_number(now), "V-1717171717171");
    }
}
