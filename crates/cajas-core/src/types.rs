//! # Domain Types
//!
//! Core domain types used throughout Cajas POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Client      │   │      Sale       │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  tipo_documento │   │  numero_venta   │   │  sale_id (FK)   │       │
//! │  │  documento      │   │  estado         │   │  comprobante    │       │
//! │  │  zone_id        │   │  total_cents    │   │  metodo_pago    │       │
//! │  └─────────────────┘   └────────┬────────┘   └────────┬────────┘       │
//! │                                 │                     │                 │
//! │                        ┌────────▼────────┐   ┌────────▼────────┐       │
//! │                        │    SaleLine     │   │    Invoice      │       │
//! │                        │  (snapshot)     │   │  serie-numero   │       │
//! │                        └─────────────────┘   │  + InvoiceLine  │       │
//! │                                              └─────────────────┘       │
//! │                                                                         │
//! │  Enums stored as VARCHAR: Role, SaleStatus, DocumentType,               │
//! │  PaymentMethod, IdentityDocument                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Values
//! Enum values travel in Spanish (`pendiente`, `boleta`, `efectivo`) because
//! they are shared with the web frontend and stored verbatim in MySQL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, ValidationError};
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so IGV (18%) is 1800 bps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a whole percentage label, e.g. `18`.
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

/// Impuesto General a las Ventas.
pub const IGV_RATE: TaxRate = TaxRate::from_bps(1800);

// =============================================================================
// String-backed enums
// =============================================================================

/// Implements `as_str`, `Display`, `FromStr` and `TryFrom<String>` for a
/// unit enum stored as text.
macro_rules! text_enum {
    ($name:ident, $field:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// All variants, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The value stored in the database and sent over the wire.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(ValidationError::NotAllowed {
                        field: $field.to_string(),
                        allowed: $name::ALL.iter().map(|v| v.as_str().to_string()).collect(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

// =============================================================================
// Role
// =============================================================================

/// User role. Every protected endpoint lists the roles it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access, user management.
    Admin,
    /// Registers sales in the field.
    Vendedor,
    /// Collects payments and issues comprobantes.
    Caja,
}

text_enum!(Role, "rol", {
    Admin => "admin",
    Vendedor => "vendedor",
    Caja => "caja",
});

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
///
/// ## Lifecycle
/// ```text
///                 pay / approve
///   ┌───────────┐ ─────────────► ┌──────────┐
///   │ pendiente │                │ aprobado │
///   └─────┬─────┘                └────┬─────┘
///         │ cancel                    │ cancel (restock)
///         ▼                           ▼
///   ┌─────────────────────────────────────────┐
///   │                cancelado                │  (terminal)
///   └─────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Pendiente,
    Aprobado,
    Cancelado,
}

text_enum!(SaleStatus, "estado", {
    Pendiente => "pendiente",
    Aprobado => "aprobado",
    Cancelado => "cancelado",
});

impl SaleStatus {
    /// Validates a status change and returns the target status.
    pub fn transition_to(self, target: SaleStatus) -> Result<SaleStatus, CoreError> {
        use SaleStatus::*;

        match (self, target) {
            (Pendiente, Aprobado) | (Pendiente, Cancelado) | (Aprobado, Cancelado) => Ok(target),
            _ => Err(CoreError::InvalidTransition {
                from: self.as_str().to_string(),
                to: target.as_str().to_string(),
            }),
        }
    }

    /// Whether moving to `target` must put the sold units back in stock.
    ///
    /// Stock leaves the shelf when the sale is registered, so any
    /// cancellation returns it.
    pub fn restocks_on(self, target: SaleStatus) -> bool {
        target == SaleStatus::Cancelado && self != SaleStatus::Cancelado
    }
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Pendiente
    }
}

// =============================================================================
// Comprobante type
// =============================================================================

/// Kind of comprobante issued for a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Consumer receipt.
    Boleta,
    /// Tax invoice; buyer must have a RUC.
    Factura,
}

text_enum!(DocumentType, "tipo_comprobante", {
    Boleta => "boleta",
    Factura => "factura",
});

impl DocumentType {
    /// SUNAT catalog 01 code.
    pub const fn sunat_code(&self) -> &'static str {
        match self {
            DocumentType::Factura => "01",
            DocumentType::Boleta => "03",
        }
    }

    /// Inverse of [`DocumentType::sunat_code`].
    pub fn from_sunat_code(code: &str) -> Option<Self> {
        match code {
            "01" => Some(DocumentType::Factura),
            "03" => Some(DocumentType::Boleta),
            _ => None,
        }
    }

    /// Title printed on the PDF.
    pub const fn title(&self) -> &'static str {
        match self {
            DocumentType::Boleta => "BOLETA DE VENTA ELECTRÓNICA",
            DocumentType::Factura => "FACTURA ELECTRÓNICA",
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Efectivo,
    Tarjeta,
    Yape,
    Plin,
    Transferencia,
}

text_enum!(PaymentMethod, "metodo_pago", {
    Efectivo => "efectivo",
    Tarjeta => "tarjeta",
    Yape => "yape",
    Plin => "plin",
    Transferencia => "transferencia",
});

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Efectivo
    }
}

// =============================================================================
// Identity Document
// =============================================================================

/// Buyer identity document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum IdentityDocument {
    Dni,
    Ruc,
    /// Carné de extranjería.
    Ce,
    Pasaporte,
    Otro,
}

text_enum!(IdentityDocument, "tipo_documento", {
    Dni => "dni",
    Ruc => "ruc",
    Ce => "ce",
    Pasaporte => "pasaporte",
    Otro => "otro",
});

impl IdentityDocument {
    /// SUNAT catalog 06 code, used as `TIPO_DOC_ADQ` in the QR payload.
    pub const fn sunat_code(&self) -> &'static str {
        match self {
            IdentityDocument::Otro => "0",
            IdentityDocument::Dni => "1",
            IdentityDocument::Ce => "4",
            IdentityDocument::Ruc => "6",
            IdentityDocument::Pasaporte => "7",
        }
    }
}

// =============================================================================
// Entities
// =============================================================================

/// A system user. The password hash never leaves the database layer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub nombre: String,
    pub correo: String,
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "String"))]
    pub rol: Role,
    pub activo: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Sales zone used to route sellers.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Zone {
    pub id: i64,
    pub nombre: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Client {
    pub id: i64,
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "String"))]
    pub tipo_documento: IdentityDocument,
    pub documento: String,
    pub nombre: String,
    pub direccion: String,
    pub telefono: Option<String>,
    pub correo: Option<String>,
    pub latitud: Option<f64>,
    pub longitud: Option<f64>,
    /// Star rating (0-5).
    pub nestrella: i64,
    /// Rating label shown next to the stars.
    pub cestrella: String,
    pub zone_id: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A product available for sale. Prices include IGV.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub categoria: Option<String>,
    /// Unit price in céntimos, IGV included.
    pub price_cents: i64,
    pub stock: i64,
    /// SUNAT unit code (`NIU` = unit, `KGM` = kilogram, ...).
    pub unidad_medida: String,
    pub activo: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// Sale header.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: i64,
    pub numero_venta: String,
    pub user_id: i64,
    pub client_id: i64,
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "String"))]
    pub estado: SaleStatus,
    /// Taxable base (op. gravada).
    pub subtotal_cents: i64,
    pub igv_cents: i64,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub fecha: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleLine {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    /// Product name at time of sale (frozen).
    pub descripcion: String,
    /// Unit code at time of sale (frozen).
    pub unidad: String,
    pub cantidad: i64,
    pub unit_price_cents: i64,
    /// `cantidad × unit_price_cents`, IGV included.
    pub subtotal_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: i64,
    pub sale_id: i64,
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "String"))]
    pub tipo_comprobante: DocumentType,
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "String"))]
    pub metodo_pago: PaymentMethod,
    pub total_cents: i64,
    pub igv_cents: i64,
    #[ts(as = "String")]
    pub pagado_en: DateTime<Utc>,
}

/// Numbering series for comprobantes (`B001`, `F001`).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DocumentSeries {
    pub id: i64,
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "String"))]
    pub tipo: DocumentType,
    pub serie: String,
    /// Last number issued; the next comprobante gets `ultimo_numero + 1`.
    pub ultimo_numero: i64,
    pub activo: bool,
}

/// Comprobante header. Buyer data is a snapshot taken at payment time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Invoice {
    pub id: i64,
    pub sale_id: i64,
    pub payment_id: i64,
    /// Store RUC at issue time; the digest and the QR are bound to it.
    pub emisor_ruc: String,
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "String"))]
    pub tipo: DocumentType,
    pub serie: String,
    pub numero: i64,
    #[ts(as = "String")]
    pub fecha_emision: DateTime<Utc>,
    pub op_gravada_cents: i64,
    pub igv_cents: i64,
    pub total_cents: i64,
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "String"))]
    pub cliente_tipo_documento: IdentityDocument,
    pub cliente_documento: String,
    pub cliente_nombre: String,
    pub cliente_direccion: String,
    /// Base64 SHA-256 digest carried in the QR payload.
    pub hash: String,
}

impl Invoice {
    /// `F001-00000042`
    pub fn full_number(&self) -> String {
        format!("{}-{:08}", self.serie, self.numero)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InvoiceLine {
    pub id: i64,
    pub invoice_id: i64,
    pub item: i64,
    pub descripcion: String,
    pub unidad: String,
    pub cantidad: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_igv_rate() {
        assert_eq!(IGV_RATE.bps(), 1800);
        assert!((IGV_RATE.percentage() - 18.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_enum_text_round_trip() {
        for status in SaleStatus::ALL {
            assert_eq!(status.as_str().parse::<SaleStatus>().unwrap(), *status);
        }
        assert_eq!("Aprobado".parse::<SaleStatus>().unwrap(), SaleStatus::Aprobado);
        assert_eq!(" FACTURA ".parse::<DocumentType>().unwrap(), DocumentType::Factura);
    }

    #[test]
    fn test_enum_rejects_unknown_value() {
        let err = "entregado".parse::<SaleStatus>().unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"estado must be one of: ["pendiente", "aprobado", "cancelado"]"#
        );
    }

    #[test]
    fn test_serde_matches_stored_text() {
        assert_eq!(serde_json::to_string(&PaymentMethod::Yape).unwrap(), r#""yape""#);
        assert_eq!(serde_json::to_string(&IdentityDocument::Pasaporte).unwrap(), r#""pasaporte""#);
        assert_eq!(serde_json::to_string(&Role::Vendedor).unwrap(), r#""vendedor""#);
    }

    #[test]
    fn test_sale_status_transitions() {
        use SaleStatus::*;

        assert_eq!(Pendiente.transition_to(Aprobado).unwrap(), Aprobado);
        assert_eq!(Pendiente.transition_to(Cancelado).unwrap(), Cancelado);
        assert_eq!(Aprobado.transition_to(Cancelado).unwrap(), Cancelado);

        assert!(Aprobado.transition_to(Pendiente).is_err());
        assert!(Aprobado.transition_to(Aprobado).is_err());
        assert!(Cancelado.transition_to(Aprobado).is_err());
        assert!(Cancelado.transition_to(Cancelado).is_err());
    }

    #[test]
    fn test_restock_only_on_cancel() {
        use SaleStatus::*;

        assert!(Pendiente.restocks_on(Cancelado));
        assert!(Aprobado.restocks_on(Cancelado));
        assert!(!Pendiente.restocks_on(Aprobado));
    }

    #[test]
    fn test_sunat_codes() {
        assert_eq!(DocumentType::Factura.sunat_code(), "01");
        assert_eq!(DocumentType::Boleta.sunat_code(), "03");
        assert_eq!(DocumentType::from_sunat_code("03"), Some(DocumentType::Boleta));
        assert_eq!(DocumentType::from_sunat_code("07"), None);
        assert_eq!(IdentityDocument::Ruc.sunat_code(), "6");
        assert_eq!(IdentityDocument::Dni.sunat_code(), "1");
    }

    #[test]
    fn test_invoice_full_number() {
        let invoice = Invoice {
            id: 1,
            sale_id: 1,
            payment_id: 1,
            emisor_ruc: "20123456789".to_string(),
            tipo: DocumentType::Boleta,
            serie: "B001".to_string(),
            numero: 42,
            fecha_emision: Utc::now(),
            op_gravada_cents: 0,
            igv_cents: 0,
            total_cents: 0,
            cliente_tipo_documento: IdentityDocument::Dni,
            cliente_documento: "12345678".to_string(),
            cliente_nombre: "Ana".to_string(),
            cliente_direccion: "-".to_string(),
            hash: String::new(),
        };
        assert_eq!(invoice.full_number(), "B001-00000042");
    }
}
