//! # SUNAT Comprobante Rules
//!
//! Everything about comprobantes that SUNAT defines and that does not need
//! I/O: buyer requirements, the QR text printed on the representation,
//! and the digest that ties the QR to the invoice content.
//!
//! ## QR Payload
//! ```text
//! RUC|TIPO|SERIE|NUMERO|IGV|TOTAL|FECHA|TIPO_DOC_ADQ|NUM_DOC_ADQ|HASH
//!
//! 20123456789|01|F001|00000042|18.00|118.00|2025-03-14|6|20600000001|q1w2..=
//! │           │  │    │        │     │      │          │ │           └ base64 SHA-256
//! │           │  │    │        │     │      │          │ └ buyer document
//! │           │  │    │        │     │      │          └ catalog 06 code
//! │           │  │    │        │     │      └ issue date (Lima time)
//! │           │  │    │        │     └ total, 2 decimals
//! │           │  │    │        └ IGV, 2 decimals
//! │           │  │    └ correlativo, 8 digits
//! │           │  └ serie
//! │           └ catalog 01 code (01 factura, 03 boleta)
//! └ issuer RUC
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, NaiveDate, Utc};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::calendar::lima_date;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::sale::{PricedLine, SaleTotals};
use crate::types::{DocumentType, IdentityDocument, Invoice};
use crate::validation::is_valid_ruc;

// =============================================================================
// Buyer rules
// =============================================================================

/// Checks that the buyer may receive this kind of comprobante.
///
/// A factura requires a buyer identified by RUC; a boleta accepts anyone.
pub fn check_buyer(tipo: DocumentType, kind: IdentityDocument, documento: &str) -> CoreResult<()> {
    if tipo == DocumentType::Factura && (kind != IdentityDocument::Ruc || !is_valid_ruc(documento)) {
        return Err(CoreError::FacturaRequiresRuc {
            documento: documento.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Invoice draft + digest
// =============================================================================

/// The content of a comprobante before it is stored.
#[derive(Debug, Clone)]
pub struct InvoiceDraft<'a> {
    pub ruc_emisor: &'a str,
    pub tipo: DocumentType,
    pub serie: &'a str,
    pub numero: i64,
    pub fecha_emision: DateTime<Utc>,
    pub totals: SaleTotals,
    pub buyer_kind: IdentityDocument,
    pub buyer_document: &'a str,
    pub buyer_name: &'a str,
    pub lines: &'a [PricedLine],
}

impl InvoiceDraft<'_> {
    /// Canonical text the digest is computed over: one header row, then one
    /// row per line, `|`-separated and newline-terminated.
    pub fn canonical_text(&self) -> String {
        let mut text = format!(
            "{}|{}|{}|{:08}|{}|{}|{}|{}|{}|{}|{}\n",
            self.ruc_emisor,
            self.tipo.sunat_code(),
            self.serie,
            self.numero,
            lima_date(self.fecha_emision).format("%Y-%m-%d"),
            self.buyer_kind.sunat_code(),
            self.buyer_document,
            self.buyer_name,
            self.totals.subtotal.to_decimal_string(),
            self.totals.igv.to_decimal_string(),
            self.totals.total.to_decimal_string(),
        );

        for (i, line) in self.lines.iter().enumerate() {
            text.push_str(&format!(
                "{}|{}|{}|{}|{}|{}\n",
                i + 1,
                line.descripcion,
                line.unidad,
                line.cantidad,
                line.unit_price.to_decimal_string(),
                line.subtotal.to_decimal_string(),
            ));
        }

        text
    }

    /// Base64 SHA-256 of [`InvoiceDraft::canonical_text`].
    pub fn digest(&self) -> String {
        digest_text(&self.canonical_text())
    }
}

fn digest_text(text: &str) -> String {
    let hash = Sha256::digest(text.as_bytes());
    STANDARD.encode(hash)
}

// =============================================================================
// QR payload
// =============================================================================

/// Fields of the QR printed on the comprobante.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrPayload {
    pub ruc_emisor: String,
    pub tipo: DocumentType,
    pub serie: String,
    pub numero: i64,
    pub igv: Money,
    pub total: Money,
    pub fecha: NaiveDate,
    pub buyer_kind: IdentityDocument,
    pub buyer_document: String,
    pub hash: String,
}

impl QrPayload {
    /// Builds the payload of a stored comprobante from its own snapshot.
    pub fn for_invoice(invoice: &Invoice) -> Self {
        QrPayload {
            ruc_emisor: invoice.emisor_ruc.clone(),
            tipo: invoice.tipo,
            serie: invoice.serie.clone(),
            numero: invoice.numero,
            igv: Money::from_cents(invoice.igv_cents),
            total: Money::from_cents(invoice.total_cents),
            fecha: lima_date(invoice.fecha_emision),
            buyer_kind: invoice.cliente_tipo_documento,
            buyer_document: invoice.cliente_documento.clone(),
            hash: invoice.hash.clone(),
        }
    }
}

impl fmt::Display for QrPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{:08}|{}|{}|{}|{}|{}|{}",
            self.ruc_emisor,
            self.tipo.sunat_code(),
            self.serie,
            self.numero,
            self.igv.to_decimal_string(),
            self.total.to_decimal_string(),
            self.fecha.format("%Y-%m-%d"),
            self.buyer_kind.sunat_code(),
            self.buyer_document,
            self.hash,
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn lines() -> Vec<PricedLine> {
        vec![PricedLine {
            product_id: 1,
            descripcion: "Pintura látex 1gl".to_string(),
            unidad: "NIU".to_string(),
            cantidad: 2,
            unit_price: Money::from_cents(5900),
            subtotal: Money::from_cents(11800),
        }]
    }

    fn draft(lines: &[PricedLine]) -> InvoiceDraft<'_> {
        InvoiceDraft {
            ruc_emisor: "20123456789",
            tipo: DocumentType::Factura,
            serie: "F001",
            numero: 42,
            // 03:00 UTC is still the previous day in Lima
            fecha_emision: Utc.with_ymd_and_hms(2025, 3, 15, 3, 0, 0).unwrap(),
            totals: SaleTotals::from_lines(lines),
            buyer_kind: IdentityDocument::Ruc,
            buyer_document: "20600000001",
            buyer_name: "Constructora Andina SAC",
            lines,
        }
    }

    #[test]
    fn test_check_buyer() {
        assert!(check_buyer(DocumentType::Boleta, IdentityDocument::Dni, "12345678").is_ok());
        assert!(check_buyer(DocumentType::Factura, IdentityDocument::Ruc, "20600000001").is_ok());
        assert!(matches!(
            check_buyer(DocumentType::Factura, IdentityDocument::Dni, "12345678"),
            Err(CoreError::FacturaRequiresRuc { .. })
        ));
        assert!(check_buyer(DocumentType::Factura, IdentityDocument::Ruc, "123").is_err());
    }

    #[test]
    fn test_canonical_text() {
        let lines = lines();
        let text = draft(&lines).canonical_text();
        assert_eq!(
            text,
            "20123456789|01|F001|00000042|2025-03-14|6|20600000001|Constructora Andina SAC|100.00|18.00|118.00\n\
             1|Pintura látex 1gl|NIU|2|59.00|118.00\n"
        );
    }

    #[test]
    fn test_digest_is_stable_and_content_bound() {
        let lines = lines();
        let a = draft(&lines).digest();
        let b = draft(&lines).digest();
        assert_eq!(a, b);
        // SHA-256 → 32 bytes → 44 base64 chars
        assert_eq!(a.len(), 44);

        let mut other = draft(&lines);
        other.numero = 43;
        assert_ne!(a, other.digest());
    }

    #[test]
    fn test_qr_payload_format() {
        let payload = QrPayload {
            ruc_emisor: "20123456789".to_string(),
            tipo: DocumentType::Boleta,
            serie: "B001".to_string(),
            numero: 7,
            igv: Money::from_cents(153),
            total: Money::from_cents(1000),
            fecha: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            buyer_kind: IdentityDocument::Dni,
            buyer_document: "12345678".to_string(),
            hash: "abc=".to_string(),
        };
        assert_eq!(
            payload.to_string(),
            "20123456789|03|B001|00000007|1.53|10.00|2025-01-02|1|12345678|abc="
        );
        assert_eq!(payload.to_string().split('|').count(), 10);
    }

    #[test]
    fn test_qr_payload_for_invoice() {
        let invoice = Invoice {
            id: 3,
            sale_id: 9,
            payment_id: 4,
            emisor_ruc: "20123456789".to_string(),
            tipo: DocumentType::Factura,
            serie: "F001".to_string(),
            numero: 12,
            fecha_emision: Utc.with_ymd_and_hms(2025, 6, 1, 15, 30, 0).unwrap(),
            op_gravada_cents: 10000,
            igv_cents: 1800,
            total_cents: 11800,
            cliente_tipo_documento: IdentityDocument::Ruc,
            cliente_documento: "20600000001".to_string(),
            cliente_nombre: "Constructora Andina SAC".to_string(),
            cliente_direccion: "Jr. Lampa 100".to_string(),
            hash: "h=".to_string(),
        };
        let payload = QrPayload::for_invoice(&invoice);
        assert_eq!(
            payload.to_string(),
            "20123456789|01|F001|00000012|18.00|118.00|2025-06-01|6|20600000001|h="
        );
    }
}
