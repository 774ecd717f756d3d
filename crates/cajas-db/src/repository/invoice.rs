//! # Invoice Repository
//!
//! Read side of comprobantes. Invoices are only ever written by
//! [`PaymentRepository::record`](super::payment::PaymentRepository::record).

use serde::Serialize;
use sqlx::MySqlPool;

use crate::error::DbResult;
use cajas_core::{DocumentSeries, Invoice, InvoiceLine};

const INVOICE_COLUMNS: &str = "id, sale_id, payment_id, emisor_ruc, tipo, serie, numero, fecha_emision, \
                               op_gravada_cents, igv_cents, total_cents, \
                               cliente_tipo_documento, cliente_documento, cliente_nombre, cliente_direccion, hash";

/// Comprobante header plus its lines.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub lines: Vec<InvoiceLine>,
}

/// Repository for comprobantes and their numbering series.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: MySqlPool,
}

impl InvoiceRepository {
    pub fn new(pool: MySqlPool) -> Self {
        InvoiceRepository { pool }
    }

    /// All numbering series with their last issued number.
    pub async fn list_series(&self) -> DbResult<Vec<DocumentSeries>> {
        let series = sqlx::query_as::<_, DocumentSeries>(
            "SELECT id, tipo, serie, ultimo_numero, activo FROM document_series ORDER BY tipo, serie",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(series)
    }

    /// Gets a comprobante with its lines.
    pub async fn get(&self, id: i64) -> DbResult<Option<InvoiceDetail>> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?");
        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match invoice {
            Some(invoice) => Ok(Some(self.with_lines(invoice).await?)),
            None => Ok(None),
        }
    }

    /// The comprobante issued for a sale, if it was paid.
    pub async fn get_by_sale(&self, sale_id: i64) -> DbResult<Option<InvoiceDetail>> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE sale_id = ?");
        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(sale_id)
            .fetch_optional(&self.pool)
            .await?;

        match invoice {
            Some(invoice) => Ok(Some(self.with_lines(invoice).await?)),
            None => Ok(None),
        }
    }

    async fn with_lines(&self, invoice: Invoice) -> DbResult<InvoiceDetail> {
        let lines = sqlx::query_as::<_, InvoiceLine>(
            r#"
            SELECT id, invoice_id, item, descripcion, unidad, cantidad, unit_price_cents, subtotal_cents
            FROM invoice_lines
            WHERE invoice_id = ?
            ORDER BY item
            "#,
        )
        .bind(invoice.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(InvoiceDetail { invoice, lines })
    }
}
