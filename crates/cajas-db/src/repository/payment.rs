//! # Payment Repository
//!
//! Recording a payment is what turns a pending sale into an issued
//! comprobante.
//!
//! ## Payment Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/pagos { venta_id, tipo_comprobante, metodo_pago }            │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   ├── SELECT sale … FOR UPDATE          must be pendiente (else 409)    │
//! │   ├── load lines + client               factura needs a RUC (else 400)  │
//! │   ├── SELECT series … FOR UPDATE        B001 / F001, ultimo_numero + 1  │
//! │   ├── INSERT payments                                                   │
//! │   ├── INSERT invoices (+ digest hash)   buyer data snapshot             │
//! │   ├── INSERT invoice_lines              line snapshot                   │
//! │   └── UPDATE sales SET estado = 'aprobado'                              │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The series row lock serializes numbering: two cashiers issuing boletas at
//! the same time get consecutive numbers, never the same one.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{MySqlConnection, MySqlPool};
use tracing::{debug, info};

use super::invoice::InvoiceRepository;
use super::sale::{fetch_lines, lock_sale};
use super::{begin, settle};
use crate::error::{DbError, DbResult};
use crate::repository::invoice::InvoiceDetail;
use cajas_core::sale::{PricedLine, SaleTotals};
use cajas_core::sunat::{check_buyer, InvoiceDraft};
use cajas_core::{Client, CoreError, DocumentSeries, DocumentType, Payment, PaymentMethod, SaleStatus};

const PAYMENT_COLUMNS: &str = "id, sale_id, tipo_comprobante, metodo_pago, total_cents, igv_cents, pagado_en";

/// A payment with its sale, client, seller and comprobante number.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PaymentSummary {
    pub id: i64,
    pub sale_id: i64,
    pub numero_venta: String,
    pub cliente: String,
    pub vendedor: String,
    #[sqlx(try_from = "String")]
    pub tipo_comprobante: DocumentType,
    #[sqlx(try_from = "String")]
    pub metodo_pago: PaymentMethod,
    pub total_cents: i64,
    pub igv_cents: i64,
    pub pagado_en: DateTime<Utc>,
    pub invoice_id: Option<i64>,
    /// `B001-00000042`
    pub comprobante: Option<String>,
}

/// Result of [`PaymentRepository::record`].
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub comprobante: InvoiceDetail,
}

const SUMMARY_SELECT: &str = r#"
    SELECT
        p.id, p.sale_id, s.numero_venta, c.nombre AS cliente, u.nombre AS vendedor,
        p.tipo_comprobante, p.metodo_pago, p.total_cents, p.igv_cents, p.pagado_en,
        i.id AS invoice_id,
        CONCAT(i.serie, '-', LPAD(i.numero, 8, '0')) AS comprobante
    FROM payments p
    JOIN sales s ON s.id = p.sale_id
    JOIN clients c ON c.id = s.client_id
    JOIN users u ON u.id = s.user_id
    LEFT JOIN invoices i ON i.payment_id = p.id
"#;

/// Repository for payment database operations.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: MySqlPool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: MySqlPool) -> Self {
        PaymentRepository { pool }
    }

    /// Lists payments, newest first.
    pub async fn list(&self) -> DbResult<Vec<PaymentSummary>> {
        let sql = format!("{SUMMARY_SELECT} ORDER BY p.pagado_en DESC, p.id DESC");
        let payments = sqlx::query_as::<_, PaymentSummary>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(payments)
    }

    /// Gets one payment with its context.
    pub async fn get(&self, id: i64) -> DbResult<Option<PaymentSummary>> {
        let sql = format!("{SUMMARY_SELECT} WHERE p.id = ?");
        let payment = sqlx::query_as::<_, PaymentSummary>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(payment)
    }

    /// Records the payment of a pending sale and issues its comprobante.
    ///
    /// `issuer_ruc` is the store's RUC. It is stored on the comprobante and
    /// goes into its digest.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown sale, or no active series for `tipo`
    /// - `Domain(InvalidSaleStatus)` when the sale is not pending
    /// - `Domain(FacturaRequiresRuc)` for a factura to a buyer without RUC
    pub async fn record(
        &self,
        sale_id: i64,
        tipo: DocumentType,
        metodo: PaymentMethod,
        issuer_ruc: &str,
    ) -> DbResult<PaymentReceipt> {
        debug!(sale_id = sale_id, tipo = %tipo, metodo = %metodo, "Recording payment");

        let mut tx = begin(&self.pool).await?;
        let result = record_in_tx(&mut tx, sale_id, tipo, metodo, issuer_ruc).await;
        let (payment_id, invoice_id) = settle(tx, result, "record_payment").await?;

        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?");
        let payment = sqlx::query_as::<_, Payment>(&sql)
            .bind(payment_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Pago", payment_id))?;

        let comprobante = InvoiceRepository::new(self.pool.clone())
            .get(invoice_id)
            .await?
            .ok_or_else(|| DbError::not_found("Comprobante", invoice_id))?;

        info!(
            sale_id = sale_id,
            payment_id = payment_id,
            comprobante = %comprobante.invoice.full_number(),
            total_cents = payment.total_cents,
            "Payment recorded"
        );

        Ok(PaymentReceipt { payment, comprobante })
    }
}

/// Returns `(payment_id, invoice_id)`.
async fn record_in_tx(
    conn: &mut MySqlConnection,
    sale_id: i64,
    tipo: DocumentType,
    metodo: PaymentMethod,
    issuer_ruc: &str,
) -> DbResult<(i64, i64)> {
    let sale = lock_sale(conn, sale_id)
        .await?
        .ok_or_else(|| DbError::not_found("Venta", sale_id))?;

    if sale.estado != SaleStatus::Pendiente {
        return Err(CoreError::InvalidSaleStatus {
            sale: sale.numero_venta,
            status: sale.estado.to_string(),
            required: SaleStatus::Pendiente.to_string(),
        }
        .into());
    }

    let lines: Vec<PricedLine> = fetch_lines(conn, sale_id).await?.iter().map(PricedLine::from).collect();
    if lines.is_empty() {
        return Err(CoreError::EmptySale.into());
    }

    let client = sqlx::query_as::<_, Client>(
        r#"
        SELECT id, tipo_documento, documento, nombre, direccion, telefono, correo,
               latitud, longitud, nestrella, cestrella, zone_id, created_at
        FROM clients
        WHERE id = ?
        "#,
    )
    .bind(sale.client_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("Cliente", sale.client_id))?;

    check_buyer(tipo, client.tipo_documento, &client.documento)?;

    let totals = SaleTotals::from_lines(&lines);
    let (serie, numero) = next_number(conn, tipo).await?;
    let now = Utc::now();

    let payment = sqlx::query(
        r#"
        INSERT INTO payments (sale_id, tipo_comprobante, metodo_pago, total_cents, igv_cents, pagado_en)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(sale_id)
    .bind(tipo.as_str())
    .bind(metodo.as_str())
    .bind(totals.total.cents())
    .bind(totals.igv.cents())
    .bind(now)
    .execute(&mut *conn)
    .await?;
    let payment_id = payment.last_insert_id() as i64;

    let draft = InvoiceDraft {
        ruc_emisor: issuer_ruc,
        tipo,
        serie: &serie,
        numero,
        fecha_emision: now,
        totals,
        buyer_kind: client.tipo_documento,
        buyer_document: &client.documento,
        buyer_name: &client.nombre,
        lines: &lines,
    };

    let invoice = sqlx::query(
        r#"
        INSERT INTO invoices (
            sale_id, payment_id, emisor_ruc, tipo, serie, numero, fecha_emision,
            op_gravada_cents, igv_cents, total_cents,
            cliente_tipo_documento, cliente_documento, cliente_nombre, cliente_direccion,
            hash
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(sale_id)
    .bind(payment_id)
    .bind(issuer_ruc)
    .bind(tipo.as_str())
    .bind(&serie)
    .bind(numero)
    .bind(now)
    .bind(totals.subtotal.cents())
    .bind(totals.igv.cents())
    .bind(totals.total.cents())
    .bind(client.tipo_documento.as_str())
    .bind(&client.documento)
    .bind(&client.nombre)
    .bind(&client.direccion)
    .bind(draft.digest())
    .execute(&mut *conn)
    .await?;
    let invoice_id = invoice.last_insert_id() as i64;

    for (index, line) in lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO invoice_lines (invoice_id, item, descripcion, unidad, cantidad, unit_price_cents, subtotal_cents)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(invoice_id)
        .bind(index as i64 + 1)
        .bind(&line.descripcion)
        .bind(&line.unidad)
        .bind(line.cantidad)
        .bind(line.unit_price.cents())
        .bind(line.subtotal.cents())
        .execute(&mut *conn)
        .await?;
    }

    sqlx::query("UPDATE sales SET estado = ?, subtotal_cents = ?, igv_cents = ?, total_cents = ? WHERE id = ?")
        .bind(SaleStatus::Aprobado.as_str())
        .bind(totals.subtotal.cents())
        .bind(totals.igv.cents())
        .bind(totals.total.cents())
        .bind(sale_id)
        .execute(&mut *conn)
        .await?;

    Ok((payment_id, invoice_id))
}

/// Locks the active series for `tipo` and takes its next number.
async fn next_number(conn: &mut MySqlConnection, tipo: DocumentType) -> DbResult<(String, i64)> {
    let series = sqlx::query_as::<_, DocumentSeries>(
        r#"
        SELECT id, tipo, serie, ultimo_numero, activo
        FROM document_series
        WHERE tipo = ? AND activo = TRUE
        ORDER BY id
        LIMIT 1
        FOR UPDATE
        "#,
    )
    .bind(tipo.as_str())
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("Serie activa", tipo))?;

    let numero = series.ultimo_numero + 1;
    sqlx::query("UPDATE document_series SET ultimo_numero = ? WHERE id = ?")
        .bind(numero)
        .bind(series.id)
        .execute(&mut *conn)
        .await?;

    debug!(serie = %series.serie, numero = numero, "Comprobante number taken");
    Ok((series.serie, numero))
}
