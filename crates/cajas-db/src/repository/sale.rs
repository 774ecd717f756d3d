//! # Sale Repository
//!
//! Database operations for sales and sale lines.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. REGISTER (one transaction)                                         │
//! │     └── register() → Sale { estado: pendiente }                        │
//! │         ├── client must exist                                          │
//! │         ├── header inserted with zero totals                           │
//! │         ├── product rows locked once each, ascending id               │
//! │         ├── per line: price_line(), insert, stock -= qty              │
//! │         └── totals written back to the header                          │
//! │                                                                         │
//! │  2. PAY (PaymentRepository::record)                                    │
//! │     └── Sale { estado: aprobado } + comprobante                        │
//! │                                                                         │
//! │  3. (OPTIONAL) CANCEL                                                  │
//! │     └── update_status(cancelado) → stock restored from the lines       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any error inside a transaction rolls the whole operation back: a sale
//! that fails on its third line leaves no header, no lines and no stock
//! change behind.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{MySqlConnection, MySqlPool};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

use super::product::fetch_for_update;
use super::{begin, settle};
use crate::error::{DbError, DbResult};
use cajas_core::sale::{price_line, sale_number, validate_lines, LineRequest, PricedLine, SaleTotals};
use cajas_core::{Sale, SaleLine, SaleStatus};

pub(crate) const SUMMARY_SELECT: &str = r#"
    SELECT
        s.id, s.numero_venta, s.user_id, u.nombre AS vendedor,
        s.client_id, c.nombre AS cliente, c.documento AS cliente_documento,
        s.estado, s.subtotal_cents, s.igv_cents, s.total_cents, s.fecha
    FROM sales s
    JOIN clients c ON c.id = s.client_id
    JOIN users u ON u.id = s.user_id
"#;

const LINE_COLUMNS: &str = "id, sale_id, product_id, descripcion, unidad, cantidad, unit_price_cents, subtotal_cents";

// =============================================================================
// Read models
// =============================================================================

/// A sale with its client and seller names, as listed by the API.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SaleSummary {
    pub id: i64,
    pub numero_venta: String,
    pub user_id: i64,
    pub vendedor: String,
    pub client_id: i64,
    pub cliente: String,
    pub cliente_documento: String,
    #[sqlx(try_from = "String")]
    pub estado: SaleStatus,
    pub subtotal_cents: i64,
    pub igv_cents: i64,
    pub total_cents: i64,
    pub fecha: DateTime<Utc>,
}

/// Sale header plus its lines.
#[derive(Debug, Clone, Serialize)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: SaleSummary,
    pub lines: Vec<SaleLine>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: MySqlPool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: MySqlPool) -> Self {
        SaleRepository { pool }
    }

    /// Lists sales, newest first, optionally filtered by status.
    pub async fn list(&self, estado: Option<SaleStatus>) -> DbResult<Vec<SaleSummary>> {
        let sales = match estado {
            Some(estado) => {
                let sql = format!("{SUMMARY_SELECT} WHERE s.estado = ? ORDER BY s.fecha DESC, s.id DESC");
                sqlx::query_as::<_, SaleSummary>(&sql)
                    .bind(estado.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("{SUMMARY_SELECT} ORDER BY s.fecha DESC, s.id DESC");
                sqlx::query_as::<_, SaleSummary>(&sql).fetch_all(&self.pool).await?
            }
        };
        Ok(sales)
    }

    /// Sales waiting for payment, oldest first (the cashier's queue).
    pub async fn pending(&self) -> DbResult<Vec<SaleSummary>> {
        let sql = format!("{SUMMARY_SELECT} WHERE s.estado = ? ORDER BY s.fecha, s.id");
        let sales = sqlx::query_as::<_, SaleSummary>(&sql)
            .bind(SaleStatus::Pendiente.as_str())
            .fetch_all(&self.pool)
            .await?;
        Ok(sales)
    }

    /// A seller's sales in `[from, to)`.
    pub async fn for_seller_between(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<SaleSummary>> {
        let sql = format!(
            "{SUMMARY_SELECT} WHERE s.user_id = ? AND s.fecha >= ? AND s.fecha < ? ORDER BY s.fecha DESC"
        );
        let sales = sqlx::query_as::<_, SaleSummary>(&sql)
            .bind(user_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(sales)
    }

    /// Gets one sale summary.
    pub async fn get_summary(&self, id: i64) -> DbResult<Option<SaleSummary>> {
        let sql = format!("{SUMMARY_SELECT} WHERE s.id = ?");
        let sale = sqlx::query_as::<_, SaleSummary>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sale)
    }

    /// Gets a sale with its lines.
    pub async fn get_detail(&self, id: i64) -> DbResult<Option<SaleDetail>> {
        let Some(sale) = self.get_summary(id).await? else {
            return Ok(None);
        };

        let sql = format!("SELECT {LINE_COLUMNS} FROM sale_lines WHERE sale_id = ? ORDER BY id");
        let lines = sqlx::query_as::<_, SaleLine>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(Some(SaleDetail { sale, lines }))
    }

    /// Registers a sale in one transaction.
    ///
    /// ## Errors
    /// - `Domain(EmptySale | TooManyLines | Validation)` before any SQL runs
    /// - `NotFound` for an unknown client or product
    /// - `Domain(InsufficientStock | ProductInactive)` from line pricing
    /// - `UniqueViolation` on a sale-number collision
    pub async fn register(&self, user_id: i64, client_id: i64, lines: &[LineRequest]) -> DbResult<SaleDetail> {
        validate_lines(lines)?;

        debug!(user_id = user_id, client_id = client_id, lines = lines.len(), "Registering sale");

        let mut tx = begin(&self.pool).await?;
        let result = register_in_tx(&mut tx, user_id, client_id, lines).await;
        let (sale_id, totals) = settle(tx, result, "register_sale").await?;

        info!(
            sale_id = sale_id,
            user_id = user_id,
            total_cents = totals.total.cents(),
            "Sale registered"
        );

        self.get_detail(sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Venta", sale_id))
    }

    /// Changes the status of a sale in one transaction.
    ///
    /// Cancelling puts every unit of the sale back in stock.
    pub async fn update_status(&self, id: i64, target: SaleStatus) -> DbResult<SaleSummary> {
        debug!(sale_id = id, target = %target, "Updating sale status");

        let mut tx = begin(&self.pool).await?;
        let result = update_status_in_tx(&mut tx, id, target).await;
        let previous = settle(tx, result, "update_sale_status").await?;

        info!(sale_id = id, from = %previous, to = %target, "Sale status changed");

        self.get_summary(id)
            .await?
            .ok_or_else(|| DbError::not_found("Venta", id))
    }
}

// =============================================================================
// Transaction bodies
// =============================================================================

async fn register_in_tx(
    conn: &mut MySqlConnection,
    user_id: i64,
    client_id: i64,
    lines: &[LineRequest],
) -> DbResult<(i64, SaleTotals)> {
    let client: Option<i64> = sqlx::query_scalar("SELECT id FROM clients WHERE id = ?")
        .bind(client_id)
        .fetch_optional(&mut *conn)
        .await?;
    if client.is_none() {
        return Err(DbError::not_found("Cliente", client_id));
    }

    let now = Utc::now();
    let header = sqlx::query(
        r#"
        INSERT INTO sales (numero_venta, user_id, client_id, estado, subtotal_cents, igv_cents, total_cents, fecha)
        VALUES (?, ?, ?, ?, 0, 0, 0, ?)
        "#,
    )
    .bind(sale_number(now))
    .bind(user_id)
    .bind(client_id)
    .bind(SaleStatus::Pendiente.as_str())
    .bind(now)
    .execute(&mut *conn)
    .await?;
    let sale_id = header.last_insert_id() as i64;

    // Rows are locked in ascending id order so concurrent sales touching
    // the same products queue instead of deadlocking. Locked rows keep the
    // stock read at lock time; `reserved` tracks what earlier lines of this
    // sale already took.
    let product_ids: BTreeSet<i64> = lines.iter().map(|line| line.product_id).collect();
    let mut locked = HashMap::with_capacity(product_ids.len());
    for product_id in product_ids {
        let product = fetch_for_update(conn, product_id)
            .await?
            .ok_or_else(|| DbError::not_found("Producto", product_id))?;
        locked.insert(product_id, product);
    }

    let mut reserved: HashMap<i64, i64> = HashMap::new();
    let mut priced: Vec<PricedLine> = Vec::with_capacity(lines.len());

    for request in lines {
        let Some(product) = locked.get(&request.product_id) else {
            return Err(DbError::not_found("Producto", request.product_id));
        };

        let taken = reserved.entry(request.product_id).or_insert(0);
        let line = price_line(product, request, *taken)?;
        *taken += line.cantidad;

        insert_line(conn, sale_id, &line).await?;

        sqlx::query("UPDATE products SET stock = stock - ?, updated_at = ? WHERE id = ?")
            .bind(line.cantidad)
            .bind(now)
            .bind(line.product_id)
            .execute(&mut *conn)
            .await?;

        priced.push(line);
    }

    let totals = SaleTotals::from_lines(&priced);
    sqlx::query("UPDATE sales SET subtotal_cents = ?, igv_cents = ?, total_cents = ? WHERE id = ?")
        .bind(totals.subtotal.cents())
        .bind(totals.igv.cents())
        .bind(totals.total.cents())
        .bind(sale_id)
        .execute(&mut *conn)
        .await?;

    Ok((sale_id, totals))
}

async fn insert_line(conn: &mut MySqlConnection, sale_id: i64, line: &PricedLine) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_lines (sale_id, product_id, descripcion, unidad, cantidad, unit_price_cents, subtotal_cents)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(sale_id)
    .bind(line.product_id)
    .bind(&line.descripcion)
    .bind(&line.unidad)
    .bind(line.cantidad)
    .bind(line.unit_price.cents())
    .bind(line.subtotal.cents())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Returns the status the sale had before the change.
async fn update_status_in_tx(conn: &mut MySqlConnection, id: i64, target: SaleStatus) -> DbResult<SaleStatus> {
    let sale = lock_sale(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("Venta", id))?;

    let next = sale.estado.transition_to(target)?;

    if sale.estado.restocks_on(next) {
        restock(conn, id).await?;
    }

    sqlx::query("UPDATE sales SET estado = ? WHERE id = ?")
        .bind(next.as_str())
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(sale.estado)
}

/// Returns the quantities of every line to the shelf.
async fn restock(conn: &mut MySqlConnection, sale_id: i64) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products p
        JOIN (
            SELECT product_id, SUM(cantidad) AS qty
            FROM sale_lines
            WHERE sale_id = ?
            GROUP BY product_id
        ) l ON l.product_id = p.id
        SET p.stock = p.stock + l.qty
        "#,
    )
    .bind(sale_id)
    .execute(&mut *conn)
    .await?;

    debug!(sale_id = sale_id, products = result.rows_affected(), "Stock restored");
    Ok(())
}

/// Reads and locks a sale header inside an open transaction.
pub(crate) async fn lock_sale(conn: &mut MySqlConnection, id: i64) -> DbResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>(
        r#"
        SELECT id, numero_venta, user_id, client_id, estado, subtotal_cents, igv_cents, total_cents, fecha
        FROM sales
        WHERE id = ?
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(sale)
}

/// Lines of a sale, read inside an open transaction.
pub(crate) async fn fetch_lines(conn: &mut MySqlConnection, sale_id: i64) -> DbResult<Vec<SaleLine>> {
    let sql = format!("SELECT {LINE_COLUMNS} FROM sale_lines WHERE sale_id = ? ORDER BY id");
    let lines = sqlx::query_as::<_, SaleLine>(&sql)
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(lines)
}
