//! # Report Repository
//!
//! Aggregations over sales for the dashboard.
//!
//! ## Conventions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  • Revenue counts approved sales only (estado = 'aprobado')             │
//! │  • Days and months are Lima days: fecha is UTC, grouped through         │
//! │      DATE(CONVERT_TZ(s.fecha, '+00:00', '-05:00'))                      │
//! │  • Ranges are [from, to) UTC instants computed by cajas_core::calendar  │
//! │  • SUM is cast to SIGNED so it decodes as i64 céntimos, never DECIMAL   │
//! │  • Averages are computed here, in integer céntimos                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{MySql, MySqlPool, QueryBuilder};
use tracing::debug;

use super::sale::{SaleSummary, SUMMARY_SELECT};
use crate::error::DbResult;
use cajas_core::{DocumentType, SaleStatus};

const LIMA_DAY: &str = "DATE(CONVERT_TZ(s.fecha, '+00:00', '-05:00'))";
const LIMA_MONTH: &str = "DATE_FORMAT(CONVERT_TZ(s.fecha, '+00:00', '-05:00'), '%Y-%m')";

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DailySales {
    pub dia: NaiveDate,
    pub cantidad: i64,
    pub total_cents: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MonthlySales {
    /// `YYYY-MM`
    pub mes: String,
    pub cantidad: i64,
    pub total_cents: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DocumentTypeTotals {
    #[sqlx(try_from = "String")]
    pub tipo_comprobante: DocumentType,
    pub cantidad: i64,
    pub total_cents: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    #[sqlx(try_from = "String")]
    pub estado: SaleStatus,
    pub cantidad: i64,
}

/// Dashboard summary.
#[derive(Debug, Clone, Serialize)]
pub struct SalesSummary {
    pub por_dia: Vec<DailySales>,
    pub por_mes: Vec<MonthlySales>,
    pub por_comprobante: Vec<DocumentTypeTotals>,
    pub por_estado: Vec<StatusCount>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TopProduct {
    pub product_id: i64,
    pub producto: String,
    pub total_vendido: i64,
    pub ingreso_cents: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategorySales {
    /// `None` groups products without a category.
    pub categoria: Option<String>,
    pub cantidad_total: i64,
    pub ingreso_cents: i64,
}

/// Raw totals over a range, before averaging.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
struct RangeTotals {
    ventas: i64,
    ingreso_cents: i64,
    periodos: i64,
}

/// Average sales per active period (day or month) in a range.
///
/// Periods without approved sales do not count, so a store closed on
/// Sundays is not penalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SalesAverage {
    pub periodos_con_ventas: i64,
    pub ventas: i64,
    pub ingreso_cents: i64,
    pub promedio_ventas: f64,
    pub ingreso_promedio_cents: i64,
}

impl SalesAverage {
    fn from_totals(totals: RangeTotals) -> Self {
        let (promedio_ventas, ingreso_promedio_cents) = if totals.periodos > 0 {
            (
                totals.ventas as f64 / totals.periodos as f64,
                // round half up
                (totals.ingreso_cents * 2 + totals.periodos) / (totals.periodos * 2),
            )
        } else {
            (0.0, 0)
        };

        SalesAverage {
            periodos_con_ventas: totals.periodos,
            ventas: totals.ventas,
            ingreso_cents: totals.ingreso_cents,
            promedio_ventas,
            ingreso_promedio_cents,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: MySqlPool,
}

impl ReportRepository {
    pub fn new(pool: MySqlPool) -> Self {
        ReportRepository { pool }
    }

    /// Summary since `since`: approved revenue by day and by month, payments
    /// by comprobante type, and sale counts by status.
    pub async fn summary(&self, since: DateTime<Utc>) -> DbResult<SalesSummary> {
        debug!(since = %since, "Building sales summary");

        let por_dia = sqlx::query_as::<_, DailySales>(&format!(
            "SELECT {LIMA_DAY} AS dia, COUNT(*) AS cantidad, \
                    CAST(COALESCE(SUM(s.total_cents), 0) AS SIGNED) AS total_cents \
             FROM sales s \
             WHERE s.estado = ? AND s.fecha >= ? \
             GROUP BY dia ORDER BY dia DESC LIMIT 30"
        ))
        .bind(SaleStatus::Aprobado.as_str())
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let por_mes = sqlx::query_as::<_, MonthlySales>(&format!(
            "SELECT {LIMA_MONTH} AS mes, COUNT(*) AS cantidad, \
                    CAST(COALESCE(SUM(s.total_cents), 0) AS SIGNED) AS total_cents \
             FROM sales s \
             WHERE s.estado = ? \
             GROUP BY mes ORDER BY mes DESC LIMIT 12"
        ))
        .bind(SaleStatus::Aprobado.as_str())
        .fetch_all(&self.pool)
        .await?;

        let por_comprobante = sqlx::query_as::<_, DocumentTypeTotals>(
            "SELECT tipo_comprobante, COUNT(*) AS cantidad, \
                    CAST(COALESCE(SUM(total_cents), 0) AS SIGNED) AS total_cents \
             FROM payments \
             GROUP BY tipo_comprobante ORDER BY tipo_comprobante",
        )
        .fetch_all(&self.pool)
        .await?;

        let por_estado = sqlx::query_as::<_, StatusCount>(
            "SELECT estado, COUNT(*) AS cantidad FROM sales GROUP BY estado ORDER BY estado",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(SalesSummary {
            por_dia,
            por_mes,
            por_comprobante,
            por_estado,
        })
    }

    /// Sales in an optional `[from, to)` range and optional status.
    pub async fn filtered(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        estado: Option<SaleStatus>,
    ) -> DbResult<Vec<SaleSummary>> {
        let mut query: QueryBuilder<MySql> = QueryBuilder::new(SUMMARY_SELECT);
        query.push(" WHERE 1 = 1");

        if let Some(from) = from {
            query.push(" AND s.fecha >= ").push_bind(from);
        }
        if let Some(to) = to {
            query.push(" AND s.fecha < ").push_bind(to);
        }
        if let Some(estado) = estado {
            query.push(" AND s.estado = ").push_bind(estado.as_str());
        }
        query.push(" ORDER BY s.fecha DESC, s.id DESC");

        let sales = query.build_query_as::<SaleSummary>().fetch_all(&self.pool).await?;
        Ok(sales)
    }

    /// Approved sales per Lima day in `[from, to)`.
    pub async fn sales_by_day(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<Vec<DailySales>> {
        let rows = sqlx::query_as::<_, DailySales>(&format!(
            "SELECT {LIMA_DAY} AS dia, COUNT(*) AS cantidad, \
                    CAST(COALESCE(SUM(s.total_cents), 0) AS SIGNED) AS total_cents \
             FROM sales s \
             WHERE s.estado = ? AND s.fecha >= ? AND s.fecha < ? \
             GROUP BY dia ORDER BY dia"
        ))
        .bind(SaleStatus::Aprobado.as_str())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Best sellers by units in approved sales.
    pub async fn top_products(&self, limit: u32) -> DbResult<Vec<TopProduct>> {
        let rows = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT
                p.id AS product_id,
                p.nombre AS producto,
                CAST(SUM(l.cantidad) AS SIGNED) AS total_vendido,
                CAST(SUM(l.subtotal_cents) AS SIGNED) AS ingreso_cents
            FROM sale_lines l
            JOIN sales s ON s.id = l.sale_id
            JOIN products p ON p.id = l.product_id
            WHERE s.estado = ?
            GROUP BY p.id, p.nombre
            ORDER BY total_vendido DESC, p.id
            LIMIT ?
            "#,
        )
        .bind(SaleStatus::Aprobado.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Approved units and revenue per product category.
    pub async fn by_category(&self) -> DbResult<Vec<CategorySales>> {
        let rows = sqlx::query_as::<_, CategorySales>(
            r#"
            SELECT
                p.categoria,
                CAST(SUM(l.cantidad) AS SIGNED) AS cantidad_total,
                CAST(SUM(l.subtotal_cents) AS SIGNED) AS ingreso_cents
            FROM sale_lines l
            JOIN sales s ON s.id = l.sale_id
            JOIN products p ON p.id = l.product_id
            WHERE s.estado = ?
            GROUP BY p.categoria
            ORDER BY ingreso_cents DESC
            "#,
        )
        .bind(SaleStatus::Aprobado.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Average approved sales per Lima day with sales, in `[from, to)`.
    pub async fn daily_average(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<SalesAverage> {
        self.average(LIMA_DAY, from, to).await
    }

    /// Average approved sales per Lima month with sales, in `[from, to)`.
    pub async fn monthly_average(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<SalesAverage> {
        self.average(LIMA_MONTH, from, to).await
    }

    /// Approved sales per month since `since`, newest first.
    pub async fn monthly(&self, since: DateTime<Utc>) -> DbResult<Vec<MonthlySales>> {
        let rows = sqlx::query_as::<_, MonthlySales>(&format!(
            "SELECT {LIMA_MONTH} AS mes, COUNT(*) AS cantidad, \
                    CAST(COALESCE(SUM(s.total_cents), 0) AS SIGNED) AS total_cents \
             FROM sales s \
             WHERE s.estado = ? AND s.fecha >= ? \
             GROUP BY mes ORDER BY mes DESC"
        ))
        .bind(SaleStatus::Aprobado.as_str())
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn average(&self, period: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<SalesAverage> {
        let totals = sqlx::query_as::<_, RangeTotals>(&format!(
            "SELECT COUNT(*) AS ventas, \
                    CAST(COALESCE(SUM(s.total_cents), 0) AS SIGNED) AS ingreso_cents, \
                    COUNT(DISTINCT {period}) AS periodos \
             FROM sales s \
             WHERE s.estado = ? AND s.fecha >= ? AND s.fecha < ?"
        ))
        .bind(SaleStatus::Aprobado.as_str())
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(SalesAverage::from_totals(totals))
    }
}
