//! # Report Routes
//!
//! Periods are Lima calendar days, months and years converted to UTC
//! `[from, to)` ranges before querying. Revenue figures count approved
//! sales only.
//!
//! ```text
//! /api/reportes/ventas                       summary, last 12 months
//! /api/reportes/ventas/filtro                fecha_inicio..=fecha_fin, estado
//! /api/reporte/ventas-por-dia?mes&anio
//! /api/reporte/productos-mas-vendidos        top 10
//! /api/reporte/ventas-por-categoria
//! /api/reporte/promedio-diario?mes&anio
//! /api/reporte/promedio-mensual?anio
//! /api/reporte/mensual                       last 6 months
//! ```

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Deserialize;

use cajas_core::calendar::{lima_date, lima_midnight, month_bounds, months_ago, year_bounds};
use cajas_core::validation::{validate_month, validate_year};
use cajas_core::{SaleStatus, ValidationError};
use cajas_db::{CategorySales, DailySales, MonthlySales, SaleSummary, SalesAverage, SalesSummary, TopProduct};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::Params;
use crate::AppState;

/// Products listed by the best-seller report.
const TOP_PRODUCTS: u32 = 10;

/// Months covered by the summary, current month included.
const SUMMARY_MONTHS: u32 = 12;

/// Months covered by the monthly report, current month included.
const MONTHLY_MONTHS: u32 = 6;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/reportes/ventas", get(sales_summary))
        .route("/api/reportes/ventas/filtro", get(filtered_sales))
        .route("/api/reporte/ventas-por-dia", get(sales_by_day))
        .route("/api/reporte/productos-mas-vendidos", get(top_products))
        .route("/api/reporte/ventas-por-categoria", get(sales_by_category))
        .route("/api/reporte/promedio-diario", get(daily_average))
        .route("/api/reporte/promedio-mensual", get(monthly_average))
        .route("/api/reporte/mensual", get(monthly_sales))
}

// =============================================================================
// Parameters
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    pub fecha_inicio: Option<String>,
    pub fecha_fin: Option<String>,
    pub estado: Option<String>,
}

/// A validated filter: `[from, to)` in UTC plus an optional status.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub estado: Option<SaleStatus>,
}

impl FilterParams {
    /// Dates are inclusive Lima days (`YYYY-MM-DD`).
    pub fn resolve(&self) -> Result<SalesFilter, ValidationError> {
        let start = parse_date("fecha_inicio", self.fecha_inicio.as_deref())?;
        let end = parse_date("fecha_fin", self.fecha_fin.as_deref())?;

        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(ValidationError::invalid_format(
                    "fecha_fin",
                    "must not be before fecha_inicio",
                ));
            }
        }

        let estado = match self.estado.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(text) => Some(text.parse()?),
        };

        Ok(SalesFilter {
            from: start.map(lima_midnight),
            to: end.map(|day| lima_midnight(day) + Duration::days(1)),
            estado,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthParams {
    pub mes: Option<u32>,
    pub anio: Option<i32>,
}

impl MonthParams {
    pub fn bounds(&self) -> ApiResult<(DateTime<Utc>, DateTime<Utc>)> {
        let (Some(mes), Some(anio)) = (self.mes, self.anio) else {
            return Err(ApiError::validation("Se requiere mes y año"));
        };
        validate_month(mes, anio)?;
        month_bounds(anio, mes).ok_or_else(|| ApiError::validation("Mes inválido"))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct YearParams {
    pub anio: Option<i32>,
}

impl YearParams {
    pub fn bounds(&self) -> ApiResult<(DateTime<Utc>, DateTime<Utc>)> {
        let anio = self.anio.ok_or_else(|| ApiError::validation("Se requiere el año"))?;
        validate_year(anio)?;
        year_bounds(anio).ok_or_else(|| ApiError::validation("Año inválido"))
    }
}

fn parse_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ValidationError::invalid_format(field, "expected YYYY-MM-DD")),
    }
}

/// Lima midnight on the first day of the month `months - 1` months back.
fn months_window_start(months: u32) -> DateTime<Utc> {
    let today = lima_date(Utc::now());
    lima_midnight(months_ago(today, months.saturating_sub(1)))
}

// =============================================================================
// Handlers
// =============================================================================

async fn sales_summary(_user: AuthUser, State(state): State<AppState>) -> ApiResult<Json<SalesSummary>> {
    let since = months_window_start(SUMMARY_MONTHS);
    Ok(Json(state.db.reports().summary(since).await?))
}

async fn filtered_sales(
    _user: AuthUser,
    State(state): State<AppState>,
    Params(params): Params<FilterParams>,
) -> ApiResult<Json<Vec<SaleSummary>>> {
    let filter = params.resolve()?;
    let sales = state.db.reports().filtered(filter.from, filter.to, filter.estado).await?;
    Ok(Json(sales))
}

async fn sales_by_day(
    _user: AuthUser,
    State(state): State<AppState>,
    Params(params): Params<MonthParams>,
) -> ApiResult<Json<Vec<DailySales>>> {
    let (from, to) = params.bounds()?;
    Ok(Json(state.db.reports().sales_by_day(from, to).await?))
}

async fn top_products(_user: AuthUser, State(state): State<AppState>) -> ApiResult<Json<Vec<TopProduct>>> {
    Ok(Json(state.db.reports().top_products(TOP_PRODUCTS).await?))
}

async fn sales_by_category(_user: AuthUser, State(state): State<AppState>) -> ApiResult<Json<Vec<CategorySales>>> {
    Ok(Json(state.db.reports().by_category().await?))
}

async fn daily_average(
    _user: AuthUser,
    State(state): State<AppState>,
    Params(params): Params<MonthParams>,
) -> ApiResult<Json<SalesAverage>> {
    let (from, to) = params.bounds()?;
    Ok(Json(state.db.reports().daily_average(from, to).await?))
}

async fn monthly_average(
    _user: AuthUser,
    State(state): State<AppState>,
    Params(params): Params<YearParams>,
) -> ApiResult<Json<SalesAverage>> {
    let (from, to) = params.bounds()?;
    Ok(Json(state.db.reports().monthly_average(from, to).await?))
}

async fn monthly_sales(_user: AuthUser, State(state): State<AppState>) -> ApiResult<Json<Vec<MonthlySales>>> {
    let since = months_window_start(MONTHLY_MONTHS);
    Ok(Json(state.db.reports().monthly(since).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_filter_end_date_is_inclusive() {
        let params = FilterParams {
            fecha_inicio: Some("2026-10-01".to_string()),
            fecha_fin: Some("2026-10-15".to_string()),
            estado: Some("aprobado".to_string()),
        };
        let filter = params.resolve().unwrap();

        // Lima midnight is 05:00 UTC
        assert_eq!(filter.from, Some(Utc.with_ymd_and_hms(2026, 10, 1, 5, 0, 0).unwrap()));
        assert_eq!(filter.to, Some(Utc.with_ymd_and_hms(2026, 10, 16, 5, 0, 0).unwrap()));
        assert_eq!(filter.estado, Some(SaleStatus::Aprobado));
    }

    #[test]
    fn test_filter_is_optional() {
        let filter = FilterParams::default().resolve().unwrap();
        assert_eq!(
            filter,
            SalesFilter {
                from: None,
                to: None,
                estado: None
            }
        );
    }

    #[test]
    fn test_filter_rejects_bad_input() {
        let params = FilterParams {
            fecha_inicio: Some("15/10/2026".to_string()),
            ..Default::default()
        };
        assert!(params.resolve().is_err());

        let params = FilterParams {
            fecha_inicio: Some("2026-10-15".to_string()),
            fecha_fin: Some("2026-10-01".to_string()),
            estado: None,
        };
        assert!(params.resolve().is_err());
    }

    #[test]
    fn test_month_params_require_both() {
        let params = MonthParams {
            mes: Some(10),
            anio: None,
        };
        assert_eq!(params.bounds().unwrap_err().message, "Se requiere mes y año");

        let params = MonthParams {
            mes: Some(13),
            anio: Some(2026),
        };
        assert!(params.bounds().is_err());

        let (from, to) = MonthParams {
            mes: Some(12),
            anio: Some(2026),
        }
        .bounds()
        .unwrap();
        assert_eq!(from, Utc.with_ymd_and_hms(2026, 12, 1, 5, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2027, 1, 1, 5, 0, 0).unwrap());
    }

    #[test]
    fn test_year_params() {
        assert!(YearParams { anio: None }.bounds().is_err());
        assert!(YearParams { anio: Some(1999) }.bounds().is_err());
        let (from, _) = YearParams { anio: Some(2026) }.bounds().unwrap();
        assert_eq!(from, Utc.with_ymd_and_hms(2026, 1, 1, 5, 0, 0).unwrap());
    }
}
