//! # Comprobante Routes
//!
//! ```text
//! GET /api/comprobantes            numbering series
//! GET /api/comprobantes/{id}       header + lines (JSON)
//! GET /api/comprobantes/{id}/pdf   printed representation with SUNAT QR
//! ```

use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tracing::debug;

use cajas_core::DocumentSeries;
use cajas_db::InvoiceDetail;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::Id;
use crate::pdf::{render_invoice, Issuer};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/comprobantes", get(list_series))
        .route("/api/comprobantes/{id}", get(get_invoice))
        .route("/api/comprobantes/{id}/pdf", get(invoice_pdf))
}

async fn list_series(_user: AuthUser, State(state): State<AppState>) -> ApiResult<Json<Vec<DocumentSeries>>> {
    Ok(Json(state.db.invoices().list_series().await?))
}

async fn get_invoice(_user: AuthUser, State(state): State<AppState>, Id(id): Id) -> ApiResult<Json<InvoiceDetail>> {
    load(&state, id).await.map(Json)
}

async fn invoice_pdf(_user: AuthUser, State(state): State<AppState>, Id(id): Id) -> ApiResult<impl IntoResponse> {
    let detail = load(&state, id).await?;

    let issuer = Issuer {
        name: &state.config.company_name,
        address: &state.config.company_address,
    };
    let pdf = render_invoice(&issuer, &detail.invoice, &detail.lines).map_err(ApiError::internal)?;
    debug!(invoice_id = id, bytes = pdf.len(), "Rendered comprobante PDF");

    let disposition = format!("inline; filename=\"{}\"", pdf_filename(&detail));
    Ok(([(CONTENT_TYPE, "application/pdf".to_string()), (CONTENT_DISPOSITION, disposition)], pdf))
}

async fn load(state: &AppState, id: i64) -> ApiResult<InvoiceDetail> {
    state
        .db
        .invoices()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comprobante", id))
}

fn pdf_filename(detail: &InvoiceDetail) -> String {
    format!("comprobante-{}.pdf", detail.invoice.full_number())
}
