//! # Payment Routes
//!
//! Recording a payment approves the sale and issues the next comprobante
//! of the requested series in the same transaction.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use cajas_core::{DocumentType, PaymentMethod, ValidationError};
use cajas_db::{PaymentReceipt, PaymentSummary};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Body, Id};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/pagos", get(list_payments).post(record_payment))
        .route("/api/pagos/{id}", get(get_payment))
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub id_venta: i64,
    #[serde(default)]
    pub tipo_comprobante: String,
    #[serde(default)]
    pub metodo_pago: String,
}

impl PaymentRequest {
    pub fn parse(&self) -> Result<(DocumentType, PaymentMethod), ValidationError> {
        if self.tipo_comprobante.trim().is_empty() {
            return Err(ValidationError::required("tipo_comprobante"));
        }
        if self.metodo_pago.trim().is_empty() {
            return Err(ValidationError::required("metodo_pago"));
        }
        Ok((self.tipo_comprobante.parse()?, self.metodo_pago.parse()?))
    }
}

async fn list_payments(_user: AuthUser, State(state): State<AppState>) -> ApiResult<Json<Vec<PaymentSummary>>> {
    Ok(Json(state.db.payments().list().await?))
}

async fn get_payment(_user: AuthUser, State(state): State<AppState>, Id(id): Id) -> ApiResult<Json<PaymentSummary>> {
    state
        .db
        .payments()
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Pago", id))
}

async fn record_payment(
    user: AuthUser,
    State(state): State<AppState>,
    Body(req): Body<PaymentRequest>,
) -> ApiResult<(StatusCode, Json<PaymentReceipt>)> {
    let (tipo, metodo) = req.parse()?;

    let receipt = state
        .db
        .payments()
        .record(req.id_venta, tipo, metodo, &state.config.company_ruc)
        .await?;

    info!(
        sale_id = req.id_venta,
        payment_id = receipt.payment.id,
        comprobante = %receipt.comprobante.invoice.full_number(),
        cashier = user.id,
        "Payment recorded"
    );

    Ok((StatusCode::CREATED, Json(receipt)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(tipo: &str, metodo: &str) -> PaymentRequest {
        PaymentRequest {
            id_venta: 1,
            tipo_comprobante: tipo.to_string(),
            metodo_pago: metodo.to_string(),
        }
    }

    #[test]
    fn test_parse_payment_request() {
        let (tipo, _) = request("factura", "efectivo").parse().unwrap();
        assert_eq!(tipo, DocumentType::Factura);
    }

    #[test]
    fn test_parse_rejects_unknown_values() {
        assert!(request("ticket", "efectivo").parse().is_err());
        assert!(request("boleta", "").parse().is_err());
    }
}
