//! # Sale Routes
//!
//! ## Registration Flow
//! ```text
//! POST /api/ventas/registro  { id_cliente, productos: [...] }
//!      │
//!      ├── validate_lines        400 empty / too many / bad quantity
//!      ▼
//! SaleRepository::register   (one transaction)
//!      ├── client exists?                         404
//!      ├── lock product rows, price, check stock  404 / 409
//!      ├── insert sale + lines, decrement stock
//!      ▼
//! 201 SaleDetail
//! ```
//!
//! ## Comprobante Email
//! ```text
//! POST /api/ventas/{id}/enviar-comprobante  { correo? }
//!      ├── sale exists?                          404
//!      ├── comprobante issued?                   409
//!      ├── recipient: client correo, else body   400
//!      ├── mailer configured?                    503
//!      ▼
//! render PDF ──► InvoiceMailer::send
//! ```

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use cajas_core::calendar::{day_bounds, lima_date};
use cajas_core::money::decimal;
use cajas_core::sale::{validate_lines, LineRequest};
use cajas_core::validation::validate_email;
use cajas_core::{CoreError, Money, SaleStatus, ValidationError};
use cajas_db::{SaleDetail, SaleSummary};

use crate::auth::{AuthUser, Authorized, Cashier, Seller};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::extract::{Body, Id, Params};
use crate::mailer::{InvoiceEmail, MailError};
use crate::pdf::{render_invoice, Issuer};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/ventas", get(list_sales))
        .route("/api/ventas/pendientes", get(pending_sales))
        .route("/api/ventas/hoy", get(todays_sales))
        .route("/api/ventas/registro", post(register_sale))
        .route("/api/ventas/{id}", get(get_sale))
        .route("/api/ventas/{id}/estado", put(update_status))
        .route("/api/ventas/{id}/enviar-comprobante", post(send_invoice))
}

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SaleLineRequest {
    pub id_producto: i64,
    pub cantidad: i64,
    #[serde(default, deserialize_with = "decimal::deserialize_option")]
    pub precio_unitario: Option<Money>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterSaleRequest {
    pub id_cliente: i64,
    #[serde(default)]
    pub productos: Vec<SaleLineRequest>,
}

impl RegisterSaleRequest {
    pub fn lines(&self) -> Vec<LineRequest> {
        self.productos
            .iter()
            .map(|line| LineRequest {
                product_id: line.id_producto,
                quantity: line.cantidad,
                unit_price: line.precio_unitario,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub estado: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub estado: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SendInvoiceRequest {
    pub correo: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// =============================================================================
// Queries
// =============================================================================

async fn list_sales(
    _user: Authorized<Seller>,
    State(state): State<AppState>,
    Params(params): Params<ListParams>,
) -> ApiResult<Json<Vec<SaleSummary>>> {
    let estado = parse_optional_status(params.estado.as_deref())?;
    Ok(Json(state.db.sales().list(estado).await?))
}

async fn pending_sales(_user: AuthUser, State(state): State<AppState>) -> ApiResult<Json<Vec<SaleSummary>>> {
    Ok(Json(state.db.sales().pending().await?))
}

/// The caller's sales during the current Lima day.
async fn todays_sales(user: Authorized<Seller>, State(state): State<AppState>) -> ApiResult<Json<Vec<SaleSummary>>> {
    let (from, to) = day_bounds(lima_date(Utc::now()));
    Ok(Json(state.db.sales().for_seller_between(user.id, from, to).await?))
}

async fn get_sale(_user: Authorized<Seller>, State(state): State<AppState>, Id(id): Id) -> ApiResult<Json<SaleDetail>> {
    state
        .db
        .sales()
        .get_detail(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Venta", id))
}

// =============================================================================
// Commands
// =============================================================================

async fn register_sale(
    user: Authorized<Seller>,
    State(state): State<AppState>,
    Body(req): Body<RegisterSaleRequest>,
) -> ApiResult<(StatusCode, Json<SaleDetail>)> {
    let lines = req.lines();
    validate_lines(&lines)?;

    let detail = state.db.sales().register(user.id, req.id_cliente, &lines).await?;
    info!(
        sale_id = detail.sale.id,
        numero_venta = %detail.sale.numero_venta,
        seller = user.id,
        total = %Money::from_cents(detail.sale.total_cents),
        "Sale registered"
    );

    Ok((StatusCode::CREATED, Json(detail)))
}

async fn update_status(
    user: Authorized<Cashier>,
    State(state): State<AppState>,
    Id(id): Id,
    Body(req): Body<StatusRequest>,
) -> ApiResult<Json<SaleSummary>> {
    if req.estado.trim().is_empty() {
        return Err(ValidationError::required("estado").into());
    }
    let target: SaleStatus = req.estado.parse()?;

    let sale = state.db.sales().update_status(id, target).await?;
    info!(sale_id = id, estado = %sale.estado, changed_by = user.id, "Sale status changed");
    Ok(Json(sale))
}

/// Emails the comprobante PDF of a paid sale. The body is optional.
async fn send_invoice(
    user: Authorized<Cashier>,
    State(state): State<AppState>,
    Id(id): Id,
    body: Bytes,
) -> ApiResult<Json<MessageResponse>> {
    let req = parse_optional_body(&body)?;

    let sale = state
        .db
        .sales()
        .get_summary(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Venta", id))?;

    let comprobante = state.db.invoices().get_by_sale(id).await?.ok_or_else(|| {
        ApiError::from(CoreError::InvalidSaleStatus {
            sale: sale.numero_venta.clone(),
            status: sale.estado.to_string(),
            required: "pagada con comprobante".to_string(),
        })
    })?;

    let client_email = state
        .db
        .clients()
        .get_by_id(sale.client_id)
        .await?
        .and_then(|client| client.correo)
        .filter(|correo| !correo.trim().is_empty());
    let to = match client_email.or(req.correo) {
        Some(correo) => validate_email("correo", &correo)?,
        None => return Err(ApiError::validation("El cliente no tiene correo registrado")),
    };

    if !state.mailer.is_enabled() {
        return Err(mail_disabled());
    }

    let issuer = Issuer {
        name: &state.config.company_name,
        address: &state.config.company_address,
    };
    let pdf = render_invoice(&issuer, &comprobante.invoice, &comprobante.lines).map_err(ApiError::internal)?;

    let email = InvoiceEmail {
        to,
        numero_venta: sale.numero_venta.clone(),
        pdf,
    };
    match state.mailer.send(email).await {
        Ok(()) => {}
        Err(MailError::Disabled) => return Err(mail_disabled()),
        Err(MailError::InvalidAddress { address, reason }) => {
            warn!(sale_id = id, address = %address, reason = %reason, "Rejected recipient");
            return Err(ApiError::validation(format!("Correo inválido: {}", address)));
        }
        Err(e) => return Err(ApiError::internal(e)),
    }

    info!(sale_id = id, sent_by = user.id, "Comprobante sent");
    Ok(Json(MessageResponse {
        message: "Comprobante enviado correctamente".to_string(),
    }))
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_optional_status(value: Option<&str>) -> ApiResult<Option<SaleStatus>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => Ok(Some(text.parse()?)),
    }
}

fn parse_optional_body(body: &[u8]) -> ApiResult<SendInvoiceRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(SendInvoiceRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::validation(format!("JSON inválido: {}", e)))
}

fn mail_disabled() -> ApiError {
    ApiError::new(ErrorCode::MailDisabled, "El envío de correos no está configurado")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_maps_lines() {
        let req: RegisterSaleRequest = serde_json::from_str(
            r#"{"id_cliente": 7, "productos": [
                {"id_producto": 1, "cantidad": 2},
                {"id_producto": 3, "cantidad": 1, "precio_unitario": "9.90"}
            ]}"#,
        )
        .unwrap();

        let lines = req.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].unit_price, None);
        assert_eq!(lines[1].unit_price, Some(Money::from_cents(990)));
        assert_eq!(lines[1].product_id, 3);
    }

    #[test]
    fn test_parse_optional_status() {
        assert_eq!(parse_optional_status(None).unwrap(), None);
        assert_eq!(parse_optional_status(Some(" ")).unwrap(), None);
        assert_eq!(parse_optional_status(Some("APROBADO")).unwrap(), Some(SaleStatus::Aprobado));
        assert!(parse_optional_status(Some("pagado")).is_err());
    }

    #[test]
    fn test_parse_optional_body() {
        assert!(parse_optional_body(b"").unwrap().correo.is_none());
        assert!(parse_optional_body(b"  \n").unwrap().correo.is_none());
        let req = parse_optional_body(br#"{"correo": "a@b.pe"}"#).unwrap();
        assert_eq!(req.correo.as_deref(), Some("a@b.pe"));
        assert!(parse_optional_body(b"{").is_err());
    }
}
