//! # Product Routes
//!
//! Any role can read the catalog; only admins change it. Prices arrive as
//! decimal soles (`"precio": 12.50`) and are stored as céntimos.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use cajas_core::money::decimal;
use cajas_core::validation::{validate_optional, validate_price, validate_required, validate_stock};
use cajas_core::{Money, Product, ValidationError, DEFAULT_UNIT};
use cajas_db::ProductInput;

use crate::auth::{AdminOnly, AuthUser, Authorized};
use crate::error::{ApiError, ApiResult};
use crate::extract::{Body, Id};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/productos", get(list_products).post(create_product))
        .route("/api/productos/{id}", get(get_product).put(update_product))
}

#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    #[serde(default)]
    pub nombre: String,
    pub descripcion: Option<String>,
    pub categoria: Option<String>,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub precio: Money,
    #[serde(default)]
    pub stock: i64,
    pub unidad_medida: Option<String>,
    pub activo: Option<bool>,
}

impl ProductRequest {
    pub fn into_input(self) -> Result<ProductInput, ValidationError> {
        let nombre = validate_required("nombre", &self.nombre, 150)?;
        let descripcion = validate_optional("descripcion", self.descripcion.as_deref(), 500)?;
        let categoria = validate_optional("categoria", self.categoria.as_deref(), 100)?;
        validate_price("precio", self.precio.cents())?;
        validate_stock(self.stock)?;
        let unidad_medida = validate_optional("unidad_medida", self.unidad_medida.as_deref(), 10)?
            .map(|unit| unit.to_uppercase())
            .unwrap_or_else(|| DEFAULT_UNIT.to_string());

        Ok(ProductInput {
            nombre,
            descripcion,
            categoria,
            price_cents: self.precio.cents(),
            stock: self.stock,
            unidad_medida,
            activo: self.activo.unwrap_or(true),
        })
    }
}

async fn list_products(_user: AuthUser, State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.db.products().list().await?))
}

async fn get_product(_user: AuthUser, State(state): State<AppState>, Id(id): Id) -> ApiResult<Json<Product>> {
    state
        .db
        .products()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Producto", id))
}

async fn create_product(
    admin: Authorized<AdminOnly>,
    State(state): State<AppState>,
    Body(req): Body<ProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let input = req.into_input()?;
    let product = state.db.products().insert(&input).await?;
    info!(product_id = product.id, price = %product.price(), created_by = admin.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    admin: Authorized<AdminOnly>,
    State(state): State<AppState>,
    Id(id): Id,
    Body(req): Body<ProductRequest>,
) -> ApiResult<Json<Product>> {
    let input = req.into_input()?;
    let product = state.db.products().update(id, &input).await?;
    info!(product_id = id, updated_by = admin.id, "Product updated");
    Ok(Json(product))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_price_and_defaults() {
        let req: ProductRequest =
            serde_json::from_str(r#"{"nombre": "Martillo 16oz", "precio": "25.90", "stock": 12}"#).unwrap();
        let input = req.into_input().unwrap();

        assert_eq!(input.price_cents, 2590);
        assert_eq!(input.unidad_medida, "NIU");
        assert!(input.activo);
        assert_eq!(input.categoria, None);
    }

    #[test]
    fn test_rejects_negative_stock() {
        let req: ProductRequest = serde_json::from_str(r#"{"nombre": "Clavos", "precio": 3.5, "stock": -1}"#).unwrap();
        assert!(req.into_input().is_err());
    }

    #[test]
    fn test_rejects_price_above_cap() {
        let req: ProductRequest =
            serde_json::from_str(r#"{"nombre": "Grupo electrógeno", "precio": "90000000000000000", "stock": 1}"#)
                .unwrap();
        assert!(matches!(req.into_input(), Err(ValidationError::OutOfRange { .. })));

        let req: ProductRequest =
            serde_json::from_str(r#"{"nombre": "Grupo electrógeno", "precio": "1000000.00", "stock": 1}"#).unwrap();
        assert_eq!(req.into_input().unwrap().price_cents, cajas_core::MAX_PRICE_CENTS);
    }

    #[test]
    fn test_missing_price_fails_to_parse() {
        let parsed = serde_json::from_str::<ProductRequest>(r#"{"nombre": "Clavos"}"#);
        assert!(parsed.is_err());
    }
}
