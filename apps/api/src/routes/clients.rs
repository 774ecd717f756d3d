//! # Client Routes
//!
//! ```text
//! GET    /api/clientes              admin, caja
//! GET    /api/clientes/buscar?q=    any role   (10 results)
//! GET    /api/clientes/zona?zona_id any role
//! GET    /api/clientes/{id}         admin, caja
//! POST   /api/clientes              admin, caja
//! PUT    /api/clientes/{id}         admin, caja
//! DELETE /api/clientes/{id}         admin
//! ```

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use cajas_core::validation::{
    validate_coordinates, validate_document, validate_email, validate_optional, validate_rating, validate_required,
    validate_search_query,
};
use cajas_core::{Client, IdentityDocument, ValidationError};
use cajas_db::ClientInput;

use crate::auth::{AdminOnly, AuthUser, Authorized, Cashier};
use crate::error::{ApiError, ApiResult};
use crate::extract::{Body, Id, Params};
use crate::AppState;

/// Results returned by the name search.
const SEARCH_LIMIT: u32 = 10;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/clientes", get(list_clients).post(create_client))
        .route("/api/clientes/buscar", get(search_clients))
        .route("/api/clientes/zona", get(clients_by_zone))
        .route(
            "/api/clientes/{id}",
            get(get_client).put(update_client).delete(delete_client),
        )
}

// =============================================================================
// Request DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ClientRequest {
    #[serde(default)]
    pub tipo_documento: String,
    #[serde(default)]
    pub documento: String,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub direccion: String,
    pub telefono: Option<String>,
    pub correo: Option<String>,
    pub latitud: Option<f64>,
    pub longitud: Option<f64>,
    #[serde(default)]
    pub nestrella: i64,
    #[serde(default)]
    pub cestrella: String,
    pub zona_id: Option<i64>,
}

impl ClientRequest {
    /// Validates and normalizes the request into a repository input.
    pub fn into_input(self) -> Result<ClientInput, ValidationError> {
        if self.tipo_documento.trim().is_empty() {
            return Err(ValidationError::required("tipo_documento"));
        }
        let tipo_documento: IdentityDocument = self.tipo_documento.parse()?;
        let documento = validate_document(tipo_documento, &self.documento)?;
        let nombre = validate_required("nombre", &self.nombre, 150)?;
        let direccion = validate_required("direccion", &self.direccion, 255)?;
        let telefono = validate_optional("telefono", self.telefono.as_deref(), 20)?;
        let correo = match validate_optional("correo", self.correo.as_deref(), 150)? {
            Some(correo) => Some(validate_email("correo", &correo)?),
            None => None,
        };
        validate_coordinates(self.latitud, self.longitud)?;
        validate_rating(self.nestrella)?;

        Ok(ClientInput {
            tipo_documento,
            documento,
            nombre,
            direccion,
            telefono,
            correo,
            latitud: self.latitud,
            longitud: self.longitud,
            nestrella: self.nestrella,
            cestrella: self.cestrella.trim().to_string(),
            zone_id: self.zona_id,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct ZoneParams {
    pub zona_id: Option<i64>,
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_clients(_user: Authorized<Cashier>, State(state): State<AppState>) -> ApiResult<Json<Vec<Client>>> {
    Ok(Json(state.db.clients().list().await?))
}

async fn search_clients(
    _user: AuthUser,
    State(state): State<AppState>,
    Params(params): Params<SearchParams>,
) -> ApiResult<Json<Vec<Client>>> {
    let query = validate_search_query(&params.q)?;
    Ok(Json(state.db.clients().search(&query, SEARCH_LIMIT).await?))
}

async fn clients_by_zone(
    _user: AuthUser,
    State(state): State<AppState>,
    Params(params): Params<ZoneParams>,
) -> ApiResult<Json<Vec<Client>>> {
    let zone_id = params.zona_id.ok_or_else(|| ApiError::from(ValidationError::required("zona_id")))?;
    Ok(Json(state.db.clients().by_zone(zone_id).await?))
}

async fn get_client(_user: Authorized<Cashier>, State(state): State<AppState>, Id(id): Id) -> ApiResult<Json<Client>> {
    state
        .db
        .clients()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Cliente", id))
}

async fn create_client(
    user: Authorized<Cashier>,
    State(state): State<AppState>,
    Body(req): Body<ClientRequest>,
) -> ApiResult<(StatusCode, Json<Client>)> {
    let input = req.into_input()?;
    let client = state.db.clients().insert(&input).await?;
    info!(client_id = client.id, created_by = user.id, "Client created");
    Ok((StatusCode::CREATED, Json(client)))
}

async fn update_client(
    user: Authorized<Cashier>,
    State(state): State<AppState>,
    Id(id): Id,
    Body(req): Body<ClientRequest>,
) -> ApiResult<Json<Client>> {
    let input = req.into_input()?;
    let client = state.db.clients().update(id, &input).await?;
    info!(client_id = id, updated_by = user.id, "Client updated");
    Ok(Json(client))
}

async fn delete_client(admin: Authorized<AdminOnly>, State(state): State<AppState>, Id(id): Id) -> ApiResult<StatusCode> {
    state.db.clients().delete(id).await?;
    info!(client_id = id, deleted_by = admin.id, "Client deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ClientRequest {
        ClientRequest {
            tipo_documento: "DNI".to_string(),
            documento: "45781236".to_string(),
            nombre: "  Rosa Quispe ".to_string(),
            direccion: "Jr. Junín 450, Huancayo".to_string(),
            telefono: Some("".to_string()),
            correo: Some("Rosa@Correo.PE".to_string()),
            latitud: Some(-12.06),
            longitud: Some(-75.2),
            nestrella: 4,
            cestrella: "Frecuente".to_string(),
            zona_id: Some(2),
        }
    }

    #[test]
    fn test_into_input_normalizes() {
        let input = request().into_input().unwrap();
        assert_eq!(input.tipo_documento, IdentityDocument::Dni);
        assert_eq!(input.nombre, "Rosa Quispe");
        assert_eq!(input.telefono, None);
        assert_eq!(input.correo.as_deref(), Some("rosa@correo.pe"));
        assert_eq!(input.zone_id, Some(2));
    }

    #[test]
    fn test_into_input_rejects_bad_dni() {
        let mut req = request();
        req.documento = "1234".to_string();
        assert!(req.into_input().is_err());
    }

    #[test]
    fn test_into_input_requires_fields() {
        let mut req = request();
        req.tipo_documento = String::new();
        assert!(matches!(req.into_input(), Err(ValidationError::Required { .. })));

        let mut req = request();
        req.direccion = "   ".to_string();
        assert!(req.into_input().is_err());
    }

    #[test]
    fn test_into_input_rejects_rating() {
        let mut req = request();
        req.nestrella = 6;
        assert!(req.into_input().is_err());
    }
}
