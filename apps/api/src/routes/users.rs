//! User administration.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use cajas_core::validation::{validate_email, validate_password, validate_required};
use cajas_core::{Role, User};
use cajas_db::NewUser;

use crate::auth::{hash_password_off_thread, AdminOnly, Authorized};
use crate::error::ApiResult;
use crate::extract::Body;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/register", post(register_user))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub correo: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub rol: Option<Role>,
}

async fn list_users(_admin: Authorized<AdminOnly>, State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.db.users().list().await?))
}

/// `POST /api/users/register`. The role defaults to vendedor.
async fn register_user(
    admin: Authorized<AdminOnly>,
    State(state): State<AppState>,
    Body(req): Body<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let nombre = validate_required("nombre", &req.nombre, 100)?;
    let correo = validate_email("correo", &req.correo)?;
    validate_password(&req.password)?;

    let new_user = NewUser {
        nombre,
        correo,
        password_hash: hash_password_off_thread(&req.password).await?,
        rol: req.rol.unwrap_or(Role::Vendedor),
    };

    let user = state.db.users().insert(&new_user).await?;
    info!(user_id = user.id, rol = %user.rol, created_by = admin.id, "User registered");

    Ok((StatusCode::CREATED, Json(user)))
}
