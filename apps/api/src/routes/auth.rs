//! Login.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use cajas_core::validation::validate_required;
use cajas_core::{Role, ValidationError};

use crate::auth::verify_password_off_thread;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::extract::Body;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/login", post(login))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub correo: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub id: i64,
    pub nombre: String,
    pub correo: String,
    pub rol: Role,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}

/// `POST /api/login`
///
/// ## Errors
/// - 400 missing correo or password
/// - 404 unknown correo
/// - 403 deactivated account
/// - 401 wrong password
async fn login(State(state): State<AppState>, Body(req): Body<LoginRequest>) -> ApiResult<Json<LoginResponse>> {
    let correo = validate_required("correo", &req.correo, 150)?.to_lowercase();
    if req.password.is_empty() {
        return Err(ValidationError::required("password").into());
    }

    let credentials = state
        .db
        .users()
        .find_credentials(&correo)
        .await?
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "Usuario no encontrado"))?;

    if !credentials.user.activo {
        warn!(correo = %correo, "Login rejected: inactive user");
        return Err(ApiError::forbidden("Usuario inactivo"));
    }

    if !verify_password_off_thread(&req.password, &credentials.password).await? {
        warn!(correo = %correo, "Login rejected: wrong password");
        return Err(ApiError::unauthorized("Contraseña incorrecta"));
    }

    let user = credentials.user;
    let token = state.jwt.generate_token(&user)?;
    info!(user_id = user.id, rol = %user.rol, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user: LoginUser {
            id: user.id,
            nombre: user.nombre,
            correo: user.correo,
            rol: user.rol,
        },
    }))
}
