//! Sales zones.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use cajas_core::Zone;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/zonas", get(list_zones))
}

async fn list_zones(_user: AuthUser, State(state): State<AppState>) -> ApiResult<Json<Vec<Zone>>> {
    Ok(Json(state.db.zones().list().await?))
}
