//! Router tests.
//!
//! The pool connects lazily to a closed port, so every case here must be
//! decided before a query runs: authentication, role policies and input
//! validation.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use config::{Environment, Map};
use serde_json::{json, Value};
use tower::ServiceExt;

use cajas_api::mailer::DisabledMailer;
use cajas_api::{build_router, ApiConfig, AppState};
use cajas_core::{Role, User};
use cajas_db::{Database, DbConfig};

fn state() -> AppState {
    let db = Database::connect_lazy(&DbConfig::new("mysql://root@127.0.0.1:1/cajas")).unwrap();
    let config = ApiConfig::load_from(Environment::default().source(Some(Map::new()))).unwrap();
    AppState::with_mailer(db, config, Arc::new(DisabledMailer))
}

fn token(state: &AppState, rol: Role) -> String {
    let user = User {
        id: 7,
        nombre: "Lucía Torres".to_string(),
        correo: "lucia@cajas.pe".to_string(),
        rol,
        activo: true,
        created_at: Utc::now(),
    };
    state.jwt.generate_token(&user).unwrap()
}

async fn send(app: Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = build_router(state());
    let (status, body) = send(app, Method::GET, "/api/clientes", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized() {
    let app = build_router(state());
    let (status, _) = send(app, Method::GET, "/api/productos", Some("not.a.token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_from_other_secret_is_unauthorized() {
    let state = state();
    let other = cajas_api::auth::JwtManager::new("otro-secreto".to_string(), 3600);
    let user = User {
        id: 1,
        nombre: "Intruso".to_string(),
        correo: "x@y.pe".to_string(),
        rol: Role::Admin,
        activo: true,
        created_at: Utc::now(),
    };
    let forged = other.generate_token(&user).unwrap();

    let (status, _) = send(build_router(state), Method::GET, "/api/users", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_whoami_echoes_caller() {
    let state = state();
    let token = token(&state, Role::Caja);
    let (status, body) = send(build_router(state), Method::GET, "/api/", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 7);
    assert_eq!(body["rol"], "caja");
}

#[tokio::test]
async fn test_login_requires_fields() {
    let app = build_router(state());
    let (status, body) = send(app, Method::POST, "/api/login", None, Some(json!({ "correo": "" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

// =============================================================================
// Role policies
// =============================================================================

#[tokio::test]
async fn test_vendedor_cannot_list_users() {
    let state = state();
    let token = token(&state, Role::Vendedor);
    let (status, body) = send(build_router(state), Method::GET, "/api/users", Some(&token), None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_caja_cannot_register_sale() {
    let state = state();
    let token = token(&state, Role::Caja);
    let body = json!({ "id_cliente": 1, "productos": [{ "id_producto": 1, "cantidad": 1 }] });
    let (status, _) = send(build_router(state), Method::POST, "/api/ventas/registro", Some(&token), Some(body)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_vendedor_cannot_change_status() {
    let state = state();
    let token = token(&state, Role::Vendedor);
    let body = json!({ "estado": "aprobado" });
    let (status, _) = send(build_router(state), Method::PUT, "/api/ventas/1/estado", Some(&token), Some(body)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_role_is_checked_before_body() {
    let state = state();
    let token = token(&state, Role::Vendedor);
    let (status, _) = send(
        build_router(state),
        Method::POST,
        "/api/productos",
        Some(&token),
        Some(json!({ "nombre": "" })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_empty_search_query() {
    let state = state();
    let token = token(&state, Role::Vendedor);
    let (status, _) = send(build_router(state), Method::GET, "/api/clientes/buscar?q=", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_zone_filter_requires_zona_id() {
    let state = state();
    let token = token(&state, Role::Caja);
    let (status, _) = send(build_router(state), Method::GET, "/api/clientes/zona", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sales_by_day_requires_month_and_year() {
    let state = state();
    let token = token(&state, Role::Admin);
    let (status, body) = send(
        build_router(state),
        Method::GET,
        "/api/reporte/ventas-por-dia?anio=2026",
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Se requiere mes y año");
}

#[tokio::test]
async fn test_monthly_average_requires_year() {
    let state = state();
    let token = token(&state, Role::Admin);
    let (status, _) = send(build_router(state), Method::GET, "/api/reporte/promedio-mensual", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_filter_rejects_malformed_date() {
    let state = state();
    let token = token(&state, Role::Admin);
    let (status, _) = send(
        build_router(state),
        Method::GET,
        "/api/reportes/ventas/filtro?fecha_inicio=15-10-2026",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_client_rejects_bad_dni() {
    let state = state();
    let token = token(&state, Role::Admin);
    let body = json!({
        "tipo_documento": "dni",
        "documento": "123",
        "nombre": "Rosa Quispe",
        "direccion": "Jr. Junín 450"
    });
    let (status, body) = send(build_router(state), Method::POST, "/api/clientes", Some(&token), Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_register_sale_without_products() {
    let state = state();
    let token = token(&state, Role::Vendedor);
    let body = json!({ "id_cliente": 1, "productos": [] });
    let (status, _) = send(build_router(state), Method::POST, "/api/ventas/registro", Some(&token), Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_sale_rejects_zero_quantity() {
    let state = state();
    let token = token(&state, Role::Admin);
    let body = json!({ "id_cliente": 1, "productos": [{ "id_producto": 1, "cantidad": 0 }] });
    let (status, _) = send(build_router(state), Method::POST, "/api/ventas/registro", Some(&token), Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_sale_rejects_oversized_price() {
    let state = state();
    let token = token(&state, Role::Vendedor);
    let body = json!({
        "id_cliente": 1,
        "productos": [{ "id_producto": 1, "cantidad": 9999, "precio_unitario": "90000000000000000" }]
    });
    let (status, body) = send(build_router(state), Method::POST, "/api/ventas/registro", Some(&token), Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_invalid_sale_status() {
    let state = state();
    let token = token(&state, Role::Caja);
    let body = json!({ "estado": "pagado" });
    let (status, _) = send(build_router(state), Method::PUT, "/api/ventas/1/estado", Some(&token), Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_payment_rejects_unknown_document_type() {
    let state = state();
    let token = token(&state, Role::Caja);
    let body = json!({ "id_venta": 1, "tipo_comprobante": "ticket", "metodo_pago": "efectivo" });
    let (status, _) = send(build_router(state), Method::POST, "/api/pagos", Some(&token), Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_numeric_id() {
    let state = state();
    let token = token(&state, Role::Admin);
    let (status, body) = send(build_router(state), Method::GET, "/api/ventas/abc", Some(&token), None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_malformed_json_body() {
    let state = state();
    let token = token(&state, Role::Admin);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/users/register")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{"))
        .unwrap();

    let response = build_router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
