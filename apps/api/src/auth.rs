//! JWT authentication module.
//!
//! Handles token generation and validation, password hashing, and the
//! extractors that guard every `/api/*` route.
//!
//! ## Request Flow
//! ```text
//! Authorization: Bearer <jwt>
//!        │
//!        ▼
//! AuthUser extractor ── missing / invalid / expired ──► 401
//!        │
//!        ▼
//! Authorized<P> ── role not in P::ROLES ──► 403
//!        │
//!        ▼
//! handler
//! ```

use std::marker::PhantomData;
use std::ops::Deref;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;
use cajas_core::{Role, User};

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: i64,

    pub nombre: String,

    pub rol: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: String, lifetime_secs: i64) -> Self {
        JwtManager { secret, lifetime_secs }
    }

    /// Generate a session token for a user.
    pub fn generate_token(&self, user: &User) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: user.id,
            nombre: user.nombre.clone(),
            rol: user.rol,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> ApiResult<Claims> {
        let validation = Validation::default();

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|_| ApiError::unauthorized("Token inválido o expirado"))?;

        Ok(token_data.claims)
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// =============================================================================
// Passwords
// =============================================================================

/// Hashes a password for a new account (argon2id, random salt).
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))
}

/// Verifies a password against a stored hash.
///
/// Accounts created before the migration carry bcrypt hashes (`$2a$`,
/// `$2b$`, `$2y$`); new ones use argon2. Unknown formats never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    if stored.starts_with("$2") {
        return bcrypt::verify(password, stored).unwrap_or(false);
    }

    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_off_thread(password: &str) -> ApiResult<String> {
    tokio::task::spawn_blocking({
        let password = password.to_string();
        move || hash_password(&password)
    })
    .await
    .map_err(|e| ApiError::internal(format!("Password hashing task failed: {}", e)))?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_off_thread(password: &str, stored: &str) -> ApiResult<bool> {
    tokio::task::spawn_blocking({
        let password = password.to_string();
        let stored = stored.to_string();
        move || verify_password(&password, &stored)
    })
    .await
    .map_err(|e| ApiError::internal(format!("Password verification task failed: {}", e)))
}

// =============================================================================
// Extractors
// =============================================================================

/// The caller, decoded from a valid bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub id: i64,
    pub nombre: String,
    pub rol: Role,
}

impl AuthUser {
    /// Fails with 403 unless the caller has one of `roles`.
    pub fn require(&self, roles: &[Role]) -> ApiResult<()> {
        if roles.contains(&self.rol) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Acceso denegado: rol insuficiente"))
        }
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        AuthUser {
            id: claims.sub,
            nombre: claims.nombre,
            rol: claims.rol,
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Token no proporcionado"))?;

        let token = extract_bearer_token(header).ok_or_else(|| ApiError::unauthorized("Token no proporcionado"))?;

        let claims = state.jwt.validate_token(token)?;
        Ok(claims.into())
    }
}

/// A set of roles allowed on a route.
pub trait Policy: Send + Sync + 'static {
    const ROLES: &'static [Role];
}

/// User management.
pub struct AdminOnly;

/// Client maintenance, payments, status changes.
pub struct Cashier;

/// Sales registration and sale history.
pub struct Seller;

impl Policy for AdminOnly {
    const ROLES: &'static [Role] = &[Role::Admin];
}

impl Policy for Cashier {
    const ROLES: &'static [Role] = &[Role::Admin, Role::Caja];
}

impl Policy for Seller {
    const ROLES: &'static [Role] = &[Role::Admin, Role::Vendedor];
}

/// An [`AuthUser`] whose role is allowed by `P`.
///
/// Place it first among a handler's extractors so role checks run before
/// the body is parsed.
pub struct Authorized<P: Policy> {
    user: AuthUser,
    _policy: PhantomData<P>,
}

impl<P: Policy> Deref for Authorized<P> {
    type Target = AuthUser;

    fn deref(&self) -> &AuthUser {
        &self.user
    }
}

impl<P: Policy> FromRequestParts<AppState> for Authorized<P> {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        user.require(P::ROLES)?;
        Ok(Authorized {
            user,
            _policy: PhantomData,
        })
    }
}
