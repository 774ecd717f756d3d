//! # User Repository
//!
//! Accounts for sellers, cashiers and administrators. Password hashes are
//! only read by [`UserRepository::find_credentials`]; every other query
//! returns [`User`], which has no hash field.

use chrono::Utc;
use sqlx::MySqlPool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use cajas_core::{Role, User};

const USER_COLUMNS: &str = "id, nombre, correo, rol, activo, created_at";

/// A user row together with its password hash, for login.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub user: User,
    pub password: String,
}

/// Data for a new account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub nombre: String,
    pub correo: String,
    pub password_hash: String,
    pub rol: Role,
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: MySqlPool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: MySqlPool) -> Self {
        UserRepository { pool }
    }

    /// Looks up a user by email, including the password hash.
    pub async fn find_credentials(&self, correo: &str) -> DbResult<Option<UserCredentials>> {
        debug!(correo = %correo, "Loading credentials");

        let sql = format!("SELECT {USER_COLUMNS}, password FROM users WHERE correo = ?");
        let row = sqlx::query_as::<_, UserCredentials>(&sql)
            .bind(correo)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// Lists all users, newest first.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id DESC");
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?;
        Ok(users)
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Creates a user. A duplicate email surfaces as
    /// [`DbError::UniqueViolation`].
    pub async fn insert(&self, new_user: &NewUser) -> DbResult<User> {
        debug!(correo = %new_user.correo, rol = %new_user.rol, "Inserting user");

        let result = sqlx::query(
            r#"
            INSERT INTO users (nombre, correo, password, rol, activo, created_at)
            VALUES (?, ?, ?, ?, TRUE, ?)
            "#,
        )
        .bind(&new_user.nombre)
        .bind(&new_user.correo)
        .bind(&new_user.password_hash)
        .bind(new_user.rol.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id() as i64;
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Usuario", id))
    }

    /// Counts users. The seed binary uses it to detect an existing dataset.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
