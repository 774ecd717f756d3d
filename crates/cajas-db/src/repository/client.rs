//! # Client Repository
//!
//! Buyers of the store. The document number is unique, so a second client
//! with the same DNI/RUC is rejected with [`DbError::UniqueViolation`].
//!
//! ## Search
//! ```text
//! GET /api/clientes/buscar?q=ferre
//!       │
//!       ▼
//! WHERE nombre LIKE '%ferre%' OR documento LIKE 'ferre%'
//!       │                          └ prefix only: documents are typed
//!       ▼                            from the start
//! ORDER BY nombre LIMIT 10
//! ```

use chrono::Utc;
use sqlx::MySqlPool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use cajas_core::{Client, IdentityDocument};

const CLIENT_COLUMNS: &str = "id, tipo_documento, documento, nombre, direccion, telefono, correo, \
                              latitud, longitud, nestrella, cestrella, zone_id, created_at";

/// Validated client fields for insert and update.
#[derive(Debug, Clone)]
pub struct ClientInput {
    pub tipo_documento: IdentityDocument,
    pub documento: String,
    pub nombre: String,
    pub direccion: String,
    pub telefono: Option<String>,
    pub correo: Option<String>,
    pub latitud: Option<f64>,
    pub longitud: Option<f64>,
    pub nestrella: i64,
    pub cestrella: String,
    pub zone_id: Option<i64>,
}

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: MySqlPool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: MySqlPool) -> Self {
        ClientRepository { pool }
    }

    /// Lists all clients alphabetically.
    pub async fn list(&self) -> DbResult<Vec<Client>> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients ORDER BY nombre");
        let clients = sqlx::query_as::<_, Client>(&sql).fetch_all(&self.pool).await?;
        Ok(clients)
    }

    /// Searches clients by name (substring) or document (prefix).
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Client>> {
        debug!(query = %query, limit = limit, "Searching clients");

        let escaped = escape_like(query);
        let sql = format!(
            "SELECT {CLIENT_COLUMNS} FROM clients \
             WHERE nombre LIKE ? OR documento LIKE ? \
             ORDER BY nombre LIMIT ?"
        );
        let clients = sqlx::query_as::<_, Client>(&sql)
            .bind(format!("%{escaped}%"))
            .bind(format!("{escaped}%"))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(clients)
    }

    /// Clients assigned to a zone.
    pub async fn by_zone(&self, zone_id: i64) -> DbResult<Vec<Client>> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE zone_id = ? ORDER BY nombre");
        let clients = sqlx::query_as::<_, Client>(&sql)
            .bind(zone_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(clients)
    }

    /// Gets a client by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Client>> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?");
        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(client)
    }

    /// Creates a client.
    pub async fn insert(&self, input: &ClientInput) -> DbResult<Client> {
        debug!(documento = %input.documento, "Inserting client");

        let result = sqlx::query(
            r#"
            INSERT INTO clients (
                tipo_documento, documento, nombre, direccion, telefono, correo,
                latitud, longitud, nestrella, cestrella, zone_id, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(input.tipo_documento.as_str())
        .bind(&input.documento)
        .bind(&input.nombre)
        .bind(&input.direccion)
        .bind(&input.telefono)
        .bind(&input.correo)
        .bind(input.latitud)
        .bind(input.longitud)
        .bind(input.nestrella)
        .bind(&input.cestrella)
        .bind(input.zone_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id() as i64;
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Cliente", id))
    }

    /// Replaces every editable field of a client.
    ///
    /// MySQL reports zero affected rows when nothing changed, so existence
    /// is decided by re-reading the row.
    pub async fn update(&self, id: i64, input: &ClientInput) -> DbResult<Client> {
        debug!(id = id, "Updating client");

        sqlx::query(
            r#"
            UPDATE clients SET
                tipo_documento = ?, documento = ?, nombre = ?, direccion = ?,
                telefono = ?, correo = ?, latitud = ?, longitud = ?,
                nestrella = ?, cestrella = ?, zone_id = ?
            WHERE id = ?
            "#,
        )
        .bind(input.tipo_documento.as_str())
        .bind(&input.documento)
        .bind(&input.nombre)
        .bind(&input.direccion)
        .bind(&input.telefono)
        .bind(&input.correo)
        .bind(input.latitud)
        .bind(input.longitud)
        .bind(input.nestrella)
        .bind(&input.cestrella)
        .bind(input.zone_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Cliente", id))
    }

    /// Deletes a client. Clients with sales cannot be deleted
    /// ([`DbError::ForeignKeyViolation`]).
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id = id, "Deleting client");

        let result = sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cliente", id));
        }

        Ok(())
    }
}

/// Escapes `LIKE` wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
