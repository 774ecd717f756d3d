//! Sales zones.

use sqlx::MySqlPool;

use crate::error::{DbError, DbResult};
use cajas_core::Zone;

#[derive(Debug, Clone)]
pub struct ZoneRepository {
    pool: MySqlPool,
}

impl ZoneRepository {
    pub fn new(pool: MySqlPool) -> Self {
        ZoneRepository { pool }
    }

    /// Lists zones alphabetically.
    pub async fn list(&self) -> DbResult<Vec<Zone>> {
        let zones = sqlx::query_as::<_, Zone>("SELECT id, nombre FROM zones ORDER BY nombre")
            .fetch_all(&self.pool)
            .await?;
        Ok(zones)
    }

    pub async fn insert(&self, nombre: &str) -> DbResult<Zone> {
        let result = sqlx::query("INSERT INTO zones (nombre) VALUES (?)")
            .bind(nombre)
            .execute(&self.pool)
            .await?;

        let id = result.last_insert_id() as i64;
        sqlx::query_as::<_, Zone>("SELECT id, nombre FROM zones WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Zona", id))
    }
}
