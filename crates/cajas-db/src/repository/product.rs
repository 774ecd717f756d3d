//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD for the catalog
//! - Row locking for the sale transaction
//!
//! ## Stock Locking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Two sellers sell the last 3 bags of cement at the same time            │
//! │                                                                         │
//! │  Tx A: SELECT … FROM products WHERE id = 7 FOR UPDATE  → stock 3       │
//! │  Tx B: SELECT … FROM products WHERE id = 7 FOR UPDATE  → (waits)       │
//! │  Tx A: UPDATE products SET stock = stock - 3 … COMMIT                   │
//! │  Tx B:                                                 → stock 0       │
//! │        price_line() → InsufficientStock → ROLLBACK                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{MySqlConnection, MySqlPool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use cajas_core::Product;

const PRODUCT_COLUMNS: &str =
    "id, nombre, descripcion, categoria, price_cents, stock, unidad_medida, activo, created_at, updated_at";

/// Validated product fields for insert and update.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub nombre: String,
    pub descripcion: Option<String>,
    pub categoria: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    pub unidad_medida: String,
    pub activo: bool,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: MySqlPool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: MySqlPool) -> Self {
        ProductRepository { pool }
    }

    /// Lists the whole catalog, active and inactive, by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY nombre");
        let products = sqlx::query_as::<_, Product>(&sql).fetch_all(&self.pool).await?;
        Ok(products)
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Inserts a new product.
    pub async fn insert(&self, input: &ProductInput) -> DbResult<Product> {
        debug!(nombre = %input.nombre, price_cents = input.price_cents, "Inserting product");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO products (
                nombre, descripcion, categoria, price_cents, stock,
                unidad_medida, activo, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.nombre)
        .bind(&input.descripcion)
        .bind(&input.categoria)
        .bind(input.price_cents)
        .bind(input.stock)
        .bind(&input.unidad_medida)
        .bind(input.activo)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id() as i64;
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Producto", id))
    }

    /// Updates a product.
    ///
    /// Price changes never touch existing sales: sale lines keep their own
    /// price snapshot.
    pub async fn update(&self, id: i64, input: &ProductInput) -> DbResult<Product> {
        debug!(id = id, "Updating product");

        sqlx::query(
            r#"
            UPDATE products SET
                nombre = ?, descripcion = ?, categoria = ?, price_cents = ?,
                stock = ?, unidad_medida = ?, activo = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.nombre)
        .bind(&input.descripcion)
        .bind(&input.categoria)
        .bind(input.price_cents)
        .bind(input.stock)
        .bind(&input.unidad_medida)
        .bind(input.activo)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Producto", id))
    }

    /// Counts products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Reads and locks a product row inside an open transaction.
pub(crate) async fn fetch_for_update(conn: &mut MySqlConnection, id: i64) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ? FOR UPDATE");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(product)
}
