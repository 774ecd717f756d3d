//! # Database Migrations
//!
//! Embedded SQL migrations for Cajas POS.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  API Startup / seed binary                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Check _sqlx_migrations table (created on first run)                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Compare embedded migrations vs applied                                │
//! │       │                                                                 │
//! │       ├── 0001_initial_schema.sql   ✓ (already applied)                │
//! │       └── 0002_document_series.sql  ⬜ (NEW - needs to run)             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Run pending migrations in order, record each in _sqlx_migrations      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/mysql/` with the next sequence number
//! 2. Name format: `NNNN_description.sql`
//! 3. **NEVER** modify existing migrations; checksums are verified
//!
//! MySQL commits DDL implicitly, so a migration that fails halfway leaves
//! the tables it already created. Keep one concern per file.

use sqlx::MySqlPool;
use tracing::info;

use crate::error::DbResult;

/// Embedded migrations from the `migrations/mysql` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/mysql");

/// Runs all pending database migrations.
pub async fn run_migrations(pool: &MySqlPool) -> DbResult<()> {
    info!(embedded = MIGRATOR.migrations.len(), "Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(total_migrations, applied_migrations)` for diagnostics.
pub async fn migration_status(pool: &MySqlPool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = TRUE")
        .fetch_one(pool)
        .await?;

    Ok((total, applied as usize))
}
