//! # Schema Migrations
//!
//! The SQL under `migrations/sqlite/` is compiled into the binary, so a
//! fresh install needs no files beside the executable.
//!
//! ```text
//! Database::new ──► MIGRATOR.run(pool)
//!                     │
//!                     ├── _sqlx_migrations missing? create it
//!                     ├── 001_initial_schema.sql  products, orders, line_items
//!                     └── each pending file runs in its own transaction
//! ```
//!
//! Applied files are checksummed. Changing one after release makes every
//! existing store refuse to open, so schema changes go in a new
//! `NNN_description.sql`.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies whatever is pending. Safe to call on an up-to-date store.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Applying schema migrations");
    MIGRATOR.run(pool).await?;
    info!("Schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;

    Ok((MIGRATOR.migrations.len(), applied as usize))
}
