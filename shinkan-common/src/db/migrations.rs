//! Database schema migrations
//!
//! Versioned, idempotent migrations tracked through the `schema_version`
//! table. New installs get the full baseline schema from
//! [`crate::db::init::create_schema`] and then have every migration applied
//! on top; migrations therefore check before altering.

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Get current schema version from database
///
/// Returns 0 if the schema_version table has no rows.
async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
    }

    Ok(())
}

/// v1: airing-schedule columns on media_items.
///
/// Databases created before the notification component consumed airing
/// times lack these columns; new installs already have them from the
/// baseline schema.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    for column in ["next_episode", "next_episode_airing_time"] {
        let has_column: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pragma_table_info('media_items') WHERE name = ?",
        )
        .bind(column)
        .fetch_one(pool)
        .await?;

        if has_column == 0 {
            let sql = format!("ALTER TABLE media_items ADD COLUMN {column} INTEGER");
            sqlx::query(&sql).execute(pool).await?;
            info!("Migration v1: added {column} to media_items");
        }
    }

    Ok(())
}
