//! Database initialization
//!
//! Opens (or creates) the SQLite database, applies connection pragmas and
//! the baseline schema, then runs versioned migrations. Safe to call on
//! every startup; all schema statements are idempotent.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Initialize database connection pool and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Pragmas go through the connect options so every pooled connection
    // gets them, not just the one a PRAGMA statement happens to run on.
    // WAL lets the web routes keep reading while a pass writes.
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    crate::db::migrations::run_migrations(&pool).await?;

    Ok(pool)
}

/// In-memory database for tests.
///
/// A single-connection pool: every connection to `sqlite::memory:` gets its
/// own private database, so the pool must never hand out a second one.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .in_memory(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    crate::db::migrations::run_migrations(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_media_items_table(pool).await?;
    create_external_ids_table(pool).await?;
    create_user_states_table(pool).await?;
    create_user_lists_table(pool).await?;
    create_user_list_entries_table(pool).await?;
    create_ln_releases_table(pool).await?;
    create_chapter_guesses_table(pool).await?;
    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_media_items_table(pool: &SqlitePool) -> Result<()> {
    // The cover URL is part of the uniqueness constraint: titles sharing a
    // name (pre-serialization and serialized runs) are distinct items.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS media_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            media_type TEXT NOT NULL,
            media_subtype TEXT NOT NULL,
            english_title TEXT,
            romaji_title TEXT NOT NULL,
            cover_url TEXT NOT NULL,
            latest_release INTEGER,
            latest_volume_release INTEGER,
            next_episode INTEGER,
            next_episode_airing_time INTEGER,
            releasing_state TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(media_type, media_subtype, romaji_title, cover_url)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_external_ids_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS external_ids (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            media_item_id INTEGER NOT NULL
                REFERENCES media_items(id) ON DELETE CASCADE,
            media_type TEXT NOT NULL,
            service TEXT NOT NULL,
            service_id TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(media_type, service, service_id),
            UNIQUE(media_item_id, service)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_external_ids_item ON external_ids(media_item_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_user_states_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_states (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            external_id_id INTEGER NOT NULL
                REFERENCES external_ids(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL,
            progress INTEGER,
            volume_progress INTEGER,
            score INTEGER,
            consuming_state TEXT NOT NULL,
            UNIQUE(external_id_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_user_states_user ON user_states(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_user_lists_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_lists (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            service TEXT NOT NULL,
            media_type TEXT NOT NULL,
            name TEXT NOT NULL,
            UNIQUE(user_id, service, media_type, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_user_list_entries_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_list_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_list_id INTEGER NOT NULL
                REFERENCES user_lists(id) ON DELETE CASCADE,
            user_state_id INTEGER NOT NULL
                REFERENCES user_states(id) ON DELETE CASCADE,
            UNIQUE(user_list_id, user_state_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_ln_releases_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ln_releases (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            media_item_id INTEGER
                REFERENCES media_items(id) ON DELETE SET NULL,
            series_name TEXT NOT NULL,
            volume TEXT NOT NULL,
            release_date TEXT NOT NULL,
            publisher TEXT,
            purchase_link TEXT,
            digital INTEGER NOT NULL DEFAULT 0,
            physical INTEGER NOT NULL DEFAULT 0,
            UNIQUE(series_name, volume, digital, physical)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_chapter_guesses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chapter_guesses (
            external_id_id INTEGER PRIMARY KEY
                REFERENCES external_ids(id) ON DELETE CASCADE,
            guess INTEGER,
            last_update INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
