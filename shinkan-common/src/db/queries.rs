//! Read-only query surface
//!
//! Bulk loaders used by the per-pass snapshot plus the accessors the web
//! front-end, API routes and notification component read from. Nothing in
//! here writes.

use crate::db::models::{
    ChapterGuess, ExternalId, LnRelease, MediaItem, UserList, UserListEntry, UserState,
};
use crate::Result;
use chrono::NaiveDate;
use sqlx::SqlitePool;

pub async fn load_media_items(pool: &SqlitePool) -> Result<Vec<MediaItem>> {
    let rows = sqlx::query("SELECT * FROM media_items")
        .fetch_all(pool)
        .await?;
    rows.iter().map(MediaItem::from_row).collect()
}

pub async fn load_external_ids(pool: &SqlitePool) -> Result<Vec<ExternalId>> {
    let rows = sqlx::query("SELECT * FROM external_ids")
        .fetch_all(pool)
        .await?;
    rows.iter().map(ExternalId::from_row).collect()
}

pub async fn load_user_states(pool: &SqlitePool) -> Result<Vec<UserState>> {
    let rows = sqlx::query("SELECT * FROM user_states")
        .fetch_all(pool)
        .await?;
    rows.iter().map(UserState::from_row).collect()
}

pub async fn load_user_lists(pool: &SqlitePool) -> Result<Vec<UserList>> {
    let rows = sqlx::query("SELECT * FROM user_lists")
        .fetch_all(pool)
        .await?;
    rows.iter().map(UserList::from_row).collect()
}

pub async fn load_user_list_entries(pool: &SqlitePool) -> Result<Vec<UserListEntry>> {
    let rows = sqlx::query("SELECT * FROM user_list_entries")
        .fetch_all(pool)
        .await?;
    rows.iter().map(UserListEntry::from_row).collect()
}

pub async fn load_ln_releases(pool: &SqlitePool) -> Result<Vec<LnRelease>> {
    let rows = sqlx::query("SELECT * FROM ln_releases")
        .fetch_all(pool)
        .await?;
    rows.iter().map(LnRelease::from_row).collect()
}

pub async fn load_chapter_guesses(pool: &SqlitePool) -> Result<Vec<ChapterGuess>> {
    let rows = sqlx::query("SELECT * FROM chapter_guesses")
        .fetch_all(pool)
        .await?;
    rows.iter().map(ChapterGuess::from_row).collect()
}

/// Load one media item by storage id
pub async fn media_item(pool: &SqlitePool, id: i64) -> Result<Option<MediaItem>> {
    let row = sqlx::query("SELECT * FROM media_items WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(MediaItem::from_row).transpose()
}

/// All external ids linked to one media item
pub async fn external_ids_for_item(pool: &SqlitePool, media_item_id: i64) -> Result<Vec<ExternalId>> {
    let rows = sqlx::query("SELECT * FROM external_ids WHERE media_item_id = ?")
        .bind(media_item_id)
        .fetch_all(pool)
        .await?;
    rows.iter().map(ExternalId::from_row).collect()
}

/// All of one user's consumption records
pub async fn user_states_for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<UserState>> {
    let rows = sqlx::query("SELECT * FROM user_states WHERE user_id = ?")
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    rows.iter().map(UserState::from_row).collect()
}

/// Contents of one user list
pub async fn user_states_in_list(pool: &SqlitePool, user_list_id: i64) -> Result<Vec<UserState>> {
    let rows = sqlx::query(
        r#"
        SELECT s.* FROM user_states s
        JOIN user_list_entries e ON e.user_state_id = s.id
        WHERE e.user_list_id = ?
        "#,
    )
    .bind(user_list_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(UserState::from_row).collect()
}

/// Light novel releases on or after a date, soonest first
pub async fn ln_releases_from(pool: &SqlitePool, date: NaiveDate) -> Result<Vec<LnRelease>> {
    let rows = sqlx::query("SELECT * FROM ln_releases WHERE release_date >= ? ORDER BY release_date")
        .bind(date.format("%Y-%m-%d").to_string())
        .fetch_all(pool)
        .await?;
    rows.iter().map(LnRelease::from_row).collect()
}

/// Row counts per table, for the ops binary's status output
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreCounts {
    pub media_items: i64,
    pub external_ids: i64,
    pub user_states: i64,
    pub user_lists: i64,
    pub user_list_entries: i64,
    pub ln_releases: i64,
    pub chapter_guesses: i64,
}

pub async fn store_counts(pool: &SqlitePool) -> Result<StoreCounts> {
    async fn count(pool: &SqlitePool, sql: &str) -> Result<i64> {
        Ok(sqlx::query_scalar(sql).fetch_one(pool).await?)
    }

    Ok(StoreCounts {
        media_items: count(pool, "SELECT COUNT(*) FROM media_items").await?,
        external_ids: count(pool, "SELECT COUNT(*) FROM external_ids").await?,
        user_states: count(pool, "SELECT COUNT(*) FROM user_states").await?,
        user_lists: count(pool, "SELECT COUNT(*) FROM user_lists").await?,
        user_list_entries: count(pool, "SELECT COUNT(*) FROM user_list_entries").await?,
        ln_releases: count(pool, "SELECT COUNT(*) FROM ln_releases").await?,
        chapter_guesses: count(pool, "SELECT COUNT(*) FROM chapter_guesses").await?,
    })
}
