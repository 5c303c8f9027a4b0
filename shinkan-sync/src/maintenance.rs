//! Maintenance passes outside the per-record path
//!
//! Stale user states are only removed here, never during reconciliation: a
//! full list refresh for one (user, service, category) establishes the set
//! of identifiers the user still tracks, and everything outside that set is
//! pruned. Chapter-guess bookkeeping also lives here; the guessing client
//! itself is an external collaborator; this module only stores its results
//! and says which guesses are due.

use shinkan_common::db::models::{ChapterGuess, ExternalId};
use shinkan_common::enums::{ListService, MediaType};
use shinkan_common::Result;
use sqlx::SqlitePool;
use std::collections::HashSet;
use tracing::info;

/// Remove a user's states for titles missing from a full list refresh.
///
/// `fresh_external_ids` holds the external id rows the refresh confirmed;
/// states for the same (user, service, category) outside that set are
/// deleted, list memberships cascading with them. Returns the pruned count.
pub async fn prune_stale_user_states(
    pool: &SqlitePool,
    user_id: i64,
    service: ListService,
    media_type: MediaType,
    fresh_external_ids: &HashSet<i64>,
) -> Result<u64> {
    let states: Vec<(i64, i64)> = sqlx::query_as(
        r#"
        SELECT s.id, s.external_id_id FROM user_states s
        JOIN external_ids e ON e.id = s.external_id_id
        WHERE s.user_id = ? AND e.service = ? AND e.media_type = ?
        "#,
    )
    .bind(user_id)
    .bind(service.as_str())
    .bind(media_type.as_str())
    .fetch_all(pool)
    .await?;

    let mut tx = pool.begin().await?;
    let mut pruned = 0u64;
    for (state_id, external_id_id) in states {
        if !fresh_external_ids.contains(&external_id_id) {
            sqlx::query("DELETE FROM user_states WHERE id = ?")
                .bind(state_id)
                .execute(&mut *tx)
                .await?;
            pruned += 1;
        }
    }
    tx.commit().await?;

    if pruned > 0 {
        info!("Pruned {pruned} stale user states for user {user_id} on {service}");
    }
    Ok(pruned)
}

/// A chapter guess due for refresh, with the identifier it belongs to
#[derive(Debug, Clone)]
pub struct StaleGuess {
    pub external_id: ExternalId,
    pub guess: ChapterGuess,
}

/// List the manga identifiers whose chapter guess is older than the
/// refresh interval.
///
/// Guess rows are created lazily here for manga identifiers that have none
/// yet, so a freshly reconciled title shows up as stale immediately.
pub async fn stale_chapter_guesses(pool: &SqlitePool, now: i64) -> Result<Vec<StaleGuess>> {
    sqlx::query(
        r#"
        INSERT INTO chapter_guesses (external_id_id, guess, last_update)
        SELECT e.id, NULL, 0 FROM external_ids e
        WHERE e.media_type = 'manga'
          AND NOT EXISTS (
              SELECT 1 FROM chapter_guesses g WHERE g.external_id_id = e.id
          )
        "#,
    )
    .execute(pool)
    .await?;

    let rows = sqlx::query(
        r#"
        SELECT e.id, e.media_item_id, e.media_type, e.service, e.service_id,
               g.external_id_id, g.guess, g.last_update
        FROM chapter_guesses g
        JOIN external_ids e ON e.id = g.external_id_id
        WHERE ? - g.last_update > ?
        "#,
    )
    .bind(now)
    .bind(ChapterGuess::REFRESH_INTERVAL_SECS)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(StaleGuess {
                external_id: ExternalId::from_row(row)?,
                guess: ChapterGuess::from_row(row)?,
            })
        })
        .collect()
}

/// Store an externally computed chapter guess.
pub async fn record_chapter_guess(
    pool: &SqlitePool,
    external_id_id: i64,
    guess: Option<i64>,
    now: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO chapter_guesses (external_id_id, guess, last_update)
        VALUES (?, ?, ?)
        ON CONFLICT(external_id_id) DO UPDATE SET
            guess = excluded.guess,
            last_update = excluded.last_update
        "#,
    )
    .bind(external_id_id)
    .bind(guess)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load one chapter guess, if present.
pub async fn chapter_guess(pool: &SqlitePool, external_id_id: i64) -> Result<Option<ChapterGuess>> {
    let row = sqlx::query("SELECT * FROM chapter_guesses WHERE external_id_id = ?")
        .bind(external_id_id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(ChapterGuess::from_row).transpose()
}
