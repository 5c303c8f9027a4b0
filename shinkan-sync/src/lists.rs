//! List upsert
//!
//! Resolves or creates the named per-user list a state belongs to, then
//! adds the membership. Membership is idempotent: re-adding a state already
//! in the list is a no-op, checked against the snapshot's pair set before
//! any insert.

use crate::intake::PassSummary;
use crate::record::UserListParams;
use crate::snapshot::Snapshot;
use shinkan_common::db::models::ListKey;
use shinkan_common::Result;
use sqlx::{Sqlite, Transaction};

pub(crate) async fn upsert_user_list(
    tx: &mut Transaction<'_, Sqlite>,
    snapshot: &mut Snapshot,
    params: &UserListParams,
) -> Result<i64> {
    let key: ListKey = (
        params.user_id,
        params.service,
        params.media_type,
        params.name.clone(),
    );

    if let Some(list_id) = snapshot.list_by_key(&key) {
        return Ok(list_id);
    }

    let list_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO user_lists (user_id, service, media_type, name)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(params.user_id)
    .bind(params.service.as_str())
    .bind(params.media_type.as_str())
    .bind(&params.name)
    .fetch_one(&mut **tx)
    .await?;

    snapshot.insert_list(list_id, key);
    Ok(list_id)
}

pub(crate) async fn ensure_membership(
    tx: &mut Transaction<'_, Sqlite>,
    snapshot: &mut Snapshot,
    user_list_id: i64,
    user_state_id: i64,
    summary: &mut PassSummary,
) -> Result<()> {
    if snapshot.membership_exists(user_list_id, user_state_id) {
        return Ok(());
    }

    sqlx::query("INSERT INTO user_list_entries (user_list_id, user_state_id) VALUES (?, ?)")
        .bind(user_list_id)
        .bind(user_state_id)
        .execute(&mut **tx)
        .await?;

    snapshot.insert_membership(user_list_id, user_state_id);
    summary.list_entries_added += 1;
    Ok(())
}
