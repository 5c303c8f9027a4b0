//! User-state upsert
//!
//! Links one user's progress record to the external id the reconciler
//! resolved. Update in place or create; nothing is deleted on this path.
//! Staleness pruning is a separate maintenance pass (see
//! [`crate::maintenance`]).

use crate::intake::PassSummary;
use crate::record::UserStateParams;
use crate::snapshot::Snapshot;
use shinkan_common::Result;
use sqlx::{Sqlite, Transaction};

pub(crate) async fn upsert_user_state(
    tx: &mut Transaction<'_, Sqlite>,
    snapshot: &mut Snapshot,
    external_id_id: i64,
    params: &UserStateParams,
    summary: &mut PassSummary,
) -> Result<i64> {
    let state_id = match snapshot.user_state(external_id_id, params.user_id) {
        Some(state_id) => {
            sqlx::query(
                r#"
                UPDATE user_states SET
                    progress = ?, volume_progress = ?, score = ?, consuming_state = ?
                WHERE id = ?
                "#,
            )
            .bind(params.progress)
            .bind(params.volume_progress)
            .bind(params.score)
            .bind(params.consuming_state.as_str())
            .bind(state_id)
            .execute(&mut **tx)
            .await?;
            state_id
        }
        None => {
            let state_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO user_states (
                    external_id_id, user_id, progress, volume_progress, score,
                    consuming_state
                ) VALUES (?, ?, ?, ?, ?, ?)
                RETURNING id
                "#,
            )
            .bind(external_id_id)
            .bind(params.user_id)
            .bind(params.progress)
            .bind(params.volume_progress)
            .bind(params.score)
            .bind(params.consuming_state.as_str())
            .fetch_one(&mut **tx)
            .await?;
            snapshot.insert_user_state(external_id_id, params.user_id, state_id);
            state_id
        }
    };

    summary.user_states_upserted += 1;
    Ok(state_id)
}
