//! Anchor matching and merge
//!
//! Resolves each queued record against the snapshot, creating or updating
//! media items and external ids, and unifying canonical rows that turn out
//! to describe the same title. All writes go through the caller's
//! transaction; the snapshot is mutated in lockstep so later records in the
//! same pass observe earlier ones.
//!
//! Resolution order per record:
//! 1. Look the anchor service's id up in the id index; fall back to any
//!    other supplied (service, id) pair.
//! 2. Anchor hit: overwrite the item's mutable fields in place (the source
//!    is trusted to be current). No hit: match by the item natural key and
//!    update, or create and persist immediately so the new row has a
//!    storage id before identifiers reference it.
//! 3. Bind every supplied (service, id) pair to the resolved item. A pair
//!    already bound to a different item triggers duplicate suppression:
//!    the item reachable through the best-ranked service survives, the
//!    other row's identifiers are re-pointed, and the empty row is deleted.
//!
//! Items sharing no service id are never merged, even with identical
//! metadata. Fuzzy title matching is out of scope; the natural-key match in
//! step 2 only unifies records whose category, subtype, title and cover all
//! coincide.

use crate::intake::PassSummary;
use crate::record::{MediaItemParams, SourceRecord};
use crate::snapshot::Snapshot;
use shinkan_common::config::SourcePriority;
use shinkan_common::db::models::{IdKey, ItemKey};
use shinkan_common::enums::ListService;
use shinkan_common::{Error, Result};
use sqlx::{Sqlite, Transaction};
use tracing::{debug, info, warn};

fn item_key(params: &MediaItemParams) -> ItemKey {
    (
        params.media_type,
        params.media_subtype,
        params.romaji_title.clone(),
        params.cover_url.clone(),
    )
}

/// Reconcile one record and return the external id row of its anchor
/// service, for the user-state upserter.
pub(crate) async fn reconcile_record(
    tx: &mut Transaction<'_, Sqlite>,
    snapshot: &mut Snapshot,
    priority: &SourcePriority,
    record: &SourceRecord,
    summary: &mut PassSummary,
) -> Result<i64> {
    let anchor_id = record.anchor_id()?;
    let media_type = record.item.media_type;
    let pairs = record.ordered_pairs();

    debug!(
        "Reconciling '{}' ({} service ids)",
        record.item.romaji_title,
        pairs.len()
    );

    // Step 1: anchor lookup, falling back to the other supplied pairs.
    // Any hit anchors the item even though the anchor service's own id may
    // be new.
    let anchor_key: IdKey = (media_type, record.anchor_service, anchor_id.to_string());
    let mut anchor_item = snapshot.external_id(&anchor_key).map(|e| e.media_item_id);
    if anchor_item.is_none() {
        for (service, service_id) in &pairs {
            let key: IdKey = (media_type, *service, (*service_id).to_string());
            if let Some(entry) = snapshot.external_id(&key) {
                anchor_item = Some(entry.media_item_id);
                break;
            }
        }
    }

    // Step 2: resolve or create the media item
    let mut item_id = match anchor_item {
        Some(id) => {
            update_item(tx, snapshot, id, &record.item).await?;
            summary.items_updated += 1;
            id
        }
        None => {
            let key = item_key(&record.item);
            match snapshot.item_by_key(&key) {
                Some(id) => {
                    // Already known under a different service's identifier,
                    // matched purely by the natural key
                    update_item(tx, snapshot, id, &record.item).await?;
                    summary.items_updated += 1;
                    id
                }
                None => {
                    let id = insert_item(tx, snapshot, &record.item).await?;
                    summary.items_created += 1;
                    id
                }
            }
        }
    };

    // Step 3: resolve or create every supplied external id
    for (service, service_id) in &pairs {
        let key: IdKey = (media_type, *service, (*service_id).to_string());
        match snapshot.external_id(&key) {
            Some(entry) if entry.media_item_id != item_id => {
                // Two existing rows claim this title; unify them.
                let survivor =
                    merge_items(tx, snapshot, priority, item_id, entry.media_item_id, summary)
                        .await?;
                if survivor != item_id {
                    update_item(tx, snapshot, survivor, &record.item).await?;
                    item_id = survivor;
                }
            }
            Some(_) => {
                // Already bound to the resolved item
            }
            None => {
                if snapshot.item_service_id(item_id, *service).is_none() {
                    insert_external_id(tx, snapshot, item_id, &key).await?;
                    summary.ids_created += 1;
                }
                // else: the item already holds an id for this service under
                // a different service-native id; the existing link wins
            }
        }
    }

    snapshot
        .item_service_id(item_id, record.anchor_service)
        .ok_or_else(|| {
            Error::Internal(format!(
                "anchor id missing after reconciliation of item {item_id}"
            ))
        })
}

async fn insert_item(
    tx: &mut Transaction<'_, Sqlite>,
    snapshot: &mut Snapshot,
    params: &MediaItemParams,
) -> Result<i64> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO media_items (
            media_type, media_subtype, english_title, romaji_title, cover_url,
            latest_release, latest_volume_release, next_episode,
            next_episode_airing_time, releasing_state
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(params.media_type.as_str())
    .bind(params.media_subtype.as_str())
    .bind(&params.english_title)
    .bind(&params.romaji_title)
    .bind(&params.cover_url)
    .bind(params.latest_release)
    .bind(params.latest_volume_release)
    .bind(params.next_episode)
    .bind(params.next_episode_airing_time)
    .bind(params.releasing_state.as_str())
    .fetch_one(&mut **tx)
    .await?;

    snapshot.insert_item(id, item_key(params));
    debug!("Created media item '{}' (id {id})", params.romaji_title);
    Ok(id)
}

/// Overwrite an item's mutable fields from the payload, re-keying the index
/// entry when the natural key changed (e.g. a title correction).
async fn update_item(
    tx: &mut Transaction<'_, Sqlite>,
    snapshot: &mut Snapshot,
    id: i64,
    params: &MediaItemParams,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE media_items SET
            media_type = ?, media_subtype = ?, english_title = ?,
            romaji_title = ?, cover_url = ?, latest_release = ?,
            latest_volume_release = ?, next_episode = ?,
            next_episode_airing_time = ?, releasing_state = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(params.media_type.as_str())
    .bind(params.media_subtype.as_str())
    .bind(&params.english_title)
    .bind(&params.romaji_title)
    .bind(&params.cover_url)
    .bind(params.latest_release)
    .bind(params.latest_volume_release)
    .bind(params.next_episode)
    .bind(params.next_episode_airing_time)
    .bind(params.releasing_state.as_str())
    .bind(id)
    .execute(&mut **tx)
    .await?;

    snapshot.rekey_item(id, item_key(params));
    Ok(())
}

async fn insert_external_id(
    tx: &mut Transaction<'_, Sqlite>,
    snapshot: &mut Snapshot,
    media_item_id: i64,
    key: &IdKey,
) -> Result<i64> {
    let (media_type, service, service_id) = key;
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO external_ids (media_item_id, media_type, service, service_id)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(media_item_id)
    .bind(media_type.as_str())
    .bind(service.as_str())
    .bind(service_id)
    .fetch_one(&mut **tx)
    .await?;

    snapshot.insert_external_id(id, key.clone(), media_item_id);
    Ok(id)
}

/// Unify two media items that both claim identifiers for one title.
///
/// The item reachable through the best-ranked service (per the configured
/// source priority) survives; ties keep the item the record resolved to.
/// Every identifier of the loser is re-pointed at the survivor, except
/// where the survivor already holds that service. Keeping both would give
/// one item two ids for the same service, so the loser's row is dropped
/// (its user states cascade). The loser's row is deleted once nothing
/// references it.
async fn merge_items(
    tx: &mut Transaction<'_, Sqlite>,
    snapshot: &mut Snapshot,
    priority: &SourcePriority,
    resolved: i64,
    other: i64,
    summary: &mut PassSummary,
) -> Result<i64> {
    let resolved_rank = priority.best_rank(snapshot.services_of_item(resolved));
    let other_rank = priority.best_rank(snapshot.services_of_item(other));
    let (survivor, loser) = if other_rank < resolved_rank {
        (other, resolved)
    } else {
        (resolved, other)
    };

    info!("Merging duplicate media items: keeping {survivor}, retiring {loser}");

    let loser_ids: Vec<(ListService, i64)> = ListService::ALL
        .iter()
        .filter_map(|s| snapshot.item_service_id(loser, *s).map(|id| (*s, id)))
        .collect();

    for (service, external_id) in loser_ids {
        if snapshot.item_service_id(survivor, service).is_some() {
            warn!(
                "Dropping conflicting {service} id of retired item {loser}: \
                 survivor {survivor} already holds one"
            );
            sqlx::query("DELETE FROM external_ids WHERE id = ?")
                .bind(external_id)
                .execute(&mut **tx)
                .await?;
            snapshot.remove_external_id(external_id);
            summary.ids_dropped += 1;
        } else {
            sqlx::query("UPDATE external_ids SET media_item_id = ? WHERE id = ?")
                .bind(survivor)
                .bind(external_id)
                .execute(&mut **tx)
                .await?;
            snapshot.repoint_external_id(external_id, survivor);
            summary.ids_repointed += 1;
        }
    }

    // Release links follow the survivor instead of going NULL with the
    // deleted row
    sqlx::query("UPDATE ln_releases SET media_item_id = ? WHERE media_item_id = ?")
        .bind(survivor)
        .bind(loser)
        .execute(&mut **tx)
        .await?;
    snapshot.repoint_ln_releases(loser, survivor);

    sqlx::query("DELETE FROM media_items WHERE id = ?")
        .bind(loser)
        .execute(&mut **tx)
        .await?;
    snapshot.remove_item(loser);
    summary.items_merged += 1;

    Ok(survivor)
}
