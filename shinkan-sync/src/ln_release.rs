//! Light novel release upsert
//!
//! Drained from the second intake queue in the same pass, after the media
//! item records, so a release can link against identifiers that were just
//! created. The link is resolved through the first supplied (service, id)
//! pair that matches an existing manga external id.

use crate::intake::PassSummary;
use crate::record::LnReleaseRecord;
use crate::snapshot::{LnEntry, Snapshot};
use shinkan_common::db::models::{IdKey, LnKey};
use shinkan_common::enums::MediaType;
use shinkan_common::Result;
use sqlx::{Sqlite, Transaction};
use tracing::debug;

pub(crate) async fn upsert_ln_release(
    tx: &mut Transaction<'_, Sqlite>,
    snapshot: &mut Snapshot,
    record: &LnReleaseRecord,
    summary: &mut PassSummary,
) -> Result<i64> {
    let release = &record.release;

    debug!(
        "Upserting ln release '{} volume {}'",
        release.series_name, release.volume
    );

    let mut media_item_id: Option<i64> = None;
    for (service, service_id) in record.ordered_pairs() {
        let key: IdKey = (MediaType::Manga, service, service_id.to_string());
        if let Some(entry) = snapshot.external_id(&key) {
            media_item_id = Some(entry.media_item_id);
            break;
        }
    }

    let key: LnKey = (
        release.series_name.clone(),
        release.volume.clone(),
        release.digital,
        release.physical,
    );

    let id = match snapshot.ln_release(&key) {
        None => {
            let id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO ln_releases (
                    media_item_id, series_name, volume, release_date,
                    publisher, purchase_link, digital, physical
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                RETURNING id
                "#,
            )
            .bind(media_item_id)
            .bind(&release.series_name)
            .bind(&release.volume)
            .bind(&release.release_date)
            .bind(&release.publisher)
            .bind(&release.purchase_link)
            .bind(release.digital)
            .bind(release.physical)
            .fetch_one(&mut **tx)
            .await?;
            snapshot.insert_ln_release(key, LnEntry { id, media_item_id });
            id
        }
        Some(entry) => {
            // An already-linked release never loses its link to a record
            // that could not resolve one
            let linked = media_item_id.or(entry.media_item_id);
            sqlx::query(
                r#"
                UPDATE ln_releases SET
                    media_item_id = ?, release_date = ?, publisher = ?,
                    purchase_link = ?
                WHERE id = ?
                "#,
            )
            .bind(linked)
            .bind(&release.release_date)
            .bind(&release.publisher)
            .bind(&release.purchase_link)
            .bind(entry.id)
            .execute(&mut **tx)
            .await?;
            snapshot.set_ln_release_item(&key, linked);
            entry.id
        }
    };

    summary.ln_releases_upserted += 1;
    Ok(id)
}
