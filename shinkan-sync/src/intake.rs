//! Intake queues and the reconciliation pass driver
//!
//! Source clients run on independent tasks and push normalized records
//! without coordination; `enqueue` only ever appends under a short-held
//! lock and never touches storage. Draining swaps the buffers out
//! (double-buffer, so producers keep enqueueing while a pass runs) and a
//! separate async pass guard serializes whole passes; partial interleaving
//! of two passes is exactly the double-creation hazard the guard prevents.
//!
//! Each queued record commits in its own transaction. A fatal storage error
//! aborts the remaining queue but leaves already-committed records intact;
//! the scheduler retries on its next tick.

use crate::ln_release::upsert_ln_release;
use crate::lists::{ensure_membership, upsert_user_list};
use crate::reconcile::reconcile_record;
use crate::record::{LnReleaseRecord, SourceRecord};
use crate::snapshot::Snapshot;
use crate::user_state::upsert_user_state;
use shinkan_common::config::SourcePriority;
use shinkan_common::Result;
use sqlx::SqlitePool;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{info, warn};

/// Counters for one reconciliation pass
#[derive(Debug, Default, Clone, Copy)]
pub struct PassSummary {
    pub records_processed: usize,
    pub records_skipped: usize,
    pub items_created: usize,
    pub items_updated: usize,
    pub items_merged: usize,
    pub ids_created: usize,
    pub ids_repointed: usize,
    pub ids_dropped: usize,
    pub user_states_upserted: usize,
    pub list_entries_added: usize,
    pub ln_releases_upserted: usize,
}

#[derive(Debug, Default)]
struct IntakeBuffers {
    records: Vec<SourceRecord>,
    ln_releases: Vec<LnReleaseRecord>,
}

/// The reconciliation engine: intake queues plus the drive loop.
///
/// One instance per process; scrapers enqueue, the scheduler calls
/// [`SyncEngine::drain_and_process`].
#[derive(Debug)]
pub struct SyncEngine {
    pool: SqlitePool,
    priority: SourcePriority,
    queue: Mutex<IntakeBuffers>,
    pass_guard: tokio::sync::Mutex<()>,
}

impl SyncEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_priority(pool, SourcePriority::default())
    }

    pub fn with_priority(pool: SqlitePool, priority: SourcePriority) -> Self {
        Self {
            pool,
            priority,
            queue: Mutex::new(IntakeBuffers::default()),
            pass_guard: tokio::sync::Mutex::new(()),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Queue one normalized media record. Validates the record shape at the
    /// boundary and returns immediately; never blocks on storage I/O.
    pub fn enqueue(&self, record: SourceRecord) -> Result<()> {
        record.validate()?;
        self.queue.lock().unwrap().records.push(record);
        Ok(())
    }

    /// Queue one light novel release record.
    pub fn enqueue_ln_release(&self, record: LnReleaseRecord) -> Result<()> {
        record.validate()?;
        self.queue.lock().unwrap().ln_releases.push(record);
        Ok(())
    }

    /// Number of queued (media, ln-release) records awaiting the next pass
    pub fn pending(&self) -> (usize, usize) {
        let queue = self.queue.lock().unwrap();
        (queue.records.len(), queue.ln_releases.len())
    }

    /// Drain both queues and reconcile every record, FIFO.
    ///
    /// Serialized against concurrent passes; producers may keep enqueueing
    /// while this runs. Returns the pass counters, or the first fatal error.
    pub async fn drain_and_process(&self) -> Result<PassSummary> {
        let _pass = self.pass_guard.lock().await;

        let (records, ln_records) = {
            let mut queue = self.queue.lock().unwrap();
            (
                std::mem::take(&mut queue.records),
                std::mem::take(&mut queue.ln_releases),
            )
        };

        let mut summary = PassSummary::default();
        if records.is_empty() && ln_records.is_empty() {
            return Ok(summary);
        }

        let started = Instant::now();
        info!(
            "Starting reconciliation pass: {} media records, {} ln releases",
            records.len(),
            ln_records.len()
        );

        let mut snapshot = Snapshot::load(&self.pool).await?;

        for record in &records {
            match self.process_record(&mut snapshot, record, &mut summary).await {
                Ok(()) => summary.records_processed += 1,
                Err(e) if e.is_recoverable() => {
                    warn!("Skipping record '{}': {e}", record.item.romaji_title);
                    summary.records_skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        for record in &ln_records {
            let mut tx = self.pool.begin().await?;
            upsert_ln_release(&mut tx, &mut snapshot, record, &mut summary).await?;
            tx.commit().await?;
        }

        info!(
            "Finished reconciliation pass in {:?}: {} processed, {} skipped, \
             {} items created, {} merged",
            started.elapsed(),
            summary.records_processed,
            summary.records_skipped,
            summary.items_created,
            summary.items_merged
        );

        Ok(summary)
    }

    /// One record, one transaction.
    async fn process_record(
        &self,
        snapshot: &mut Snapshot,
        record: &SourceRecord,
        summary: &mut PassSummary,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // The recoverable missing-anchor reject happens on the first line
        // of reconcile_record, before any write or snapshot mutation, so a
        // skipped record leaves no trace

        let anchor_external_id =
            reconcile_record(&mut tx, snapshot, &self.priority, record, summary).await?;

        if let Some(state_params) = &record.user_state {
            let state_id = upsert_user_state(
                &mut tx,
                snapshot,
                anchor_external_id,
                state_params,
                summary,
            )
            .await?;

            if let Some(list_params) = &record.user_list {
                let list_id = upsert_user_list(&mut tx, snapshot, list_params).await?;
                ensure_membership(&mut tx, snapshot, list_id, state_id, summary).await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }
}
