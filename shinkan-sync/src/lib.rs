//! # shinkan Sync Engine
//!
//! The identity-reconciliation and upsert core. Source clients push
//! normalized records onto the intake queues; a scheduler drives
//! [`SyncEngine::drain_and_process`], which resolves every record against a
//! per-pass snapshot of the store, creating or updating canonical media
//! items, their external identifiers, and the per-user state and list rows
//! hanging off them, without duplicating canonical rows and without
//! breaking identifier links once made.

pub mod intake;
pub mod maintenance;
pub mod record;

mod ln_release;
mod lists;
mod reconcile;
mod snapshot;
mod user_state;

pub use intake::{PassSummary, SyncEngine};
pub use record::{
    LnReleaseParams, LnReleaseRecord, MediaItemParams, SourceRecord, UserListParams,
    UserStateParams,
};
