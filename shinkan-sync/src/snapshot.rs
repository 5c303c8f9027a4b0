//! Per-pass snapshot of the persistent store
//!
//! One bulk `SELECT` per table, loaded into hash-map indexes keyed by the
//! natural identifier tuples. The reconciler never queries the store inside
//! the per-record loop; it reads these indexes and mutates them in lockstep
//! with every write it issues, so a pass stays sub-linear in round trips.
//!
//! A snapshot is built once per drain pass and discarded afterwards.

use shinkan_common::db::models::{IdKey, ItemKey, ListKey, LnKey};
use shinkan_common::db::queries;
use shinkan_common::enums::ListService;
use shinkan_common::Result;
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};

/// Index entry for one external id row
#[derive(Debug, Clone, Copy)]
pub struct IdEntry {
    pub id: i64,
    pub media_item_id: i64,
}

/// Index entry for one light novel release row
#[derive(Debug, Clone, Copy)]
pub struct LnEntry {
    pub id: i64,
    pub media_item_id: Option<i64>,
}

#[derive(Debug, Default)]
pub struct Snapshot {
    /// Media items by natural key
    items: HashMap<ItemKey, i64>,
    /// Reverse map, kept for natural-key re-keying and merge cleanup
    item_keys: HashMap<i64, ItemKey>,
    /// External ids by natural key
    ids: HashMap<IdKey, IdEntry>,
    /// Reverse map from external id row to its natural key
    id_keys: HashMap<i64, IdKey>,
    /// Per-item service map: media item -> service -> external id row
    item_services: HashMap<i64, HashMap<ListService, i64>>,
    /// User states by (external id row, user)
    user_states: HashMap<(i64, i64), i64>,
    /// User lists by natural key
    lists: HashMap<ListKey, i64>,
    /// Membership pairs (user list row, user state row)
    memberships: HashSet<(i64, i64)>,
    /// Light novel releases by natural key
    ln_releases: HashMap<LnKey, LnEntry>,
}

impl Snapshot {
    /// Build the snapshot with one bulk read per table.
    pub async fn load(pool: &SqlitePool) -> Result<Self> {
        let mut snapshot = Snapshot::default();

        for item in queries::load_media_items(pool).await? {
            let key = item.natural_key();
            snapshot.items.insert(key.clone(), item.id);
            snapshot.item_keys.insert(item.id, key);
            snapshot.item_services.entry(item.id).or_default();
        }

        for external_id in queries::load_external_ids(pool).await? {
            let key = external_id.natural_key();
            snapshot.ids.insert(
                key.clone(),
                IdEntry {
                    id: external_id.id,
                    media_item_id: external_id.media_item_id,
                },
            );
            snapshot.id_keys.insert(external_id.id, key);
            snapshot
                .item_services
                .entry(external_id.media_item_id)
                .or_default()
                .insert(external_id.service, external_id.id);
        }

        for state in queries::load_user_states(pool).await? {
            snapshot
                .user_states
                .insert((state.external_id_id, state.user_id), state.id);
        }

        for list in queries::load_user_lists(pool).await? {
            snapshot.lists.insert(list.natural_key(), list.id);
        }

        for entry in queries::load_user_list_entries(pool).await? {
            snapshot
                .memberships
                .insert((entry.user_list_id, entry.user_state_id));
        }

        for release in queries::load_ln_releases(pool).await? {
            snapshot.ln_releases.insert(
                release.natural_key(),
                LnEntry {
                    id: release.id,
                    media_item_id: release.media_item_id,
                },
            );
        }

        Ok(snapshot)
    }

    // --- media items ---

    pub fn item_by_key(&self, key: &ItemKey) -> Option<i64> {
        self.items.get(key).copied()
    }

    pub fn insert_item(&mut self, id: i64, key: ItemKey) {
        self.items.insert(key.clone(), id);
        self.item_keys.insert(id, key);
        self.item_services.entry(id).or_default();
    }

    /// Move an item's index entry after its natural key changed.
    pub fn rekey_item(&mut self, id: i64, new_key: ItemKey) {
        if let Some(old_key) = self.item_keys.get(&id) {
            if *old_key == new_key {
                return;
            }
            self.items.remove(old_key);
        }
        self.items.insert(new_key.clone(), id);
        self.item_keys.insert(id, new_key);
    }

    /// Drop a deleted item from the indexes. Its external ids must already
    /// have been re-pointed or removed.
    pub fn remove_item(&mut self, id: i64) {
        if let Some(key) = self.item_keys.remove(&id) {
            self.items.remove(&key);
        }
        self.item_services.remove(&id);
    }

    // --- external ids ---

    pub fn external_id(&self, key: &IdKey) -> Option<IdEntry> {
        self.ids.get(key).copied()
    }

    /// The services currently linked to an item
    pub fn services_of_item(&self, media_item_id: i64) -> Vec<ListService> {
        self.item_services
            .get(&media_item_id)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default()
    }

    /// The external id row an item holds for one service, if any
    pub fn item_service_id(&self, media_item_id: i64, service: ListService) -> Option<i64> {
        self.item_services
            .get(&media_item_id)
            .and_then(|m| m.get(&service))
            .copied()
    }

    pub fn insert_external_id(&mut self, id: i64, key: IdKey, media_item_id: i64) {
        let service = key.1;
        self.ids.insert(key.clone(), IdEntry { id, media_item_id });
        self.id_keys.insert(id, key);
        self.item_services
            .entry(media_item_id)
            .or_default()
            .insert(service, id);
    }

    /// Re-point an existing external id row at another item.
    pub fn repoint_external_id(&mut self, id: i64, new_media_item_id: i64) {
        let Some(key) = self.id_keys.get(&id).cloned() else {
            return;
        };
        let service = key.1;
        if let Some(entry) = self.ids.get_mut(&key) {
            let old_item = entry.media_item_id;
            entry.media_item_id = new_media_item_id;
            if let Some(map) = self.item_services.get_mut(&old_item) {
                map.remove(&service);
            }
        }
        self.item_services
            .entry(new_media_item_id)
            .or_default()
            .insert(service, id);
    }

    /// Drop a deleted external id row and everything hanging off it
    /// (user states cascade in the store; the indexes follow suit).
    pub fn remove_external_id(&mut self, id: i64) {
        if let Some(key) = self.id_keys.remove(&id) {
            let service = key.1;
            if let Some(entry) = self.ids.remove(&key) {
                if let Some(map) = self.item_services.get_mut(&entry.media_item_id) {
                    map.remove(&service);
                }
            }
        }
        let removed_states: HashSet<i64> = self
            .user_states
            .iter()
            .filter(|((external_id_id, _), _)| *external_id_id == id)
            .map(|(_, state_id)| *state_id)
            .collect();
        self.user_states
            .retain(|(external_id_id, _), _| *external_id_id != id);
        self.memberships
            .retain(|(_, state_id)| !removed_states.contains(state_id));
    }

    // --- user states ---

    pub fn user_state(&self, external_id_id: i64, user_id: i64) -> Option<i64> {
        self.user_states.get(&(external_id_id, user_id)).copied()
    }

    pub fn insert_user_state(&mut self, external_id_id: i64, user_id: i64, state_id: i64) {
        self.user_states.insert((external_id_id, user_id), state_id);
    }

    // --- user lists ---

    pub fn list_by_key(&self, key: &ListKey) -> Option<i64> {
        self.lists.get(key).copied()
    }

    pub fn insert_list(&mut self, id: i64, key: ListKey) {
        self.lists.insert(key, id);
    }

    pub fn membership_exists(&self, user_list_id: i64, user_state_id: i64) -> bool {
        self.memberships.contains(&(user_list_id, user_state_id))
    }

    pub fn insert_membership(&mut self, user_list_id: i64, user_state_id: i64) {
        self.memberships.insert((user_list_id, user_state_id));
    }

    // --- light novel releases ---

    pub fn ln_release(&self, key: &LnKey) -> Option<LnEntry> {
        self.ln_releases.get(key).copied()
    }

    pub fn insert_ln_release(&mut self, key: LnKey, entry: LnEntry) {
        self.ln_releases.insert(key, entry);
    }

    pub fn set_ln_release_item(&mut self, key: &LnKey, media_item_id: Option<i64>) {
        if let Some(entry) = self.ln_releases.get_mut(key) {
            entry.media_item_id = media_item_id;
        }
    }

    /// Move every release link from one item to another (merge cleanup).
    pub fn repoint_ln_releases(&mut self, from_item: i64, to_item: i64) {
        for entry in self.ln_releases.values_mut() {
            if entry.media_item_id == Some(from_item) {
                entry.media_item_id = Some(to_item);
            }
        }
    }
}
