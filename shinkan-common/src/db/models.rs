//! Database models
//!
//! Plain row structs with manual `SqliteRow` mapping. Enum columns are
//! stored as text codes (see [`crate::enums`]), so decoding can fail on a
//! corrupted row and every `from_row` returns a [`crate::Result`].

use crate::enums::{ConsumingState, ListService, MediaSubType, MediaType, ReleasingState};
use crate::Result;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// Natural key of a media item: (type, subtype, romaji title, cover URL).
///
/// The cover URL is part of the key because some titles legitimately share
/// a name (pre-serialization and serialized runs of the same work).
pub type ItemKey = (MediaType, MediaSubType, String, String);

/// Natural key of an external id: (type, service, service-native id)
pub type IdKey = (MediaType, ListService, String);

/// Natural key of a user list: (user, service, type, name)
pub type ListKey = (i64, ListService, MediaType, String);

/// Natural key of a light novel release: (series, volume, digital, physical)
pub type LnKey = (String, String, bool, bool);

/// One canonical, site-agnostic record of a title
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: i64,
    pub media_type: MediaType,
    pub media_subtype: MediaSubType,
    pub english_title: Option<String>,
    pub romaji_title: String,
    pub cover_url: String,
    pub latest_release: Option<i64>,
    pub latest_volume_release: Option<i64>,
    pub next_episode: Option<i64>,
    pub next_episode_airing_time: Option<i64>,
    pub releasing_state: ReleasingState,
}

impl MediaItem {
    pub fn natural_key(&self) -> ItemKey {
        (
            self.media_type,
            self.media_subtype,
            self.romaji_title.clone(),
            self.cover_url.clone(),
        )
    }

    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: row.get("id"),
            media_type: MediaType::from_str(row.get("media_type"))?,
            media_subtype: MediaSubType::from_str(row.get("media_subtype"))?,
            english_title: row.get("english_title"),
            romaji_title: row.get("romaji_title"),
            cover_url: row.get("cover_url"),
            latest_release: row.get("latest_release"),
            latest_volume_release: row.get("latest_volume_release"),
            next_episode: row.get("next_episode"),
            next_episode_airing_time: row.get("next_episode_airing_time"),
            releasing_state: ReleasingState::from_str(row.get("releasing_state"))?,
        })
    }
}

/// One external service's reference to exactly one media item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalId {
    pub id: i64,
    pub media_item_id: i64,
    pub media_type: MediaType,
    pub service: ListService,
    pub service_id: String,
}

impl ExternalId {
    pub fn natural_key(&self) -> IdKey {
        (self.media_type, self.service, self.service_id.clone())
    }

    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: row.get("id"),
            media_item_id: row.get("media_item_id"),
            media_type: MediaType::from_str(row.get("media_type"))?,
            service: ListService::from_str(row.get("service"))?,
            service_id: row.get("service_id"),
        })
    }
}

/// One user's consumption record against one external id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserState {
    pub id: i64,
    pub external_id_id: i64,
    pub user_id: i64,
    pub progress: Option<i64>,
    pub volume_progress: Option<i64>,
    pub score: Option<i64>,
    pub consuming_state: ConsumingState,
}

impl UserState {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: row.get("id"),
            external_id_id: row.get("external_id_id"),
            user_id: row.get("user_id"),
            progress: row.get("progress"),
            volume_progress: row.get("volume_progress"),
            score: row.get("score"),
            consuming_state: ConsumingState::from_str(row.get("consuming_state"))?,
        })
    }
}

/// A named, per-user, per-service grouping mirroring an external list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserList {
    pub id: i64,
    pub user_id: i64,
    pub service: ListService,
    pub media_type: MediaType,
    pub name: String,
}

impl UserList {
    pub fn natural_key(&self) -> ListKey {
        (
            self.user_id,
            self.service,
            self.media_type,
            self.name.clone(),
        )
    }

    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: row.get("id"),
            user_id: row.get("user_id"),
            service: ListService::from_str(row.get("service"))?,
            media_type: MediaType::from_str(row.get("media_type"))?,
            name: row.get("name"),
        })
    }
}

/// Membership of one user state in one user list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListEntry {
    pub id: i64,
    pub user_list_id: i64,
    pub user_state_id: i64,
}

impl UserListEntry {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: row.get("id"),
            user_list_id: row.get("user_list_id"),
            user_state_id: row.get("user_state_id"),
        })
    }
}

/// One announced light novel volume release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LnRelease {
    pub id: i64,
    pub media_item_id: Option<i64>,
    pub series_name: String,
    pub volume: String,
    pub release_date: String,
    pub publisher: Option<String>,
    pub purchase_link: Option<String>,
    pub digital: bool,
    pub physical: bool,
}

impl LnRelease {
    pub fn natural_key(&self) -> LnKey {
        (
            self.series_name.clone(),
            self.volume.clone(),
            self.digital,
            self.physical,
        )
    }

    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: row.get("id"),
            media_item_id: row.get("media_item_id"),
            series_name: row.get("series_name"),
            volume: row.get("volume"),
            release_date: row.get("release_date"),
            publisher: row.get("publisher"),
            purchase_link: row.get("purchase_link"),
            digital: row.get("digital"),
            physical: row.get("physical"),
        })
    }
}

/// Best-guess latest chapter for one manga external id.
///
/// Guesses come from an external estimator and are refreshed at most once
/// per [`ChapterGuess::REFRESH_INTERVAL_SECS`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterGuess {
    pub external_id_id: i64,
    pub guess: Option<i64>,
    pub last_update: i64,
}

impl ChapterGuess {
    /// Minimum age before a guess is refreshed again
    pub const REFRESH_INTERVAL_SECS: i64 = 60 * 60;

    pub fn is_stale(&self, now: i64) -> bool {
        now - self.last_update > Self::REFRESH_INTERVAL_SECS
    }

    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            external_id_id: row.get("external_id_id"),
            guess: row.get("guess"),
            last_update: row.get("last_update"),
        })
    }
}
