//! Normalized source records
//!
//! The common shape every external catalog client must produce before its
//! data reaches the reconciliation engine. Records arrive as JSON from the
//! scraping clients, hence the serde derives.

use serde::{Deserialize, Serialize};
use shinkan_common::enums::{ConsumingState, ListService, MediaSubType, MediaType, ReleasingState};
use shinkan_common::{Error, Result};
use std::collections::HashMap;

/// Metadata payload describing one title, as seen by one catalog service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItemParams {
    pub media_type: MediaType,
    pub media_subtype: MediaSubType,
    #[serde(default)]
    pub english_title: Option<String>,
    pub romaji_title: String,
    pub cover_url: String,
    #[serde(default)]
    pub latest_release: Option<i64>,
    #[serde(default)]
    pub latest_volume_release: Option<i64>,
    #[serde(default)]
    pub next_episode: Option<i64>,
    #[serde(default)]
    pub next_episode_airing_time: Option<i64>,
    pub releasing_state: ReleasingState,
}

/// One user's progress against the title, if the record came from a
/// user-list fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStateParams {
    pub user_id: i64,
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default)]
    pub volume_progress: Option<i64>,
    #[serde(default)]
    pub score: Option<i64>,
    pub consuming_state: ConsumingState,
}

/// The external list the user state belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListParams {
    pub user_id: i64,
    pub name: String,
    pub service: ListService,
    pub media_type: MediaType,
}

/// One normalized record handed to the intake queue by a source client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    pub item: MediaItemParams,
    /// The service whose identifier anchors the reconciliation lookup
    pub anchor_service: ListService,
    /// Every service-native id the client knows for this title
    pub service_ids: HashMap<ListService, String>,
    #[serde(default)]
    pub user_state: Option<UserStateParams>,
    #[serde(default)]
    pub user_list: Option<UserListParams>,
}

impl SourceRecord {
    /// Boundary validation: malformed records never enter the queue.
    ///
    /// The anchor id is deliberately NOT checked here: a record without
    /// its anchor id is well-formed but unanchorable, and is skipped with
    /// a log line during the pass instead (see the error taxonomy).
    pub fn validate(&self) -> Result<()> {
        if self.item.romaji_title.trim().is_empty() {
            return Err(Error::InvalidRecord("empty native title".into()));
        }
        if self.item.cover_url.trim().is_empty() {
            return Err(Error::InvalidRecord("empty cover reference".into()));
        }
        if self.service_ids.is_empty() {
            return Err(Error::InvalidRecord("no service ids supplied".into()));
        }
        if self.service_ids.values().any(|id| id.trim().is_empty()) {
            return Err(Error::InvalidRecord("empty service id".into()));
        }
        if let Some(list) = &self.user_list {
            if list.name.trim().is_empty() {
                return Err(Error::InvalidRecord("empty list name".into()));
            }
            if self.user_state.is_none() {
                return Err(Error::InvalidRecord(
                    "list grouping without a user state".into(),
                ));
            }
        }
        Ok(())
    }

    /// The anchor service's id, or the recoverable missing-anchor error
    pub fn anchor_id(&self) -> Result<&str> {
        self.service_ids
            .get(&self.anchor_service)
            .map(|s| s.as_str())
            .ok_or_else(|| Error::MissingAnchor(self.anchor_service.to_string()))
    }

    /// Supplied (service, id) pairs in a stable service order.
    ///
    /// The map itself has no useful order; iterating in a fixed order keeps
    /// fallback anchor matching and merge behavior deterministic.
    pub fn ordered_pairs(&self) -> Vec<(ListService, &str)> {
        ListService::ALL
            .iter()
            .filter_map(|s| self.service_ids.get(s).map(|id| (*s, id.as_str())))
            .collect()
    }
}

/// Payload for one announced light novel volume
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LnReleaseParams {
    pub series_name: String,
    pub volume: String,
    /// ISO date (YYYY-MM-DD)
    pub release_date: String,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub purchase_link: Option<String>,
    pub digital: bool,
    pub physical: bool,
}

/// One normalized light novel release record.
///
/// `service_ids` may name manga identifiers for the series; the first one
/// matching an existing external id links the release to its media item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LnReleaseRecord {
    pub release: LnReleaseParams,
    #[serde(default)]
    pub service_ids: HashMap<ListService, String>,
}

impl LnReleaseRecord {
    pub fn validate(&self) -> Result<()> {
        if self.release.series_name.trim().is_empty() {
            return Err(Error::InvalidRecord("empty series name".into()));
        }
        if self.release.volume.trim().is_empty() {
            return Err(Error::InvalidRecord("empty volume".into()));
        }
        if chrono::NaiveDate::parse_from_str(&self.release.release_date, "%Y-%m-%d").is_err() {
            return Err(Error::InvalidRecord(format!(
                "bad release date: {}",
                self.release.release_date
            )));
        }
        Ok(())
    }

    pub fn ordered_pairs(&self) -> Vec<(ListService, &str)> {
        ListService::ALL
            .iter()
            .filter_map(|s| self.service_ids.get(s).map(|id| (*s, id.as_str())))
            .collect()
    }
}
