//! Enumerations shared by every shinkan crate
//!
//! All enums are stored as lowercase text codes in the database. The codes
//! double as the wire values used by the scraping clients, so the serde
//! representation and the storage representation are the same string.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad category of a media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Anime,
    Manga,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Anime => "anime",
            MediaType::Manga => "manga",
        }
    }

    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "anime" => Ok(MediaType::Anime),
            "manga" => Ok(MediaType::Manga),
            other => Err(Error::InvalidRecord(format!("unknown media type: {other}"))),
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finer-grained serialization format within a media type.
///
/// Titles differing only by subtype are distinct items (a one-shot and its
/// serialized run legitimately coexist).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaSubType {
    Tv,
    TvShort,
    Movie,
    Special,
    Ova,
    Ona,
    Music,
    Manga,
    Novel,
    OneShot,
    Unknown,
}

impl MediaSubType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaSubType::Tv => "tv",
            MediaSubType::TvShort => "tv_short",
            MediaSubType::Movie => "movie",
            MediaSubType::Special => "special",
            MediaSubType::Ova => "ova",
            MediaSubType::Ona => "ona",
            MediaSubType::Music => "music",
            MediaSubType::Manga => "manga",
            MediaSubType::Novel => "novel",
            MediaSubType::OneShot => "one_shot",
            MediaSubType::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "tv" => Ok(MediaSubType::Tv),
            "tv_short" => Ok(MediaSubType::TvShort),
            "movie" => Ok(MediaSubType::Movie),
            "special" => Ok(MediaSubType::Special),
            "ova" => Ok(MediaSubType::Ova),
            "ona" => Ok(MediaSubType::Ona),
            "music" => Ok(MediaSubType::Music),
            "manga" => Ok(MediaSubType::Manga),
            "novel" => Ok(MediaSubType::Novel),
            "one_shot" => Ok(MediaSubType::OneShot),
            "unknown" => Ok(MediaSubType::Unknown),
            other => Err(Error::InvalidRecord(format!(
                "unknown media subtype: {other}"
            ))),
        }
    }
}

impl fmt::Display for MediaSubType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External catalog services that shinkan aggregates from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListService {
    Anilist,
    Myanimelist,
    Mangadex,
    Kitsu,
    AnimePlanet,
}

impl ListService {
    /// All known services, in no particular order
    pub const ALL: [ListService; 5] = [
        ListService::Anilist,
        ListService::Myanimelist,
        ListService::Mangadex,
        ListService::Kitsu,
        ListService::AnimePlanet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ListService::Anilist => "anilist",
            ListService::Myanimelist => "myanimelist",
            ListService::Mangadex => "mangadex",
            ListService::Kitsu => "kitsu",
            ListService::AnimePlanet => "anime_planet",
        }
    }

    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "anilist" => Ok(ListService::Anilist),
            "myanimelist" => Ok(ListService::Myanimelist),
            "mangadex" => Ok(ListService::Mangadex),
            "kitsu" => Ok(ListService::Kitsu),
            "anime_planet" => Ok(ListService::AnimePlanet),
            other => Err(Error::InvalidRecord(format!("unknown service: {other}"))),
        }
    }
}

impl fmt::Display for ListService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publication status of a media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleasingState {
    Releasing,
    Finished,
    Cancelled,
    NotYetReleased,
    Unknown,
}

impl ReleasingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleasingState::Releasing => "releasing",
            ReleasingState::Finished => "finished",
            ReleasingState::Cancelled => "cancelled",
            ReleasingState::NotYetReleased => "not_yet_released",
            ReleasingState::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "releasing" => Ok(ReleasingState::Releasing),
            "finished" => Ok(ReleasingState::Finished),
            "cancelled" => Ok(ReleasingState::Cancelled),
            "not_yet_released" => Ok(ReleasingState::NotYetReleased),
            "unknown" => Ok(ReleasingState::Unknown),
            other => Err(Error::InvalidRecord(format!(
                "unknown releasing state: {other}"
            ))),
        }
    }
}

impl fmt::Display for ReleasingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's consumption status for one tracked title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumingState {
    Current,
    Paused,
    Completed,
    Dropped,
    Planned,
}

impl ConsumingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsumingState::Current => "current",
            ConsumingState::Paused => "paused",
            ConsumingState::Completed => "completed",
            ConsumingState::Dropped => "dropped",
            ConsumingState::Planned => "planned",
        }
    }

    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "current" => Ok(ConsumingState::Current),
            "paused" => Ok(ConsumingState::Paused),
            "completed" => Ok(ConsumingState::Completed),
            "dropped" => Ok(ConsumingState::Dropped),
            "planned" => Ok(ConsumingState::Planned),
            other => Err(Error::InvalidRecord(format!(
                "unknown consuming state: {other}"
            ))),
        }
    }
}

impl fmt::Display for ConsumingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
