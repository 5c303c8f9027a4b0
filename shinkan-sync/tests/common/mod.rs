//! Shared helpers for the integration tests
#![allow(dead_code)]

use shinkan_common::enums::{
    ConsumingState, ListService, MediaSubType, MediaType, ReleasingState,
};
use shinkan_sync::record::{
    MediaItemParams, SourceRecord, UserListParams, UserStateParams,
};
use std::collections::HashMap;

pub fn service_ids(pairs: &[(ListService, &str)]) -> HashMap<ListService, String> {
    pairs
        .iter()
        .map(|(service, id)| (*service, id.to_string()))
        .collect()
}

pub fn manga_item(title: &str, cover: &str) -> MediaItemParams {
    MediaItemParams {
        media_type: MediaType::Manga,
        media_subtype: MediaSubType::Manga,
        english_title: None,
        romaji_title: title.to_string(),
        cover_url: cover.to_string(),
        latest_release: Some(10),
        latest_volume_release: None,
        next_episode: None,
        next_episode_airing_time: None,
        releasing_state: ReleasingState::Releasing,
    }
}

pub fn anime_item(title: &str, cover: &str) -> MediaItemParams {
    MediaItemParams {
        media_type: MediaType::Anime,
        media_subtype: MediaSubType::Tv,
        english_title: None,
        romaji_title: title.to_string(),
        cover_url: cover.to_string(),
        latest_release: Some(3),
        latest_volume_release: None,
        next_episode: Some(4),
        next_episode_airing_time: None,
        releasing_state: ReleasingState::Releasing,
    }
}

pub fn record(
    item: MediaItemParams,
    anchor: ListService,
    ids: &[(ListService, &str)],
) -> SourceRecord {
    SourceRecord {
        item,
        anchor_service: anchor,
        service_ids: service_ids(ids),
        user_state: None,
        user_list: None,
    }
}

pub fn user_state(user_id: i64, progress: i64) -> UserStateParams {
    UserStateParams {
        user_id,
        progress: Some(progress),
        volume_progress: None,
        score: Some(77),
        consuming_state: ConsumingState::Current,
    }
}

pub fn user_list(user_id: i64, name: &str, service: ListService) -> UserListParams {
    UserListParams {
        user_id,
        name: name.to_string(),
        service,
        media_type: MediaType::Manga,
    }
}
