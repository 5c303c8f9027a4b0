//! Intake queue and full-pass behavior: idempotence, boundary validation,
//! user state and list upserts, light novel releases

mod common;

use common::{manga_item, record, user_list, user_state};
use shinkan_common::db::init::init_memory_database;
use shinkan_common::db::queries;
use shinkan_common::enums::ConsumingState;
use shinkan_common::enums::ListService::{Anilist, Myanimelist};
use shinkan_common::Error;
use shinkan_sync::record::{LnReleaseParams, LnReleaseRecord};
use shinkan_sync::SyncEngine;
use std::collections::HashMap;

fn full_record() -> shinkan_sync::SourceRecord {
    let mut rec = record(
        manga_item("Test Series", "c1"),
        Anilist,
        &[(Anilist, "1"), (Myanimelist, "2")],
    );
    rec.user_state = Some(user_state(1, 5));
    rec.user_list = Some(user_list(1, "Reading", Anilist));
    rec
}

#[tokio::test]
async fn test_repeated_processing_is_idempotent() {
    let pool = init_memory_database().await.unwrap();
    let engine = SyncEngine::new(pool.clone());

    // Same record three times in one pass, then once more in another pass
    for _ in 0..3 {
        engine.enqueue(full_record()).unwrap();
    }
    engine.drain_and_process().await.unwrap();
    engine.enqueue(full_record()).unwrap();
    engine.drain_and_process().await.unwrap();

    let counts = queries::store_counts(&pool).await.unwrap();
    assert_eq!(counts.media_items, 1);
    assert_eq!(counts.external_ids, 2);
    assert_eq!(counts.user_states, 1);
    assert_eq!(counts.user_lists, 1);
    assert_eq!(counts.user_list_entries, 1);
}

#[tokio::test]
async fn test_malformed_record_rejected_at_enqueue() {
    let pool = init_memory_database().await.unwrap();
    let engine = SyncEngine::new(pool);

    let mut bad = record(manga_item("", "c1"), Anilist, &[(Anilist, "1")]);
    bad.item.romaji_title = String::new();
    assert!(matches!(engine.enqueue(bad), Err(Error::InvalidRecord(_))));
    assert_eq!(engine.pending(), (0, 0));
}

#[tokio::test]
async fn test_empty_pass_is_a_noop() {
    let pool = init_memory_database().await.unwrap();
    let engine = SyncEngine::new(pool);

    let summary = engine.drain_and_process().await.unwrap();
    assert_eq!(summary.records_processed, 0);
    assert_eq!(summary.items_created, 0);
}

#[tokio::test]
async fn test_user_state_updated_in_place() {
    let pool = init_memory_database().await.unwrap();
    let engine = SyncEngine::new(pool.clone());

    engine.enqueue(full_record()).unwrap();
    engine.drain_and_process().await.unwrap();

    let mut progressed = full_record();
    progressed.user_state = Some(shinkan_sync::UserStateParams {
        user_id: 1,
        progress: Some(12),
        volume_progress: Some(2),
        score: Some(85),
        consuming_state: ConsumingState::Current,
    });
    engine.enqueue(progressed).unwrap();
    engine.drain_and_process().await.unwrap();

    let states = queries::user_states_for_user(&pool, 1).await.unwrap();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].progress, Some(12));
    assert_eq!(states[0].volume_progress, Some(2));
    assert_eq!(states[0].score, Some(85));
}

#[tokio::test]
async fn test_states_per_user_are_independent() {
    let pool = init_memory_database().await.unwrap();
    let engine = SyncEngine::new(pool.clone());

    engine.enqueue(full_record()).unwrap();
    let mut second_user = full_record();
    second_user.user_state = Some(user_state(2, 8));
    second_user.user_list = Some(user_list(2, "Reading", Anilist));
    engine.enqueue(second_user).unwrap();
    engine.drain_and_process().await.unwrap();

    let counts = queries::store_counts(&pool).await.unwrap();
    assert_eq!(counts.media_items, 1);
    assert_eq!(counts.user_states, 2);
    assert_eq!(counts.user_lists, 2);
    assert_eq!(counts.user_list_entries, 2);
}

#[tokio::test]
async fn test_list_contents_queryable() {
    let pool = init_memory_database().await.unwrap();
    let engine = SyncEngine::new(pool.clone());

    engine.enqueue(full_record()).unwrap();
    engine.drain_and_process().await.unwrap();

    let lists = queries::load_user_lists(&pool).await.unwrap();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].name, "Reading");

    let states = queries::user_states_in_list(&pool, lists[0].id).await.unwrap();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].progress, Some(5));
}

#[tokio::test]
async fn test_pending_counts_reflect_enqueues() {
    let pool = init_memory_database().await.unwrap();
    let engine = SyncEngine::new(pool);

    engine.enqueue(full_record()).unwrap();
    engine.enqueue(full_record()).unwrap();
    engine
        .enqueue_ln_release(ln_release("Test Series", "1", "2026-09-01"))
        .unwrap();
    assert_eq!(engine.pending(), (2, 1));

    engine.drain_and_process().await.unwrap();
    assert_eq!(engine.pending(), (0, 0));
}

fn ln_release(series: &str, volume: &str, date: &str) -> LnReleaseRecord {
    LnReleaseRecord {
        release: LnReleaseParams {
            series_name: series.to_string(),
            volume: volume.to_string(),
            release_date: date.to_string(),
            publisher: Some("Test Press".to_string()),
            purchase_link: None,
            digital: true,
            physical: false,
        },
        service_ids: HashMap::new(),
    }
}

#[tokio::test]
async fn test_ln_release_links_against_manga_id() {
    let pool = init_memory_database().await.unwrap();
    let engine = SyncEngine::new(pool.clone());

    engine
        .enqueue(record(
            manga_item("Test Series", "c1"),
            Myanimelist,
            &[(Myanimelist, "77")],
        ))
        .unwrap();
    let mut release = ln_release("Test Series", "3", "2026-09-01");
    release
        .service_ids
        .insert(Myanimelist, "77".to_string());
    engine.enqueue_ln_release(release).unwrap();

    // One pass: the release links against the id created moments earlier
    engine.drain_and_process().await.unwrap();

    let items = queries::load_media_items(&pool).await.unwrap();
    let releases = queries::load_ln_releases(&pool).await.unwrap();
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].media_item_id, Some(items[0].id));
}

#[tokio::test]
async fn test_ln_release_update_keeps_link() {
    let pool = init_memory_database().await.unwrap();
    let engine = SyncEngine::new(pool.clone());

    engine
        .enqueue(record(
            manga_item("Test Series", "c1"),
            Myanimelist,
            &[(Myanimelist, "77")],
        ))
        .unwrap();
    let mut linked = ln_release("Test Series", "3", "2026-09-01");
    linked.service_ids.insert(Myanimelist, "77".to_string());
    engine.enqueue_ln_release(linked).unwrap();
    engine.drain_and_process().await.unwrap();

    // The next scrape of the same announcement has no ids but a moved date;
    // the update must not cost the release its item link
    engine
        .enqueue_ln_release(ln_release("Test Series", "3", "2026-10-01"))
        .unwrap();
    let summary = engine.drain_and_process().await.unwrap();
    assert_eq!(summary.ln_releases_upserted, 1);

    let releases = queries::load_ln_releases(&pool).await.unwrap();
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].release_date, "2026-10-01");
    assert!(releases[0].media_item_id.is_some());
}

#[tokio::test]
async fn test_upcoming_releases_sorted_by_date() {
    let pool = init_memory_database().await.unwrap();
    let engine = SyncEngine::new(pool.clone());

    engine
        .enqueue_ln_release(ln_release("Series A", "1", "2026-12-01"))
        .unwrap();
    engine
        .enqueue_ln_release(ln_release("Series B", "4", "2026-08-20"))
        .unwrap();
    engine
        .enqueue_ln_release(ln_release("Series C", "2", "2026-01-15"))
        .unwrap();
    engine.drain_and_process().await.unwrap();

    let cutoff = chrono::NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
    let upcoming = queries::ln_releases_from(&pool, cutoff).await.unwrap();
    assert_eq!(upcoming.len(), 2);
    assert_eq!(upcoming[0].series_name, "Series B");
    assert_eq!(upcoming[1].series_name, "Series A");
}
