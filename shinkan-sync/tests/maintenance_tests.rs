//! Maintenance passes: stale-state pruning and chapter-guess bookkeeping

mod common;

use common::{anime_item, manga_item, record, user_state};
use shinkan_common::db::init::init_memory_database;
use shinkan_common::db::queries;
use shinkan_common::enums::ListService::Anilist;
use shinkan_common::enums::{ListService, MediaType};
use shinkan_sync::maintenance;
use shinkan_sync::SyncEngine;
use std::collections::HashSet;

#[tokio::test]
async fn test_prune_removes_unrefreshed_states() {
    let pool = init_memory_database().await.unwrap();
    let engine = SyncEngine::new(pool.clone());

    // User 1 tracks two manga titles
    for (title, id) in [("Series A", "1"), ("Series B", "2")] {
        let mut rec = record(manga_item(title, id), Anilist, &[(Anilist, id)]);
        rec.user_state = Some(user_state(1, 3));
        engine.enqueue(rec).unwrap();
    }
    // User 2 tracks one of them too
    let mut other = record(manga_item("Series A", "1"), Anilist, &[(Anilist, "1")]);
    other.user_state = Some(user_state(2, 9));
    engine.enqueue(other).unwrap();
    engine.drain_and_process().await.unwrap();

    // A full refresh of user 1's anilist manga list only confirmed Series A
    let fresh: HashSet<i64> = queries::load_external_ids(&pool)
        .await
        .unwrap()
        .into_iter()
        .filter(|eid| eid.service_id == "1")
        .map(|eid| eid.id)
        .collect();

    let pruned =
        maintenance::prune_stale_user_states(&pool, 1, Anilist, MediaType::Manga, &fresh)
            .await
            .unwrap();
    assert_eq!(pruned, 1);

    // User 1 keeps Series A; user 2 is untouched
    assert_eq!(queries::user_states_for_user(&pool, 1).await.unwrap().len(), 1);
    assert_eq!(queries::user_states_for_user(&pool, 2).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_prune_ignores_other_categories() {
    let pool = init_memory_database().await.unwrap();
    let engine = SyncEngine::new(pool.clone());

    let mut anime = record(anime_item("Series", "c1"), Anilist, &[(Anilist, "5")]);
    anime.user_state = Some(user_state(1, 2));
    engine.enqueue(anime).unwrap();
    engine.drain_and_process().await.unwrap();

    // A manga refresh that confirmed nothing must not touch anime states
    let pruned =
        maintenance::prune_stale_user_states(&pool, 1, Anilist, MediaType::Manga, &HashSet::new())
            .await
            .unwrap();
    assert_eq!(pruned, 0);
    assert_eq!(queries::user_states_for_user(&pool, 1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_chapter_guess_lifecycle() {
    let pool = init_memory_database().await.unwrap();
    let engine = SyncEngine::new(pool.clone());

    engine
        .enqueue(record(manga_item("Series", "c1"), Anilist, &[(Anilist, "1")]))
        .unwrap();
    engine
        .enqueue(record(anime_item("Show", "c2"), Anilist, &[(Anilist, "2")]))
        .unwrap();
    engine.drain_and_process().await.unwrap();

    let now = 1_700_000_000;

    // Manga identifiers get a guess row lazily and show up stale at once;
    // anime identifiers never do
    let stale = maintenance::stale_chapter_guesses(&pool, now).await.unwrap();
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].external_id.media_type, MediaType::Manga);

    let external_id_id = stale[0].external_id.id;
    maintenance::record_chapter_guess(&pool, external_id_id, Some(120), now)
        .await
        .unwrap();

    // Freshly recorded: nothing due within the refresh window
    let stale = maintenance::stale_chapter_guesses(&pool, now + 30 * 60)
        .await
        .unwrap();
    assert!(stale.is_empty());

    // Past the window it is due again, guess intact
    let stale = maintenance::stale_chapter_guesses(&pool, now + 2 * 60 * 60)
        .await
        .unwrap();
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].guess.guess, Some(120));

    let guess = maintenance::chapter_guess(&pool, external_id_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(guess.guess, Some(120));
    assert_eq!(guess.last_update, now);
}

#[tokio::test]
async fn test_guess_rows_cascade_with_identifiers() {
    let pool = init_memory_database().await.unwrap();
    let engine = SyncEngine::new(pool.clone());

    // Two items for one title that a later fetch will unify; both manga ids
    // get guess rows first
    engine
        .enqueue(record(
            manga_item("Series", "https://a.example/c.png"),
            Anilist,
            &[(Anilist, "1")],
        ))
        .unwrap();
    engine
        .enqueue(record(
            manga_item("Series", "https://b.example/c.png"),
            Anilist,
            &[(Anilist, "2"), (ListService::Mangadex, "5")],
        ))
        .unwrap();
    engine.drain_and_process().await.unwrap();
    maintenance::stale_chapter_guesses(&pool, 1_700_000_000)
        .await
        .unwrap();
    assert_eq!(queries::store_counts(&pool).await.unwrap().chapter_guesses, 3);

    // The merge drops the retired item's conflicting anilist id; its guess
    // row goes with it
    engine
        .enqueue(record(
            manga_item("Series", "https://a.example/c.png"),
            Anilist,
            &[(Anilist, "1"), (ListService::Mangadex, "5")],
        ))
        .unwrap();
    engine.drain_and_process().await.unwrap();

    let counts = queries::store_counts(&pool).await.unwrap();
    assert_eq!(counts.media_items, 1);
    assert_eq!(counts.external_ids, 2);
    assert_eq!(counts.chapter_guesses, 2);
}
