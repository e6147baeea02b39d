//! List-backed strategy behavior shared by the database, pinned and history
//! players: cursor wrap-around, previous/next inversion, deletion handling
//! and the empty-source error path.

mod helpers;

use driftshow_player::{
    DatabaseSource, Error, HistorySource, IndexedPlayer, PinnedSource, PlayerStrategy, Slot,
};
use helpers::{item, rig, MockFetcher, TestRig};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::time::{sleep, Duration};

fn db_player(rig: &TestRig) -> Arc<IndexedPlayer> {
    Arc::new(IndexedPlayer::new(
        Box::new(DatabaseSource {
            fetcher: rig.ctx.fetcher.clone(),
            options: rig.ctx.options.clone(),
        }),
        rig.ctx.clone(),
    ))
}

fn three_items() -> Vec<driftshow_common::Item> {
    vec![item("/d/a.jpg"), item("/d/b.jpg"), item("/d/c.jpg")]
}

#[tokio::test(start_paused = true)]
async fn start_shows_the_first_item() {
    let rig = rig(MockFetcher::with_db_items(three_items()));
    let player = db_player(&rig);

    player.clone().start().await.unwrap();

    assert_eq!(player.current_item().await.unwrap().src, "/d/a.jpg");
    assert_eq!(player.index().await, Some(0));
    assert_eq!(player.item_count().await, 3);
    assert!(!player.is_stopped().await);
}

#[tokio::test(start_paused = true)]
async fn next_wraps_from_last_to_first() {
    let rig = rig(MockFetcher::with_db_items(three_items()));
    let player = db_player(&rig);
    player.clone().start().await.unwrap();

    player.clone().next(false).await.unwrap();
    assert_eq!(player.current_item().await.unwrap().src, "/d/b.jpg");
    player.clone().next(false).await.unwrap();
    assert_eq!(player.current_item().await.unwrap().src, "/d/c.jpg");
    player.clone().next(false).await.unwrap();
    assert_eq!(player.current_item().await.unwrap().src, "/d/a.jpg");
    assert_eq!(player.index().await, Some(0));
}

#[tokio::test(start_paused = true)]
async fn previous_is_the_inverse_of_next() {
    let rig = rig(MockFetcher::with_db_items(three_items()));
    let player = db_player(&rig);
    player.clone().start().await.unwrap();

    player.clone().next(false).await.unwrap();
    player.clone().previous(false).await.unwrap();
    assert_eq!(player.current_item().await.unwrap().src, "/d/a.jpg");

    // Previous from the first position wraps to the last
    player.clone().previous(false).await.unwrap();
    assert_eq!(player.current_item().await.unwrap().src, "/d/c.jpg");
}

#[tokio::test(start_paused = true)]
async fn empty_source_fails_start_with_tagged_error() {
    let rig = rig(MockFetcher::with_db_items(Vec::new()));
    let player = db_player(&rig);

    let err = player.clone().start().await.unwrap_err();
    match err {
        Error::Action { action, source } => {
            assert_eq!(action, "start");
            assert!(matches!(*source, Error::EmptySource(_)));
        }
        other => panic!("expected tagged error, got {}", other),
    }
    assert!(player.is_stopped().await);
}

#[tokio::test(start_paused = true)]
async fn deleting_the_current_item_advances_past_it() {
    let rig = rig(MockFetcher::with_db_items(three_items()));
    let player = db_player(&rig);
    player.clone().start().await.unwrap();

    let deleted = item("/d/a.jpg");
    player.clone().on_delete_item(&deleted).await.unwrap();

    assert_eq!(player.item_count().await, 2);
    assert_eq!(player.current_item().await.unwrap().src, "/d/b.jpg");
}

#[tokio::test(start_paused = true)]
async fn deleting_an_unlisted_item_changes_nothing() {
    let rig = rig(MockFetcher::with_db_items(three_items()));
    let player = db_player(&rig);
    player.clone().start().await.unwrap();

    player
        .clone()
        .on_delete_item(&item("/elsewhere/x.jpg"))
        .await
        .unwrap();

    assert_eq!(player.item_count().await, 3);
    assert_eq!(player.current_item().await.unwrap().src, "/d/a.jpg");
}

#[tokio::test(start_paused = true)]
async fn pause_and_resume_follow_the_capability_gates() {
    let rig = rig(MockFetcher::with_db_items(three_items()));
    let player = db_player(&rig);

    // Nothing to pause before start
    assert!(!player.can_pause().await);
    player.clone().start().await.unwrap();

    assert!(player.can_pause().await);
    assert!(!player.can_resume().await);
    player.pause().await;
    assert!(player.is_paused().await);
    assert!(player.can_resume().await);

    player.resume().await.unwrap();
    assert!(!player.is_paused().await);
}

#[tokio::test(start_paused = true)]
async fn stop_marks_stopped_and_keeps_capabilities_consistent() {
    let rig = rig(MockFetcher::with_db_items(three_items()));
    let player = db_player(&rig);
    player.clone().start().await.unwrap();

    player.stop().await;

    assert!(player.is_stopped().await);
    assert!(!player.can_pause().await);
    assert!(!player.can_resume().await);
}

#[tokio::test(start_paused = true)]
async fn shown_items_are_appended_to_history() {
    let rig = rig(MockFetcher::with_db_items(three_items()));
    let player = db_player(&rig);
    player.clone().start().await.unwrap();
    player.clone().next(false).await.unwrap();

    let history = rig.ctx.history.items().await;
    let srcs: Vec<_> = history.iter().map(|i| i.src.as_str()).collect();
    assert_eq!(srcs, vec!["/d/a.jpg", "/d/b.jpg"]);
}

#[tokio::test(start_paused = true)]
async fn history_player_starts_at_the_most_recent_entry() {
    let rig = rig(MockFetcher::new());
    rig.ctx.history.push(item("/h/old.jpg")).await;
    rig.ctx.history.push(item("/h/mid.jpg")).await;
    rig.ctx.history.push(item("/h/new.jpg")).await;
    let player = Arc::new(IndexedPlayer::new(
        Box::new(HistorySource {
            history: rig.ctx.history.clone(),
        }),
        rig.ctx.clone(),
    ));

    player.clone().start().await.unwrap();
    assert_eq!(player.current_item().await.unwrap().src, "/h/new.jpg");

    // Sequential rewind through the log
    player.clone().previous(false).await.unwrap();
    assert_eq!(player.current_item().await.unwrap().src, "/h/mid.jpg");
    assert!(player.can_previous().await);

    // History never re-appends to itself
    assert_eq!(rig.ctx.history.items().await.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn pinned_player_reads_the_pinned_store() {
    let rig = rig(MockFetcher::new());
    rig.ctx.pinned.add(item("/p/one.jpg")).await;
    rig.ctx.pinned.add(item("/p/two.jpg")).await;
    let player = Arc::new(IndexedPlayer::new(
        Box::new(PinnedSource {
            pinned: rig.ctx.pinned.clone(),
            options: rig.ctx.options.clone(),
        }),
        rig.ctx.clone(),
    ));

    player.clone().start().await.unwrap();
    assert_eq!(player.current_item().await.unwrap().src, "/p/one.jpg");
    assert_eq!(player.item_count().await, 2);
}

#[tokio::test(start_paused = true)]
async fn on_hold_preserves_state_for_later_resume() {
    let rig = rig(MockFetcher::with_db_items(three_items()));
    let player = db_player(&rig);
    player.clone().start().await.unwrap();
    player.clone().next(false).await.unwrap();

    player.set_on_hold().await;
    assert!(player.is_on_hold().await);
    assert!(!player.can_pause().await);

    player.clone().leave_on_hold_and_resume().await.unwrap();
    assert!(!player.is_on_hold().await);
    assert_eq!(player.current_item().await.unwrap().src, "/d/b.jpg");
    assert_eq!(player.index().await, Some(1));
}

#[tokio::test(start_paused = true)]
async fn pause_during_a_held_transition_leaves_the_loop_idle() {
    let rig = rig(MockFetcher::with_db_items(three_items()));
    let player = db_player(&rig);
    player.clone().start().await.unwrap();

    // Hold the next show on its load signal
    rig.surface.auto_ack.store(false, Ordering::SeqCst);
    let advancing = player.clone();
    let handle = tokio::spawn(async move { advancing.next(false).await });
    sleep(Duration::from_millis(150)).await;
    assert!(!handle.is_finished());

    // Pause wins the race against the in-flight transition
    player.pause().await;
    rig.ctx.switcher.on_item_loaded(Slot::One).await;
    handle.await.unwrap().unwrap();

    assert!(player.is_paused().await);
    assert!(!rig.ctx.loop_engine.is_looping());
    assert_eq!(player.current_item().await.unwrap().src, "/d/b.jpg");

    // Resuming picks the loop back up for the shown item
    player.resume().await.unwrap();
    sleep(Duration::from_millis(10)).await;
    assert!(rig.ctx.loop_engine.is_looping());
}

#[tokio::test(start_paused = true)]
async fn stop_during_a_held_transition_leaves_the_loop_stopped() {
    let rig = rig(MockFetcher::with_db_items(three_items()));
    let player = db_player(&rig);
    player.clone().start().await.unwrap();

    rig.surface.auto_ack.store(false, Ordering::SeqCst);
    let advancing = player.clone();
    let handle = tokio::spawn(async move { advancing.next(false).await });
    sleep(Duration::from_millis(150)).await;

    player.stop().await;
    rig.ctx.switcher.on_item_loaded(Slot::One).await;
    handle.await.unwrap().unwrap();

    assert!(player.is_stopped().await);
    assert!(!rig.ctx.loop_engine.is_looping());
    // The interrupted advance never lands on the stopped player
    assert_eq!(player.current_item().await.unwrap().src, "/d/a.jpg");
    assert_eq!(player.index().await, Some(0));

    sleep(Duration::from_millis(500)).await;
    assert!(!rig.ctx.loop_engine.is_looping());
}

#[tokio::test(start_paused = true)]
async fn reentrant_next_fails_fast_while_a_transition_settles() {
    let rig = rig(MockFetcher::with_db_items(three_items()));
    let player = db_player(&rig);
    player.clone().start().await.unwrap();

    rig.surface.auto_ack.store(false, Ordering::SeqCst);
    let advancing = player.clone();
    let handle = tokio::spawn(async move { advancing.next(false).await });
    sleep(Duration::from_millis(150)).await;

    let err = player.clone().next(false).await.unwrap_err();
    assert_eq!(err.action(), Some("next"));
    match err {
        Error::Action { source, .. } => {
            assert!(matches!(*source, Error::TransitionInProgress))
        }
        other => panic!("expected tagged error, got {}", other),
    }

    // The first advance still completes once the load signal arrives
    rig.ctx.switcher.on_item_loaded(Slot::One).await;
    handle.await.unwrap().unwrap();
    assert_eq!(player.current_item().await.unwrap().src, "/d/b.jpg");
}

#[tokio::test(start_paused = true)]
async fn random_mode_disables_previous_for_the_database_player() {
    let rig = rig(MockFetcher::with_db_items(three_items()));
    rig.ctx.options.set_random(true).await;
    let player = db_player(&rig);
    player.clone().start().await.unwrap();

    assert!(player.can_next().await);
    assert!(!player.can_previous().await);
    assert!(player.current_item().await.is_some());
}
