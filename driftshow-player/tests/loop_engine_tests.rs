//! Loop engine behavior under a paused tokio clock.
//!
//! Virtual time: the default timing ticks every 100 ms, so a 500 ms target
//! produces the value sequence 0, 100, 200, 300, 400, 500 and exactly one
//! completion callback.

use driftshow_player::{LoopEngine, LoopEndFn, LoopTiming};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

fn counting_callback() -> (LoopEndFn, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let count_in = count.clone();
    let callback: LoopEndFn = Arc::new(move || {
        let count = count_in.clone();
        Box::pin(async move {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    });
    (callback, count)
}

#[tokio::test(start_paused = true)]
async fn cycle_reaches_target_and_completes_once() {
    let engine = LoopEngine::default();
    let (callback, count) = counting_callback();
    engine.set_on_loop_end(callback).await;
    engine.set_max_value(500).await;

    engine.start_looping().await.unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 1);
    let state = engine.state().await;
    assert_eq!(state.value, Some(500));
    assert!(!engine.is_looping());
}

#[tokio::test(start_paused = true)]
async fn value_advances_in_tick_multiples() {
    let engine = LoopEngine::default();
    engine.set_max_value(500).await;

    let runner = engine.clone();
    let handle = tokio::spawn(async move { runner.start_looping().await });

    sleep(Duration::from_millis(250)).await;
    assert_eq!(engine.state().await.value, Some(200));
    assert!(engine.is_looping());

    handle.await.unwrap().unwrap();
    assert_eq!(engine.state().await.value, Some(500));
}

#[tokio::test(start_paused = true)]
async fn pause_freezes_at_tick_multiple_and_resume_continues() {
    let engine = LoopEngine::default();
    let (callback, count) = counting_callback();
    engine.set_on_loop_end(callback).await;
    engine.set_max_value(500).await;

    let runner = engine.clone();
    tokio::spawn(async move {
        let _ = runner.start_looping().await;
    });

    sleep(Duration::from_millis(250)).await;
    engine.pause_looping().await;

    assert!(engine.is_paused());
    assert!(!engine.is_looping());
    // The interrupted tick snaps back one step, leaving a settled multiple
    assert_eq!(engine.state().await.value, Some(200));
    assert_eq!(count.load(Ordering::SeqCst), 0);

    engine.resume_looping().await.unwrap();

    assert_eq!(engine.state().await.value, Some(500));
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_resets_progress_without_completion() {
    let engine = LoopEngine::default();
    let (callback, count) = counting_callback();
    engine.set_on_loop_end(callback).await;
    engine.set_max_value(500).await;

    let runner = engine.clone();
    tokio::spawn(async move {
        let _ = runner.start_looping().await;
    });

    sleep(Duration::from_millis(250)).await;
    engine.stop_looping().await;

    assert!(engine.is_stopped());
    assert!(!engine.is_looping());
    assert_eq!(engine.state().await.value, Some(0));
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn resume_without_pause_is_a_no_op() {
    let engine = LoopEngine::default();
    let (callback, count) = counting_callback();
    engine.set_on_loop_end(callback).await;
    engine.set_max_value(500).await;

    engine.resume_looping().await.unwrap();

    assert!(!engine.is_looping());
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn restart_halts_the_running_cycle_first() {
    let engine = LoopEngine::default();
    let (callback, count) = counting_callback();
    engine.set_on_loop_end(callback).await;
    engine.set_max_value(500).await;

    let runner = engine.clone();
    tokio::spawn(async move {
        let _ = runner.start_looping().await;
    });
    sleep(Duration::from_millis(150)).await;

    // Second start interrupts the first cycle; only one completion fires
    engine.start_looping().await.unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(engine.state().await.value, Some(500));
}

#[tokio::test(start_paused = true)]
async fn go_to_loop_end_jumps_and_optionally_completes() {
    let engine = LoopEngine::new(LoopTiming::default());
    let (callback, count) = counting_callback();
    engine.set_on_loop_end(callback).await;
    engine.set_max_value(500).await;

    engine.go_to_loop_end(false).await.unwrap();
    assert_eq!(engine.state().await.value, Some(500));
    assert_eq!(count.load(Ordering::SeqCst), 0);

    engine.go_to_loop_end(true).await.unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn clear_returns_to_unset_sentinel() {
    let engine = LoopEngine::default();
    engine.set_max_value(500).await;
    engine.set_indeterminate(true).await;
    engine.go_to_loop_start().await;

    engine.clear().await;

    let state = engine.state().await;
    assert_eq!(state.value, None);
    assert_eq!(state.max_value, None);
    assert!(!state.indeterminate);
}
