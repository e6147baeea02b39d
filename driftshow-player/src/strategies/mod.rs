//! Player strategies - four interchangeable playback lifecycles
//!
//! All four strategies (filesystem-random, database-filtered, pinned-list,
//! history) implement one capability set, [`PlayerStrategy`]. The three
//! list-backed strategies differ only in source and randomness policy and
//! share a single generic implementation, [`IndexedPlayer`], parametrized by
//! a [`ListSource`]. The filesystem strategy is the one streaming-fetch
//! implementation, [`FilesystemPlayer`].
//!
//! Lifecycle: Idle → Playing on `start()`; Playing ↔ Paused; Playing →
//! OnHold via `set_on_hold()` for temporary strategy swaps (state preserved);
//! any → Stopped on `stop()` or when the source runs empty.

mod filesystem;
mod indexed;
mod sources;

pub use filesystem::FilesystemPlayer;
pub use indexed::IndexedPlayer;
pub use sources::{DatabaseSource, HistorySource, ListSource, PinnedSource};

use crate::context::PlayerContext;
use crate::error::Result;
use async_trait::async_trait;
use driftshow_common::{Item, PlayerEvent, PlayerName};
use std::sync::Arc;
use tracing::error;

/// Advancement direction for indexed strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Uniform lifecycle contract all four strategies implement
///
/// One instance per strategy; instances persist across strategy switches so
/// an on-hold strategy can resume without re-fetching.
#[async_trait]
pub trait PlayerStrategy: Send + Sync {
    fn name(&self) -> PlayerName;

    async fn is_stopped(&self) -> bool;
    async fn is_paused(&self) -> bool;
    async fn is_on_hold(&self) -> bool;

    /// Enter Playing from Idle: load the source and show the first item
    async fn start(self: Arc<Self>) -> Result<()>;

    /// Terminate: cancel timers, discard in-flight fetches
    async fn stop(&self);

    async fn pause(&self);
    async fn resume(&self) -> Result<()>;

    async fn next(self: Arc<Self>, animate: bool) -> Result<()>;
    async fn previous(self: Arc<Self>, animate: bool) -> Result<()>;

    async fn can_next(&self) -> bool;
    async fn can_previous(&self) -> bool;
    async fn can_pause(&self) -> bool;
    async fn can_resume(&self) -> bool;

    /// Suspend without full stop, for a temporary strategy swap
    async fn set_on_hold(&self);

    /// Re-activate after `set_on_hold`: resume the last shown item or fall
    /// through to a fresh `start()`
    async fn leave_on_hold_and_resume(self: Arc<Self>) -> Result<()>;

    /// Restore pristine state (lists cleared, loop progress unset)
    async fn reset(&self);

    /// React to out-of-band deletion of a shown/queued item
    async fn on_delete_item(self: Arc<Self>, item: &Item) -> Result<()>;

    /// Item currently shown by this strategy, if any
    async fn current_item(&self) -> Option<Item>;
}

/// Shared show sequence: stage, await the transition, arm the progress bar
///
/// Hands the item to the switcher, resolves the target duration (natural
/// video duration when available, else the configured slideshow interval),
/// appends to the history log (unless the history strategy itself is
/// showing) and emits `ItemShown`. Deliberately does NOT start a loop
/// cycle: the show awaits the rendering layer's load signal, so pause or
/// stop may land mid-flight and the caller must re-check its own lifecycle
/// flags after this returns before spawning [`spawn_loop_cycle`].
pub(crate) async fn present_item(
    ctx: &PlayerContext,
    player: PlayerName,
    item: &Item,
    animate: bool,
) -> Result<()> {
    ctx.loop_engine.set_indeterminate(true).await;
    ctx.switcher.set_next_item(item).await;
    ctx.switcher.show_next_item(animate).await?;

    let duration = ctx
        .switcher
        .item_duration(None)
        .await
        .filter(|d| *d > 0);
    let max = match duration {
        Some(d) => d,
        None => ctx.options.interval_ms().await,
    };
    ctx.loop_engine.set_max_value(max).await;
    ctx.loop_engine.set_indeterminate(false).await;
    ctx.switcher.play_item(None).await;

    if player != PlayerName::History {
        ctx.history.push(item.clone()).await;
    }
    ctx.events.emit_lossy(PlayerEvent::ItemShown {
        src: item.src.clone(),
        player,
        timestamp: chrono::Utc::now(),
    });
    Ok(())
}

/// Run a fresh loop cycle on a background task, logging its error
pub(crate) fn spawn_loop_cycle(ctx: &PlayerContext) {
    let engine = ctx.loop_engine.clone();
    tokio::spawn(async move {
        if let Err(e) = engine.start_looping().await {
            error!("Loop cycle ended with error: {}", e);
        }
    });
}
