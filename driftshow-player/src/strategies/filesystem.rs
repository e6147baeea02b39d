//! Filesystem-random player strategy
//!
//! The one non-indexed strategy: no bounded list, no cursor, no `previous`.
//! Every advance asks the fetch API for a server-side random pick from the
//! selected folders.
//!
//! Look-ahead: after showing an item the strategy immediately fetches the
//! item that would come next and parks it in a shared future. When an
//! advance arrives while that fetch is still in flight, the advance awaits
//! the in-flight future instead of issuing a duplicate request. A failed
//! look-ahead only logs a warning; the next advance fetches synchronously.

use super::{present_item, spawn_loop_cycle, PlayerStrategy};
use crate::context::PlayerContext;
use crate::error::{Error, Result};
use async_trait::async_trait;
use driftshow_common::{Item, PlayerEvent, PlayerName};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// In-flight (or completed-and-unconsumed) look-ahead fetch
type SharedFetch = Shared<BoxFuture<'static, std::result::Result<Item, Arc<Error>>>>;

#[derive(Default)]
struct FsState {
    item: Option<Item>,
}

/// Streaming-fetch strategy over the filesystem browser
pub struct FilesystemPlayer {
    ctx: PlayerContext,
    state: RwLock<FsState>,
    look_ahead: Mutex<Option<SharedFetch>>,
    stopped: AtomicBool,
    paused: AtomicBool,
    on_hold: AtomicBool,
    in_transition: AtomicBool,
    generation: AtomicU64,
}

impl FilesystemPlayer {
    pub fn new(ctx: PlayerContext) -> Self {
        Self {
            ctx,
            state: RwLock::new(FsState::default()),
            look_ahead: Mutex::new(None),
            stopped: AtomicBool::new(true),
            paused: AtomicBool::new(false),
            on_hold: AtomicBool::new(false),
            in_transition: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    fn is_active(&self) -> bool {
        !self.stopped.load(Ordering::Acquire) && !self.on_hold.load(Ordering::Acquire)
    }

    async fn register_loop_end(me: &Arc<Self>) {
        let ctx = me.ctx.clone();
        let me = Arc::clone(me);
        ctx.loop_engine
            .set_on_loop_end(Arc::new(move || {
                let me = Arc::clone(&me);
                Box::pin(async move { me.on_loop_end().await })
            }))
            .await;
    }

    async fn on_loop_end(self: Arc<Self>) -> Result<()> {
        if !self.is_active() || self.paused.load(Ordering::Acquire) {
            return Ok(());
        }
        let src = self.state.read().await.item.as_ref().map(|i| i.src.clone());
        self.ctx.events.emit_lossy(PlayerEvent::LoopCompleted {
            src,
            timestamp: chrono::Utc::now(),
        });
        match self.clone().advance(true).await {
            Err(Error::TransitionInProgress) => Ok(()),
            other => other,
        }
    }

    async fn advance(self: Arc<Self>, animate: bool) -> Result<()> {
        if self.in_transition.swap(true, Ordering::AcqRel) {
            return Err(Error::TransitionInProgress);
        }
        let result = Self::do_advance(&self, animate).await;
        self.in_transition.store(false, Ordering::Release);
        result
    }

    async fn do_advance(me: &Arc<Self>, animate: bool) -> Result<()> {
        let generation = me.generation.load(Ordering::Acquire);
        me.ctx.loop_engine.stop_looping().await;
        if me.generation.load(Ordering::Acquire) != generation {
            return Ok(());
        }

        // Consume the look-ahead when one exists: a completed fetch resolves
        // immediately, an in-flight one is awaited rather than duplicated
        let staged = me.look_ahead.lock().await.take();
        let item = match staged {
            Some(shared) => {
                debug!("Consuming look-ahead fetch");
                shared.await.map_err(|e| Error::Fetch(e.to_string()))?
            }
            None => {
                let folders = me.ctx.options.folders().await;
                me.ctx.fetcher.fetch_random_item(&folders).await?
            }
        };

        if me.generation.load(Ordering::Acquire) != generation {
            // Stopped while the fetch was in flight; discard the result
            return Ok(());
        }

        present_item(&me.ctx, PlayerName::Filesystem, &item, animate).await?;

        // The show awaited the load/transition signals; stop or a fresh
        // start may have won the race while we were blocked
        if me.generation.load(Ordering::Acquire) != generation {
            return Ok(());
        }
        if me.paused.load(Ordering::Acquire) || !me.is_active() {
            me.ctx.switcher.pause_item(None).await;
        } else {
            spawn_loop_cycle(&me.ctx);
        }
        me.state.write().await.item = Some(item);

        Self::spawn_look_ahead(me);
        Ok(())
    }

    /// Kick off the background fetch for the item after this one
    fn spawn_look_ahead(me: &Arc<Self>) {
        let me = Arc::clone(me);
        tokio::spawn(async move {
            let generation = me.generation.load(Ordering::Acquire);
            let fetcher = Arc::clone(&me.ctx.fetcher);
            let folders = me.ctx.options.folders().await;
            let fut: BoxFuture<'static, std::result::Result<Item, Arc<Error>>> =
                Box::pin(async move {
                    fetcher
                        .fetch_random_item(&folders)
                        .await
                        .map_err(Arc::new)
                });
            let shared = fut.shared();
            *me.look_ahead.lock().await = Some(shared.clone());

            match shared.await {
                Ok(_) => {
                    // Result stays cached in the shared slot until consumed
                    if me.generation.load(Ordering::Acquire) != generation {
                        // Stopped meanwhile; drop the stale result
                        *me.look_ahead.lock().await = None;
                    }
                }
                Err(e) => {
                    warn!("Look-ahead fetch failed: {} (will fetch on demand)", e);
                    *me.look_ahead.lock().await = None;
                }
            }
        });
    }
}

#[async_trait]
impl PlayerStrategy for FilesystemPlayer {
    fn name(&self) -> PlayerName {
        PlayerName::Filesystem
    }

    async fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    async fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    async fn is_on_hold(&self) -> bool {
        self.on_hold.load(Ordering::Acquire)
    }

    async fn start(self: Arc<Self>) -> Result<()> {
        info!("Starting filesystem player");
        self.stopped.store(false, Ordering::Release);
        self.paused.store(false, Ordering::Release);
        self.on_hold.store(false, Ordering::Release);
        self.generation.fetch_add(1, Ordering::AcqRel);
        *self.look_ahead.lock().await = None;
        Self::register_loop_end(&self).await;
        self.advance(false).await.map_err(|e| e.in_action("start"))
    }

    async fn stop(&self) {
        info!("Stopping filesystem player");
        self.stopped.store(true, Ordering::Release);
        self.paused.store(false, Ordering::Release);
        self.generation.fetch_add(1, Ordering::AcqRel);
        *self.look_ahead.lock().await = None;
        self.ctx.loop_engine.stop_looping().await;
        self.ctx.switcher.pause_item(None).await;
    }

    async fn pause(&self) {
        if !self.can_pause().await {
            return;
        }
        debug!("Pausing filesystem player");
        self.paused.store(true, Ordering::Release);
        self.ctx.loop_engine.pause_looping().await;
        self.ctx.switcher.pause_item(None).await;
    }

    async fn resume(&self) -> Result<()> {
        if !self.can_resume().await {
            return Ok(());
        }
        debug!("Resuming filesystem player");
        self.paused.store(false, Ordering::Release);
        self.ctx.switcher.play_item(None).await;
        let engine = self.ctx.loop_engine.clone();
        tokio::spawn(async move {
            if let Err(e) = engine.resume_looping().await {
                tracing::error!("Resumed loop ended with error: {}", e);
            }
        });
        Ok(())
    }

    async fn next(self: Arc<Self>, animate: bool) -> Result<()> {
        self.advance(animate).await.map_err(|e| e.in_action("next"))
    }

    async fn previous(self: Arc<Self>, _animate: bool) -> Result<()> {
        Err(Error::NoPreviousItem.in_action("previous"))
    }

    async fn can_next(&self) -> bool {
        true
    }

    /// The filesystem source is unbounded and unordered; there is never a
    /// previous item
    async fn can_previous(&self) -> bool {
        false
    }

    async fn can_pause(&self) -> bool {
        self.is_active() && !self.paused.load(Ordering::Acquire)
    }

    async fn can_resume(&self) -> bool {
        !self.stopped.load(Ordering::Acquire) && self.paused.load(Ordering::Acquire)
    }

    async fn set_on_hold(&self) {
        info!("Filesystem player going on hold");
        self.on_hold.store(true, Ordering::Release);
        self.ctx.loop_engine.pause_looping().await;
        self.ctx.switcher.pause_item(None).await;
    }

    async fn leave_on_hold_and_resume(self: Arc<Self>) -> Result<()> {
        info!("Filesystem player leaving on-hold");
        self.on_hold.store(false, Ordering::Release);
        let last = self.state.read().await.item.clone();
        match last {
            Some(item) => {
                self.paused.store(false, Ordering::Release);
                Self::register_loop_end(&self).await;
                self.ctx.loop_engine.stop_looping().await;
                let generation = self.generation.load(Ordering::Acquire);
                present_item(&self.ctx, PlayerName::Filesystem, &item, false)
                    .await
                    .map_err(|e| e.in_action("leave_on_hold_and_resume"))?;
                if self.generation.load(Ordering::Acquire) == generation
                    && !self.paused.load(Ordering::Acquire)
                    && self.is_active()
                {
                    spawn_loop_cycle(&self.ctx);
                }
                Ok(())
            }
            None => self.start().await,
        }
    }

    async fn reset(&self) {
        debug!("Resetting filesystem player");
        self.stopped.store(true, Ordering::Release);
        self.paused.store(false, Ordering::Release);
        self.on_hold.store(false, Ordering::Release);
        self.generation.fetch_add(1, Ordering::AcqRel);
        *self.look_ahead.lock().await = None;
        self.ctx.loop_engine.stop_looping().await;
        self.ctx.loop_engine.clear().await;
        self.state.write().await.item = None;
    }

    async fn on_delete_item(self: Arc<Self>, item: &Item) -> Result<()> {
        let was_current = {
            let mut state = self.state.write().await;
            let matches = state
                .item
                .as_ref()
                .map(|c| c.src == item.src)
                .unwrap_or(false);
            if matches {
                state.item = None;
            }
            matches
        };
        if was_current && self.is_active() {
            match self.clone().advance(true).await {
                Err(Error::TransitionInProgress) => Ok(()),
                other => other.map_err(|e| e.in_action("on_delete_item")),
            }
        } else {
            Ok(())
        }
    }

    async fn current_item(&self) -> Option<Item> {
        self.state.read().await.item.clone()
    }
}
