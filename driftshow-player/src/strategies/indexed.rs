//! Generic indexed-list player strategy
//!
//! One implementation serves the database, pinned and history players; the
//! differences (item source, randomness, rewind policy, initial cursor) live
//! in the injected [`ListSource`].
//!
//! Cursor semantics: `index` is `None` until the first show ("undefined
//! position" sentinel). Sequential advancement wraps unconditionally at both
//! ends. Random mode picks a uniformly random index with no guarantee
//! against immediately repeating the current item.
//!
//! Reentrancy: `next`/`previous` fail fast with `TransitionInProgress` while
//! a transition is still settling. Cancellation: `stop()` bumps a generation
//! counter; an advancement that was mid-flight when the generation moved
//! discards its work instead of applying it to a stopped player.

use super::{present_item, spawn_loop_cycle, Direction, ListSource, PlayerStrategy};
use crate::context::PlayerContext;
use crate::error::{Error, Result};
use async_trait::async_trait;
use driftshow_common::{Item, PlayerEvent, PlayerName};
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Default)]
struct IndexedState {
    items: Vec<Item>,
    index: Option<usize>,
    item: Option<Item>,
    /// Pre-selected look-ahead; non-null only between a completed
    /// pre-selection and its consumption by the next transition
    next_item: Option<Item>,
    next_index: Option<usize>,
}

/// Indexed-list strategy shared by the database, pinned and history players
pub struct IndexedPlayer {
    source: Box<dyn ListSource>,
    ctx: PlayerContext,
    state: RwLock<IndexedState>,
    stopped: AtomicBool,
    paused: AtomicBool,
    on_hold: AtomicBool,
    in_transition: AtomicBool,
    generation: AtomicU64,
}

impl IndexedPlayer {
    pub fn new(source: Box<dyn ListSource>, ctx: PlayerContext) -> Self {
        Self {
            source,
            ctx,
            state: RwLock::new(IndexedState::default()),
            stopped: AtomicBool::new(true),
            paused: AtomicBool::new(false),
            on_hold: AtomicBool::new(false),
            in_transition: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Item list length (test/diagnostic accessor)
    pub async fn item_count(&self) -> usize {
        self.state.read().await.items.len()
    }

    /// Current cursor position (test/diagnostic accessor)
    pub async fn index(&self) -> Option<usize> {
        self.state.read().await.index
    }

    fn is_active(&self) -> bool {
        !self.stopped.load(Ordering::Acquire) && !self.on_hold.load(Ordering::Acquire)
    }

    async fn register_loop_end(me: &Arc<Self>) {
        let ctx = me.ctx.clone();
        let me = Arc::clone(me);
        ctx
            .loop_engine
            .set_on_loop_end(Arc::new(move || {
                let me = Arc::clone(&me);
                Box::pin(async move { me.on_loop_end().await })
            }))
            .await;
    }

    /// Loop completion re-enters the strategy to advance automatically
    async fn on_loop_end(self: Arc<Self>) -> Result<()> {
        if !self.is_active() || self.paused.load(Ordering::Acquire) {
            return Ok(());
        }
        let src = self.state.read().await.item.as_ref().map(|i| i.src.clone());
        self.ctx.events.emit_lossy(PlayerEvent::LoopCompleted {
            src,
            timestamp: chrono::Utc::now(),
        });
        match self.advance(Direction::Next, true).await {
            // A user-driven transition beat us to it; nothing to do
            Err(Error::TransitionInProgress) => Ok(()),
            other => other,
        }
    }

    async fn advance(&self, direction: Direction, animate: bool) -> Result<()> {
        if self.in_transition.swap(true, Ordering::AcqRel) {
            return Err(Error::TransitionInProgress);
        }
        let result = self.do_advance(direction, animate).await;
        self.in_transition.store(false, Ordering::Release);
        result
    }

    async fn do_advance(&self, direction: Direction, animate: bool) -> Result<()> {
        let generation = self.generation.load(Ordering::Acquire);
        self.ctx.loop_engine.stop_looping().await;
        if self.generation.load(Ordering::Acquire) != generation {
            // Stopped or reset while we waited for the loop to halt
            return Ok(());
        }

        let random = self.source.random_enabled().await;
        let (index, item) = {
            let mut state = self.state.write().await;
            if state.items.is_empty() {
                drop(state);
                self.stopped.store(true, Ordering::Release);
                return Err(match direction {
                    Direction::Next => Error::NoNextItem,
                    Direction::Previous => Error::NoPreviousItem,
                });
            }
            let len = state.items.len();
            let index = if random {
                // Direct indexing; immediate repeats are possible
                rand::thread_rng().gen_range(0..len)
            } else {
                match direction {
                    Direction::Next => match (state.next_index, state.next_item.is_some()) {
                        // Consume the pre-selected look-ahead
                        (Some(next_index), true) if next_index < len => next_index,
                        _ => state
                            .index
                            .map(|i| if i + 1 >= len { 0 } else { i + 1 })
                            .unwrap_or(0),
                    },
                    Direction::Previous => state
                        .index
                        .map(|i| if i == 0 { len - 1 } else { i - 1 })
                        .unwrap_or(len - 1),
                }
            };
            state.next_item = None;
            state.next_index = None;
            let Some(item) = state.items.get(index).cloned() else {
                drop(state);
                self.stopped.store(true, Ordering::Release);
                return Err(match direction {
                    Direction::Next => Error::NoNextItem,
                    Direction::Previous => Error::NoPreviousItem,
                });
            };
            (index, item)
        };

        debug!(
            "{} player advancing to index {} ({})",
            self.source.player_name(),
            index,
            item.src
        );
        self.show_at(generation, index, item, animate).await
    }

    async fn show_at(&self, generation: u64, index: usize, item: Item, animate: bool) -> Result<()> {
        present_item(&self.ctx, self.source.player_name(), &item, animate).await?;

        // The show awaited the load/transition signals; stop or a fresh
        // start may have won the race while we were blocked
        if self.generation.load(Ordering::Acquire) != generation {
            return Ok(());
        }
        if self.paused.load(Ordering::Acquire) || !self.is_active() {
            self.ctx.switcher.pause_item(None).await;
        } else {
            spawn_loop_cycle(&self.ctx);
        }

        let mut state = self.state.write().await;
        state.index = Some(index);
        state.item = Some(item);
        // Pre-select the sequential follower to hide latency on the next
        // advance; the random branch ignores it
        let len = state.items.len();
        if len > 0 {
            let following = if index + 1 >= len { 0 } else { index + 1 };
            state.next_index = Some(following);
            state.next_item = state.items.get(following).cloned();
        }
        Ok(())
    }
}

#[async_trait]
impl PlayerStrategy for IndexedPlayer {
    fn name(&self) -> PlayerName {
        self.source.player_name()
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
        let name = self.name();
        info!("Starting {} player", name);
        self.stopped.store(false, Ordering::Release);
        self.paused.store(false, Ordering::Release);
        self.on_hold.store(false, Ordering::Release);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        let items = self
            .source
            .load()
            .await
            .map_err(|e| e.in_action("start"))?;
        if items.is_empty() {
            self.stopped.store(true, Ordering::Release);
            return Err(Error::EmptySource(name).in_action("start"));
        }

        let len = items.len();
        let initial = if self.source.random_enabled().await {
            rand::thread_rng().gen_range(0..len)
        } else {
            self.source.initial_index(len)
        };
        {
            let mut state = self.state.write().await;
            state.items = items;
            state.index = None;
            state.item = None;
            state.next_item = None;
            state.next_index = None;
        }
        Self::register_loop_end(&self).await;

        if self.in_transition.swap(true, Ordering::AcqRel) {
            return Err(Error::TransitionInProgress.in_action("start"));
        }
        let Some(item) = self.state.read().await.items.get(initial).cloned() else {
            self.in_transition.store(false, Ordering::Release);
            self.stopped.store(true, Ordering::Release);
            return Err(Error::NoNextItem.in_action("start"));
        };
        let result = self.show_at(generation, initial, item, false).await;
        self.in_transition.store(false, Ordering::Release);
        result.map_err(|e| e.in_action("start"))
    }

    async fn stop(&self) {
        info!("Stopping {} player", self.name());
        self.stopped.store(true, Ordering::Release);
        self.paused.store(false, Ordering::Release);
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.ctx.loop_engine.stop_looping().await;
        self.ctx.switcher.pause_item(None).await;
    }

    async fn pause(&self) {
        if !self.can_pause().await {
            return;
        }
        debug!("Pausing {} player", self.name());
        self.paused.store(true, Ordering::Release);
        self.ctx.loop_engine.pause_looping().await;
        self.ctx.switcher.pause_item(None).await;
    }

    async fn resume(&self) -> Result<()> {
        if !self.can_resume().await {
            return Ok(());
        }
        debug!("Resuming {} player", self.name());
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
        self.advance(Direction::Next, animate)
            .await
            .map_err(|e| e.in_action("next"))
    }

    async fn previous(self: Arc<Self>, animate: bool) -> Result<()> {
        self.advance(Direction::Previous, animate)
            .await
            .map_err(|e| e.in_action("previous"))
    }

    async fn can_next(&self) -> bool {
        !self.state.read().await.items.is_empty()
    }

    async fn can_previous(&self) -> bool {
        if self.state.read().await.items.is_empty() {
            return false;
        }
        self.source.always_wraps_previous() || !self.source.random_enabled().await
    }

    async fn can_pause(&self) -> bool {
        self.is_active() && !self.paused.load(Ordering::Acquire)
    }

    async fn can_resume(&self) -> bool {
        !self.stopped.load(Ordering::Acquire) && self.paused.load(Ordering::Acquire)
    }

    async fn set_on_hold(&self) {
        info!("{} player going on hold", self.name());
        self.on_hold.store(true, Ordering::Release);
        self.ctx.loop_engine.pause_looping().await;
        self.ctx.switcher.pause_item(None).await;
    }

    async fn leave_on_hold_and_resume(self: Arc<Self>) -> Result<()> {
        info!("{} player leaving on-hold", self.name());
        self.on_hold.store(false, Ordering::Release);
        let last = self.state.read().await.item.clone();
        match last {
            Some(item) => {
                self.paused.store(false, Ordering::Release);
                Self::register_loop_end(&self).await;
                self.ctx.loop_engine.stop_looping().await;
                let generation = self.generation.load(Ordering::Acquire);
                present_item(&self.ctx, self.name(), &item, false)
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
        debug!("Resetting {} player", self.name());
        self.stopped.store(true, Ordering::Release);
        self.paused.store(false, Ordering::Release);
        self.on_hold.store(false, Ordering::Release);
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.ctx.loop_engine.stop_looping().await;
        self.ctx.loop_engine.clear().await;
        let mut state = self.state.write().await;
        *state = IndexedState::default();
    }

    async fn on_delete_item(self: Arc<Self>, item: &Item) -> Result<()> {
        let removed = {
            let mut state = self.state.write().await;
            let Some(pos) = state.items.iter().position(|i| i.src == item.src) else {
                return Ok(());
            };
            state.items.remove(pos);
            if let Some(index) = state.index {
                if pos <= index {
                    // Shift the cursor down; position 0 collapses to the
                    // undefined-position sentinel
                    state.index = index.checked_sub(1);
                }
            }
            state.next_item = None;
            state.next_index = None;
            if state.item.as_ref().map(|c| c.src == item.src).unwrap_or(false) {
                state.item = None;
            }
            true
        };
        debug!(
            "{} player removed deleted item {} (removed={})",
            self.name(),
            item.src,
            removed
        );

        if self.is_active() {
            // Advance away from the stale content immediately
            match self.advance(Direction::Next, true).await {
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
