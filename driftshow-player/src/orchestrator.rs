//! Player orchestrator - selects and drives the active strategy
//!
//! Owns one persistent instance of each strategy and forwards playback
//! commands to whichever is active. Strategy switches to and from the
//! history browser suspend the outgoing strategy with `set_on_hold` rather
//! than stopping it, so it can resume exactly where it left off.
//!
//! Deletion fan-out is synchronous and ordered: the fetch API first, then
//! the stores, then every strategy, and only then the `ItemDeleted` event.

use crate::context::PlayerContext;
use crate::error::{Error, Result};
use crate::strategies::{
    DatabaseSource, FilesystemPlayer, HistorySource, IndexedPlayer, PinnedSource, PlayerStrategy,
};
use driftshow_common::{Item, PlaybackState, PlayerEvent, PlayerName, SourceOptions};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Top-level playback coordinator
pub struct Orchestrator {
    ctx: PlayerContext,
    players: HashMap<PlayerName, Arc<dyn PlayerStrategy>>,
    active: RwLock<Option<PlayerName>>,
    previous_player: RwLock<Option<PlayerName>>,
    /// Set by the first successful start; history switching is meaningless
    /// before anything has played
    can_switch_player: AtomicBool,
}

impl Orchestrator {
    pub fn new(ctx: PlayerContext) -> Self {
        let mut players: HashMap<PlayerName, Arc<dyn PlayerStrategy>> = HashMap::new();
        players.insert(
            PlayerName::Filesystem,
            Arc::new(FilesystemPlayer::new(ctx.clone())),
        );
        players.insert(
            PlayerName::Database,
            Arc::new(IndexedPlayer::new(
                Box::new(DatabaseSource {
                    fetcher: Arc::clone(&ctx.fetcher),
                    options: ctx.options.clone(),
                }),
                ctx.clone(),
            )),
        );
        players.insert(
            PlayerName::Pinned,
            Arc::new(IndexedPlayer::new(
                Box::new(PinnedSource {
                    pinned: ctx.pinned.clone(),
                    options: ctx.options.clone(),
                }),
                ctx.clone(),
            )),
        );
        players.insert(
            PlayerName::History,
            Arc::new(IndexedPlayer::new(
                Box::new(HistorySource {
                    history: ctx.history.clone(),
                }),
                ctx.clone(),
            )),
        );
        Self {
            ctx,
            players,
            active: RwLock::new(None),
            previous_player: RwLock::new(None),
            can_switch_player: AtomicBool::new(false),
        }
    }

    /// Strategy implied by the current source options
    ///
    /// Pinned playback wins over filters; filters win over the plain
    /// filesystem stream.
    pub fn select_player(options: &SourceOptions) -> PlayerName {
        if options.from_pinned {
            PlayerName::Pinned
        } else if options.has_filters() {
            PlayerName::Database
        } else {
            PlayerName::Filesystem
        }
    }

    fn player(&self, name: PlayerName) -> Arc<dyn PlayerStrategy> {
        // All four names are inserted in new(); the map is never mutated
        Arc::clone(&self.players[&name])
    }

    /// Name of the currently active strategy
    pub async fn active_player(&self) -> Option<PlayerName> {
        *self.active.read().await
    }

    async fn active_strategy(&self) -> Option<Arc<dyn PlayerStrategy>> {
        self.active.read().await.map(|name| self.player(name))
    }

    /// Playback state of the active strategy (Stopped when none is active)
    pub async fn playback_state(&self) -> PlaybackState {
        match self.active_strategy().await {
            Some(player) => {
                if player.is_stopped().await {
                    PlaybackState::Stopped
                } else if player.is_paused().await {
                    PlaybackState::Paused
                } else {
                    PlaybackState::Playing
                }
            }
            None => PlaybackState::Stopped,
        }
    }

    /// Item currently shown by the active strategy
    pub async fn current_item(&self) -> Option<Item> {
        match self.active_strategy().await {
            Some(player) => player.current_item().await,
            None => None,
        }
    }

    fn emit_state_change(&self, old_state: PlaybackState, new_state: PlaybackState) {
        if old_state != new_state {
            self.ctx.events.emit_lossy(PlayerEvent::PlaybackStateChanged {
                old_state,
                new_state,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    /// Select a strategy from the current options and start it
    ///
    /// A previously active strategy of a different kind is stopped first.
    pub async fn start(&self) -> Result<()> {
        let old_state = self.playback_state().await;
        let options = self.ctx.options.snapshot().await;
        let target = Self::select_player(&options);

        let from = {
            let mut active = self.active.write().await;
            let from = *active;
            if let Some(outgoing) = from.filter(|name| *name != target) {
                self.player(outgoing).stop().await;
            }
            *active = Some(target);
            from
        };

        info!("Starting {} player (was {:?})", target, from);
        match self.player(target).start().await {
            Ok(()) => {
                self.can_switch_player.store(true, Ordering::Release);
                if from != Some(target) {
                    self.ctx.events.emit_lossy(PlayerEvent::PlayerSwitched {
                        from,
                        to: target,
                        timestamp: chrono::Utc::now(),
                    });
                }
                self.emit_state_change(old_state, PlaybackState::Playing);
                Ok(())
            }
            Err(e) => {
                *self.active.write().await = from;
                Err(e.in_action("start"))
            }
        }
    }

    /// Stop the active strategy
    pub async fn stop(&self) {
        let old_state = self.playback_state().await;
        if let Some(player) = self.active_strategy().await {
            player.stop().await;
        }
        self.ctx.loop_engine.clear().await;
        self.emit_state_change(old_state, PlaybackState::Stopped);
    }

    /// Pause the active strategy, if pausable
    pub async fn pause(&self) {
        let Some(player) = self.active_strategy().await else {
            return;
        };
        if !player.can_pause().await {
            debug!("Pause ignored: {} player not pausable", player.name());
            return;
        }
        let old_state = self.playback_state().await;
        player.pause().await;
        self.emit_state_change(old_state, PlaybackState::Paused);
    }

    /// Resume the active strategy, if paused
    pub async fn resume(&self) -> Result<()> {
        let Some(player) = self.active_strategy().await else {
            return Ok(());
        };
        if !player.can_resume().await {
            debug!("Resume ignored: {} player not resumable", player.name());
            return Ok(());
        }
        let old_state = self.playback_state().await;
        player.resume().await.map_err(|e| e.in_action("resume"))?;
        self.emit_state_change(old_state, PlaybackState::Playing);
        Ok(())
    }

    /// Advance the active strategy to its next item
    pub async fn next(&self, animate: bool) -> Result<()> {
        let player = self
            .active_strategy()
            .await
            .ok_or_else(|| Error::InvalidState("no active player".into()).in_action("next"))?;
        player.next(animate).await.map_err(|e| e.in_action("next"))
    }

    /// Rewind the active strategy to its previous item
    pub async fn previous(&self, animate: bool) -> Result<()> {
        let player = self
            .active_strategy()
            .await
            .ok_or_else(|| Error::InvalidState("no active player".into()).in_action("previous"))?;
        player
            .previous(animate)
            .await
            .map_err(|e| e.in_action("previous"))
    }

    /// Suspend the active strategy and start browsing history
    ///
    /// No-op before the first start and when history is already active.
    pub async fn switch_to_history_player(&self) -> Result<()> {
        if !self.can_switch_player.load(Ordering::Acquire) {
            debug!("History switch ignored: nothing has played yet");
            return Ok(());
        }
        let Some(outgoing) = self.active_player().await else {
            return Ok(());
        };
        if outgoing == PlayerName::History {
            return Ok(());
        }

        info!("Switching from {} player to history", outgoing);
        self.player(outgoing).set_on_hold().await;
        *self.previous_player.write().await = Some(outgoing);
        *self.active.write().await = Some(PlayerName::History);

        match self.player(PlayerName::History).start().await {
            Ok(()) => {
                self.ctx.events.emit_lossy(PlayerEvent::PlayerSwitched {
                    from: Some(outgoing),
                    to: PlayerName::History,
                    timestamp: chrono::Utc::now(),
                });
                Ok(())
            }
            Err(e) => Err(e.in_action("switch_to_history_player")),
        }
    }

    /// Leave the history browser and resume the suspended strategy
    ///
    /// No-op unless history is active.
    pub async fn switch_back_to_previous_player(&self) -> Result<()> {
        if self.active_player().await != Some(PlayerName::History) {
            return Ok(());
        }
        let Some(target) = *self.previous_player.read().await else {
            warn!("No previous player recorded; staying on history");
            return Ok(());
        };

        info!("Switching back from history to {} player", target);
        self.player(PlayerName::History).stop().await;
        *self.active.write().await = Some(target);
        *self.previous_player.write().await = None;

        match self.player(target).leave_on_hold_and_resume().await {
            Ok(()) => {
                self.ctx.events.emit_lossy(PlayerEvent::PlayerSwitched {
                    from: Some(PlayerName::History),
                    to: target,
                    timestamp: chrono::Utc::now(),
                });
                Ok(())
            }
            Err(e) => Err(e.in_action("switch_back_to_previous_player")),
        }
    }

    /// Delete an item everywhere: backend, stores, then every strategy
    ///
    /// The active strategy's `on_delete_item` triggers its own auto-advance.
    /// The `ItemDeleted` event is emitted only after the fan-out, so
    /// subscribers observe fully-settled state.
    pub async fn delete_item(&self, item: &Item) -> Result<()> {
        info!("Deleting item {}", item.src);
        self.ctx
            .fetcher
            .delete_item(item)
            .await
            .map_err(|e| e.in_action("delete_item"))?;
        self.ctx.pinned.remove_by_src(&item.src).await;
        self.ctx.history.remove_by_src(&item.src).await;

        for name in [
            PlayerName::Filesystem,
            PlayerName::Database,
            PlayerName::Pinned,
            PlayerName::History,
        ] {
            if let Err(e) = self.player(name).on_delete_item(item).await {
                warn!("{} player delete handling failed: {}", name, e);
            }
        }

        self.ctx.events.emit_lossy(PlayerEvent::ItemDeleted {
            src: item.src.clone(),
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    /// Reset every strategy and the shared display state
    pub async fn reset(&self) {
        debug!("Resetting orchestrator");
        for player in self.players.values() {
            player.reset().await;
        }
        self.ctx.switcher.reset().await;
        self.ctx.loop_engine.clear().await;
        *self.active.write().await = None;
        *self.previous_player.write().await = None;
        self.can_switch_player.store(false, Ordering::Release);
    }
}
