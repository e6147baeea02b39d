//! Item double-buffer switcher
//!
//! Holds two buffer slots ("item1"/"item2"), loads media into the inactive
//! slot, waits for the rendering layer's load/error signal, then swaps
//! visibility with an optional animated cross-fade.
//!
//! Failure semantics: a media load error marks the slot `is_error` and is
//! treated as non-fatal. The swap still happens (degraded display) so the
//! loop keeps advancing instead of blocking on one broken file.
//!
//! Staleness: every staging bumps a generation counter; a load signal that
//! resolves after the slot was restaged (or after a stop tore the cycle
//! down) is discarded, never applied.

use crate::error::{Error, Result};
use crate::surface::MediaSurface;
use driftshow_common::Item;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tracing::{debug, warn};

type LoadSignal = std::result::Result<(), String>;

/// Buffer slot identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    One,
    Two,
}

impl Slot {
    pub fn other(self) -> Slot {
        match self {
            Slot::One => Slot::Two,
            Slot::Two => Slot::One,
        }
    }

    fn index(self) -> usize {
        match self {
            Slot::One => 0,
            Slot::Two => 1,
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::One => write!(f, "item1"),
            Slot::Two => write!(f, "item2"),
        }
    }
}

/// Shared display flags the UI layer consumes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayFlags {
    pub is_video: bool,
    pub is_item_paused: bool,
}

#[derive(Default)]
struct SlotState {
    data: Option<Item>,
    src: Option<String>,
    is_loaded: bool,
    is_error: bool,
    generation: u64,
    load_tx: Option<oneshot::Sender<LoadSignal>>,
    load_rx: Option<oneshot::Receiver<LoadSignal>>,
    transition_tx: Option<oneshot::Sender<()>>,
}

impl SlotState {
    fn clear(&mut self) {
        self.data = None;
        self.src = None;
        self.is_loaded = false;
        self.is_error = false;
        self.load_tx = None;
        self.load_rx = None;
        self.transition_tx = None;
    }
}

/// Read-only snapshot of one buffer slot
#[derive(Debug, Clone)]
pub struct SlotView {
    pub data: Option<Item>,
    pub src: Option<String>,
    pub is_loaded: bool,
    pub is_error: bool,
}

/// Double-buffered display coordinator
///
/// Invariant: exactly one slot is "front" (opacity 1, elevated z-order) at
/// any settled time; during an animated transition both may be momentarily
/// visible.
pub struct ItemSwitcher {
    slots: RwLock<[SlotState; 2]>,
    front: RwLock<Slot>,
    cache_token: AtomicU64,
    flags: RwLock<DisplayFlags>,
    surface: Arc<dyn MediaSurface>,
}

impl ItemSwitcher {
    pub fn new(surface: Arc<dyn MediaSurface>) -> Self {
        Self {
            slots: RwLock::new([SlotState::default(), SlotState::default()]),
            front: RwLock::new(Slot::One),
            cache_token: AtomicU64::new(0),
            flags: RwLock::new(DisplayFlags::default()),
            surface,
        }
    }

    /// Slot currently marked front
    pub async fn front(&self) -> Slot {
        *self.front.read().await
    }

    /// Item currently displayed (front slot data)
    pub async fn current_item(&self) -> Option<Item> {
        let front = *self.front.read().await;
        self.slots.read().await[front.index()].data.clone()
    }

    pub async fn slot_view(&self, slot: Slot) -> SlotView {
        let slots = self.slots.read().await;
        let state = &slots[slot.index()];
        SlotView {
            data: state.data.clone(),
            src: state.src.clone(),
            is_loaded: state.is_loaded,
            is_error: state.is_error,
        }
    }

    pub async fn flags(&self) -> DisplayFlags {
        *self.flags.read().await
    }

    /// Stage an item into the inactive slot and arm a fresh load signal
    ///
    /// The slot src is cache-busted with a monotonically increasing token so
    /// the rendering layer reloads even when the same path repeats.
    pub async fn set_next_item(&self, item: &Item) {
        let back = self.front.read().await.other();
        let token = self.cache_token.fetch_add(1, Ordering::AcqRel) + 1;
        let busted = format!("{}?v={}", item.src, token);
        let (tx, rx) = oneshot::channel();
        {
            let mut slots = self.slots.write().await;
            let slot = &mut slots[back.index()];
            slot.data = Some(item.clone());
            slot.src = Some(busted.clone());
            slot.is_loaded = false;
            slot.is_error = false;
            slot.generation += 1;
            slot.load_tx = Some(tx);
            slot.load_rx = Some(rx);
            slot.transition_tx = None;
        }
        debug!("Staged {} into {}", item.src, back);
        self.surface.stage(back, item, &busted);
    }

    /// Await the staged slot's load signal, then swap front and back
    ///
    /// With `animate`, additionally awaits the outgoing slot's
    /// transition-end signal, producing a cross-fade. Resolves without
    /// swapping when the staged slot went stale under us.
    pub async fn show_next_item(&self, animate: bool) -> Result<()> {
        let back = self.front.read().await.other();
        let (rx, staged_generation) = {
            let mut slots = self.slots.write().await;
            let slot = &mut slots[back.index()];
            let rx = slot
                .load_rx
                .take()
                .ok_or_else(|| Error::InvalidState("no staged item to show".into()))?;
            (rx, slot.generation)
        };

        let signal = match rx.await {
            Ok(signal) => signal,
            // Sender dropped: the slot was restaged while we waited
            Err(_) => return Ok(()),
        };

        {
            let mut slots = self.slots.write().await;
            let slot = &mut slots[back.index()];
            if slot.generation != staged_generation {
                debug!("Discarding stale load resolution for {}", back);
                return Ok(());
            }
            match signal {
                Ok(()) => slot.is_loaded = true,
                Err(message) => {
                    slot.is_error = true;
                    warn!("Media load failed for {}: {} (showing anyway)", back, message);
                }
            }
        }

        let outgoing = {
            let mut front = self.front.write().await;
            let outgoing = *front;
            *front = back;
            outgoing
        };
        debug!("Swapped front to {}", back);

        if animate {
            let rx = {
                let (tx, rx) = oneshot::channel();
                let mut slots = self.slots.write().await;
                slots[outgoing.index()].transition_tx = Some(tx);
                rx
            };
            self.surface.begin_transition(outgoing);
            // A dropped sender just means the slot was torn down mid-fade
            let _ = rx.await;
        }

        self.slots.write().await[outgoing.index()].clear();
        Ok(())
    }

    /// Rendering-layer signal: the staged media element finished loading
    pub async fn on_item_loaded(&self, slot: Slot) {
        let mut slots = self.slots.write().await;
        let state = &mut slots[slot.index()];
        state.is_loaded = true;
        if let Some(tx) = state.load_tx.take() {
            let _ = tx.send(Ok(()));
        }
    }

    /// Rendering-layer signal: the staged media element failed to load
    pub async fn on_item_error(&self, slot: Slot, message: impl Into<String>) {
        let message = message.into();
        let mut slots = self.slots.write().await;
        let state = &mut slots[slot.index()];
        state.is_error = true;
        if let Some(tx) = state.load_tx.take() {
            let _ = tx.send(Err(message));
        }
    }

    /// Rendering-layer signal: the outgoing slot's cross-fade finished
    pub async fn on_transition_end(&self, slot: Slot) {
        let mut slots = self.slots.write().await;
        if let Some(tx) = slots[slot.index()].transition_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Natural duration of the slot's content in milliseconds
    ///
    /// `None` for images and empty slots; a zero/unreported video duration
    /// resolves to `Some(0)` so callers fall back to the slideshow interval.
    pub async fn item_duration(&self, slot: Option<Slot>) -> Option<u64> {
        let slot = match slot {
            Some(slot) => slot,
            None => *self.front.read().await,
        };
        let is_video = {
            let slots = self.slots.read().await;
            slots[slot.index()]
                .data
                .as_ref()
                .map(|d| d.is_video())
                .unwrap_or(false)
        };
        if !is_video {
            return None;
        }
        Some(self.surface.duration_ms(slot).unwrap_or(0))
    }

    /// Start media playback for video content; always refreshes the shared
    /// display flags
    pub async fn play_item(&self, slot: Option<Slot>) {
        let slot = match slot {
            Some(slot) => slot,
            None => *self.front.read().await,
        };
        let is_video = {
            let slots = self.slots.read().await;
            slots[slot.index()]
                .data
                .as_ref()
                .map(|d| d.is_video())
                .unwrap_or(false)
        };
        {
            let mut flags = self.flags.write().await;
            flags.is_video = is_video;
            flags.is_item_paused = false;
        }
        if is_video {
            self.surface.play(slot);
        }
    }

    /// Pause media playback for video content; always refreshes the shared
    /// display flags
    pub async fn pause_item(&self, slot: Option<Slot>) {
        let slot = match slot {
            Some(slot) => slot,
            None => *self.front.read().await,
        };
        let is_video = {
            let slots = self.slots.read().await;
            slots[slot.index()]
                .data
                .as_ref()
                .map(|d| d.is_video())
                .unwrap_or(false)
        };
        {
            let mut flags = self.flags.write().await;
            flags.is_video = is_video;
            flags.is_item_paused = true;
        }
        if is_video {
            self.surface.pause(slot);
        }
    }

    /// Clear both slots and restore the initial front assignment
    pub async fn reset(&self) {
        let mut slots = self.slots.write().await;
        slots[0].clear();
        slots[1].clear();
        *self.front.write().await = Slot::One;
        *self.flags.write().await = DisplayFlags::default();
    }
}
