//! Media rendering surface collaborator
//!
//! The switcher drives the rendering layer only through this trait; the
//! rendering layer answers asynchronously through the switcher's
//! `on_item_loaded` / `on_item_error` / `on_transition_end` signal hooks.

use crate::switcher::Slot;
use driftshow_common::Item;

/// Rendering surface the switcher stages media into
///
/// Methods are synchronous fire-and-forget; completion is reported back via
/// the switcher signal hooks.
pub trait MediaSurface: Send + Sync {
    /// Begin loading the given cache-busted src into a buffer slot
    fn stage(&self, slot: Slot, item: &Item, src: &str);

    /// Start media playback for a slot (video content only)
    fn play(&self, slot: Slot);

    /// Pause media playback for a slot (video content only)
    fn pause(&self, slot: Slot);

    /// Natural duration of the slot's content in milliseconds, when known
    fn duration_ms(&self, slot: Slot) -> Option<u64>;

    /// Begin the outgoing cross-fade on a slot
    fn begin_transition(&self, slot: Slot);
}
