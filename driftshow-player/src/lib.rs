//! driftshow-player - slideshow playback core
//!
//! The engine behind the slideshow: a progress loop driving automatic
//! advancement, a double-buffered item switcher performing crossfades, four
//! interchangeable player strategies over different item sources, and an
//! orchestrator that selects and drives the active strategy.
//!
//! External collaborators (the item-fetch backend and the media display
//! surface) are injected through the [`fetch::ItemFetcher`] and
//! [`surface::MediaSurface`] traits; nothing in this crate performs I/O of
//! its own.

pub mod context;
pub mod error;
pub mod fetch;
pub mod loop_engine;
pub mod orchestrator;
pub mod strategies;
pub mod surface;
pub mod switcher;

pub use context::PlayerContext;
pub use error::{Error, Result};
pub use fetch::ItemFetcher;
pub use loop_engine::{LoopEndFn, LoopEngine, LoopState, LoopTiming};
pub use orchestrator::Orchestrator;
pub use strategies::{
    DatabaseSource, Direction, FilesystemPlayer, HistorySource, IndexedPlayer, ListSource,
    PinnedSource, PlayerStrategy,
};
pub use surface::MediaSurface;
pub use switcher::{DisplayFlags, ItemSwitcher, Slot, SlotView};
