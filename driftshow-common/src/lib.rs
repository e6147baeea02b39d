//! # Driftshow Common Library (driftshow-common)
//!
//! Shared value types and infrastructure for the driftshow media slideshow
//! playback core.
//!
//! **Purpose:** Defines the displayable `Item` model, the typed `EventBus`
//! used for cross-component notification, the `SourceOptions` filter state,
//! and the pinned/history item stores that the player strategies read from.
//!
//! **Architecture:** All shared mutable state uses the `Arc<RwLock<T>>`
//! pattern with cloneable handles; there are no ambient singletons. The
//! playback crate (`driftshow-player`) receives these handles via explicit
//! dependency injection.

pub mod events;
pub mod item;
pub mod options;
pub mod stores;
pub mod telemetry;

pub use events::{EventBus, PlaybackState, PlayerEvent, PlayerName};
pub use item::{Dimensions, Item, ItemError, ItemKind, RawItem};
pub use options::{MediaKind, SharedOptions, SourceOptions, TagsOperator};
pub use stores::{HistoryStore, PinnedStore};
