//! Dependency bundle injected into strategies and the orchestrator
//!
//! Everything the playback core touches arrives through this context:
//! no ambient singletons, so tests instantiate isolated instances per case.

use crate::fetch::ItemFetcher;
use crate::loop_engine::LoopEngine;
use crate::switcher::ItemSwitcher;
use driftshow_common::{EventBus, HistoryStore, PinnedStore, SharedOptions};
use std::sync::Arc;

/// Cloneable handle set shared by the orchestrator and all strategies
#[derive(Clone)]
pub struct PlayerContext {
    pub fetcher: Arc<dyn ItemFetcher>,
    pub options: SharedOptions,
    pub pinned: PinnedStore,
    pub history: HistoryStore,
    pub events: EventBus,
    pub switcher: Arc<ItemSwitcher>,
    pub loop_engine: LoopEngine,
}
