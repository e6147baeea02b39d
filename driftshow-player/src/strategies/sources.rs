//! List source policies for the indexed strategies
//!
//! Database, pinned and history players differ only in where their bounded
//! item list comes from and in their randomness/rewind policy; each policy is
//! one small `ListSource` implementation plugged into
//! [`IndexedPlayer`](super::IndexedPlayer).

use crate::error::Result;
use crate::fetch::ItemFetcher;
use async_trait::async_trait;
use driftshow_common::{HistoryStore, Item, PinnedStore, PlayerName, SharedOptions};
use std::sync::Arc;

/// Source/randomness policy for one indexed strategy
#[async_trait]
pub trait ListSource: Send + Sync {
    fn player_name(&self) -> PlayerName;

    /// Fetch the bounded item list, once per `start()`
    async fn load(&self) -> Result<Vec<Item>>;

    /// Client-side random pick enabled for this source
    async fn random_enabled(&self) -> bool;

    /// `previous()` stays available even in random mode (history only)
    fn always_wraps_previous(&self) -> bool {
        false
    }

    /// Cursor position shown first after `start()`
    fn initial_index(&self, _len: usize) -> usize {
        0
    }
}

/// Bounded list fetched from the tag/type filter query
pub struct DatabaseSource {
    pub fetcher: Arc<dyn ItemFetcher>,
    pub options: SharedOptions,
}

#[async_trait]
impl ListSource for DatabaseSource {
    fn player_name(&self) -> PlayerName {
        PlayerName::Database
    }

    async fn load(&self) -> Result<Vec<Item>> {
        let opts = self.options.snapshot().await;
        self.fetcher
            .fetch_items_from_db(&opts.tag_ids, opts.tags_operator, &opts.file_types)
            .await
    }

    async fn random_enabled(&self) -> bool {
        self.options.random().await
    }
}

/// Bounded list read from the pinned-items store
pub struct PinnedSource {
    pub pinned: PinnedStore,
    pub options: SharedOptions,
}

#[async_trait]
impl ListSource for PinnedSource {
    fn player_name(&self) -> PlayerName {
        PlayerName::Pinned
    }

    async fn load(&self) -> Result<Vec<Item>> {
        Ok(self.pinned.items().await)
    }

    async fn random_enabled(&self) -> bool {
        self.options.random().await
    }
}

/// Append-only log of previously shown items; strictly sequential
pub struct HistorySource {
    pub history: HistoryStore,
}

#[async_trait]
impl ListSource for HistorySource {
    fn player_name(&self) -> PlayerName {
        PlayerName::History
    }

    async fn load(&self) -> Result<Vec<Item>> {
        Ok(self.history.items().await)
    }

    async fn random_enabled(&self) -> bool {
        false
    }

    fn always_wraps_previous(&self) -> bool {
        true
    }

    /// Browsing history starts from the most recently shown item
    fn initial_index(&self, len: usize) -> usize {
        len.saturating_sub(1)
    }
}
