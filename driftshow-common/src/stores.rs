//! Pinned-items and history-items stores
//!
//! Ordered item collections mutated from outside the playback core (pin /
//! unpin, history append). The pinned and history strategies read them
//! directly; the core does not own their persistence.
//!
//! Both stores keep an in-memory cache behind `Arc<RwLock<Vec<Item>>>` with
//! cloneable handles, matching the queue-cache pattern used elsewhere in the
//! codebase. Identity is the normalized `src` path: items are value objects
//! without a stable numeric id.

use crate::item::Item;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Ordered collection of pinned items
#[derive(Debug, Clone, Default)]
pub struct PinnedStore {
    items: Arc<RwLock<Vec<Item>>>,
}

impl PinnedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin an item; no-op if an item with the same src is already pinned
    pub async fn add(&self, item: Item) {
        let mut items = self.items.write().await;
        if items.iter().any(|i| i.src == item.src) {
            return;
        }
        debug!("Pinned item {}", item.src);
        items.push(item);
    }

    /// Unpin by src; returns true when something was removed
    pub async fn remove_by_src(&self, src: &str) -> bool {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|i| i.src != src);
        before != items.len()
    }

    pub async fn contains(&self, src: &str) -> bool {
        self.items.read().await.iter().any(|i| i.src == src)
    }

    pub async fn items(&self) -> Vec<Item> {
        self.items.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

/// Append-only log of previously shown items
///
/// Strategies append on every successful show (except the history strategy
/// itself). An immediately repeated src is not appended twice in a row.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    items: Arc<RwLock<Vec<Item>>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a shown item, skipping an immediate repeat
    pub async fn push(&self, item: Item) {
        let mut items = self.items.write().await;
        if items.last().map(|i| i.src == item.src).unwrap_or(false) {
            return;
        }
        debug!("History append {} ({} entries)", item.src, items.len() + 1);
        items.push(item);
    }

    /// Remove every occurrence of the given src (out-of-band deletion)
    pub async fn remove_by_src(&self, src: &str) -> bool {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|i| i.src != src);
        before != items.len()
    }

    pub async fn items(&self) -> Vec<Item> {
        self.items.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(src: &str) -> Item {
        Item::from_src(src).unwrap()
    }

    #[tokio::test]
    async fn test_pinned_deduplicates_by_src() {
        let store = PinnedStore::new();
        store.add(item("/a/one.jpg")).await;
        store.add(item("/a/one.jpg")).await;
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_pinned_remove() {
        let store = PinnedStore::new();
        store.add(item("/a/one.jpg")).await;
        store.add(item("/a/two.jpg")).await;
        assert!(store.remove_by_src("/a/one.jpg").await);
        assert!(!store.remove_by_src("/a/one.jpg").await);
        assert_eq!(store.len().await, 1);
        assert!(store.contains("/a/two.jpg").await);
    }

    #[tokio::test]
    async fn test_history_skips_immediate_repeat() {
        let store = HistoryStore::new();
        store.push(item("/a/one.jpg")).await;
        store.push(item("/a/one.jpg")).await;
        store.push(item("/a/two.jpg")).await;
        store.push(item("/a/one.jpg")).await;
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_history_remove_all_occurrences() {
        let store = HistoryStore::new();
        store.push(item("/a/one.jpg")).await;
        store.push(item("/a/two.jpg")).await;
        store.push(item("/a/one.jpg")).await;
        assert!(store.remove_by_src("/a/one.jpg").await);
        assert_eq!(store.len().await, 1);
    }
}
