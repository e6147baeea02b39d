//! Source options for player strategy selection and fetching
//!
//! `SourceOptions` captures the current filter state: selected folders, tag
//! filters, file-type filters, the "from pinned" flag, random mode, and the
//! slideshow interval. The orchestrator evaluates it once per strategy
//! selection; the database strategy reads it once per `start()` fetch.
//!
//! Exposed as `SharedOptions`, a cloneable handle over `Arc<RwLock<_>>` so
//! tests can instantiate isolated instances per case.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Default slideshow interval for images (milliseconds)
pub const DEFAULT_INTERVAL_MS: u64 = 5000;

/// Combinator applied to the selected tag set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TagsOperator {
    And,
    Or,
}

/// File-type filter values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// Current source filter state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceOptions {
    /// Folders the filesystem strategy draws from (empty = whole library)
    pub folders: Vec<String>,
    /// Selected tag identifiers (non-empty activates the database strategy)
    pub tag_ids: Vec<i64>,
    /// AND/OR combinator for the tag set
    pub tags_operator: TagsOperator,
    /// File-type filter (non-empty activates the database strategy)
    pub file_types: Vec<MediaKind>,
    /// Play only pinned items
    pub from_pinned: bool,
    /// Random pick for the indexed database/pinned strategies
    pub random: bool,
    /// Display duration for images (milliseconds)
    pub interval_ms: u64,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            folders: Vec::new(),
            tag_ids: Vec::new(),
            tags_operator: TagsOperator::And,
            file_types: Vec::new(),
            from_pinned: false,
            random: false,
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }
}

impl SourceOptions {
    /// True when a tag or file-type filter is active
    pub fn has_filters(&self) -> bool {
        !self.tag_ids.is_empty() || !self.file_types.is_empty()
    }
}

/// Cloneable shared handle over the source options
#[derive(Debug, Clone)]
pub struct SharedOptions {
    inner: Arc<RwLock<SourceOptions>>,
}

impl SharedOptions {
    pub fn new(options: SourceOptions) -> Self {
        Self {
            inner: Arc::new(RwLock::new(options)),
        }
    }

    /// Full copy of the current options
    pub async fn snapshot(&self) -> SourceOptions {
        self.inner.read().await.clone()
    }

    pub async fn interval_ms(&self) -> u64 {
        self.inner.read().await.interval_ms
    }

    pub async fn random(&self) -> bool {
        self.inner.read().await.random
    }

    pub async fn from_pinned(&self) -> bool {
        self.inner.read().await.from_pinned
    }

    pub async fn folders(&self) -> Vec<String> {
        self.inner.read().await.folders.clone()
    }

    pub async fn set_random(&self, random: bool) {
        self.inner.write().await.random = random;
    }

    pub async fn set_from_pinned(&self, from_pinned: bool) {
        self.inner.write().await.from_pinned = from_pinned;
    }

    pub async fn set_interval_ms(&self, interval_ms: u64) {
        self.inner.write().await.interval_ms = interval_ms;
    }

    pub async fn set_filters(
        &self,
        tag_ids: Vec<i64>,
        tags_operator: TagsOperator,
        file_types: Vec<MediaKind>,
    ) {
        let mut inner = self.inner.write().await;
        inner.tag_ids = tag_ids;
        inner.tags_operator = tags_operator;
        inner.file_types = file_types;
    }

    pub async fn set_folders(&self, folders: Vec<String>) {
        self.inner.write().await.folders = folders;
    }
}

impl Default for SharedOptions {
    fn default() -> Self {
        Self::new(SourceOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_defaults() {
        let options = SharedOptions::default();
        let snapshot = options.snapshot().await;
        assert_eq!(snapshot.interval_ms, DEFAULT_INTERVAL_MS);
        assert!(!snapshot.from_pinned);
        assert!(!snapshot.has_filters());
    }

    #[tokio::test]
    async fn test_filters_activate() {
        let options = SharedOptions::default();
        options
            .set_filters(vec![1, 2], TagsOperator::Or, vec![])
            .await;
        assert!(options.snapshot().await.has_filters());

        options.set_filters(vec![], TagsOperator::And, vec![MediaKind::Video]).await;
        assert!(options.snapshot().await.has_filters());
    }

    #[tokio::test]
    async fn test_shared_handle_observes_writes() {
        let options = SharedOptions::default();
        let clone = options.clone();
        clone.set_random(true).await;
        assert!(options.random().await);
    }
}
