//! Item-fetch API collaborator
//!
//! The playback core consumes the fetch boundary as an opaque trait object.
//! Transport details (HTTP, JSON decoding) live outside this crate; the core
//! only requires the four operations below and that they reject with a
//! structured [`Error`](crate::error::Error) on failure.

use crate::error::Result;
use async_trait::async_trait;
use driftshow_common::{Item, MediaKind, TagsOperator};

/// Opaque item-fetch API
#[async_trait]
pub trait ItemFetcher: Send + Sync {
    /// Server-side random pick from the given folders (empty = whole library)
    async fn fetch_random_item(&self, folders: &[String]) -> Result<Item>;

    /// Bounded list from the tag/type filter
    async fn fetch_items_from_db(
        &self,
        tag_ids: &[i64],
        tags_operator: TagsOperator,
        file_types: &[MediaKind],
    ) -> Result<Vec<Item>>;

    /// Delete an item out-of-band
    async fn delete_item(&self, item: &Item) -> Result<()>;

    /// Persist a new tag list for an item
    async fn set_item_tags(&self, item: &Item) -> Result<()>;
}
