//! Displayable item model
//!
//! An `Item` is one playable media unit (image or video). Items are immutable
//! value objects: they are constructed from the raw JSON shape the fetch API
//! returns, validated once, and never mutated in place. Tag updates go through
//! the fetch API and produce a new value on the next round-trip.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File extensions recognized as images
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "avif", "svg",
];

/// File extensions recognized as videos
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "ogv", "mov", "m4v"];

/// Errors raised while constructing an `Item`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    /// Source path was empty
    #[error("item src is empty")]
    EmptySrc,

    /// Extension belongs to neither the image nor the video set
    #[error("unknown media extension '{extension}' for '{src}'")]
    UnknownExtension { src: String, extension: String },
}

/// Pixel dimensions reported by the fetch boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Raw JSON shape produced by the item-fetch API
///
/// Only `src` is required; everything else defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawItem {
    pub src: String,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
    #[serde(default)]
    pub use_cache: bool,
    #[serde(default)]
    pub warning: Option<String>,
}

/// Media kind derived from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Image,
    Video,
}

/// One playable media unit
///
/// Invariants enforced at construction:
/// - `src` is non-empty
/// - `extension` matches exactly one of the two known extension sets
/// - exactly one of `is_image()` / `is_video()` is true
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Normalized slash-separated source path, never empty
    pub src: String,
    /// Display name (final path segment)
    pub name: String,
    /// Lowercase file extension
    pub extension: String,
    /// Parent path, leading slash stripped, no trailing slash
    pub path: String,
    /// Pixel dimensions when known
    pub dimensions: Option<Dimensions>,
    /// Tag identifiers attached to this item
    pub tag_ids: Vec<i64>,
    /// Hint that the rendering layer may serve this item from cache
    pub use_cache: bool,
    /// Optional warning produced by the fetch boundary
    pub warning: Option<String>,
    kind: ItemKind,
}

impl Item {
    /// Build a validated `Item` from the fetch boundary's raw shape
    pub fn new(raw: RawItem) -> Result<Self, ItemError> {
        if raw.src.is_empty() {
            return Err(ItemError::EmptySrc);
        }

        let trimmed = raw.src.trim_start_matches('/');
        let (path, name) = match trimmed.rfind('/') {
            Some(pos) => (trimmed[..pos].to_string(), trimmed[pos + 1..].to_string()),
            None => (String::new(), trimmed.to_string()),
        };

        let extension = name
            .rfind('.')
            .map(|pos| name[pos + 1..].to_ascii_lowercase())
            .unwrap_or_default();

        let kind = if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            ItemKind::Image
        } else if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
            ItemKind::Video
        } else {
            return Err(ItemError::UnknownExtension {
                src: raw.src,
                extension,
            });
        };

        Ok(Self {
            src: raw.src,
            name,
            extension,
            path,
            dimensions: raw.dimensions,
            tag_ids: raw.tag_ids,
            use_cache: raw.use_cache,
            warning: raw.warning,
            kind,
        })
    }

    /// Convenience constructor from a bare source path
    pub fn from_src(src: impl Into<String>) -> Result<Self, ItemError> {
        Self::new(RawItem {
            src: src.into(),
            ..RawItem::default()
        })
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn is_image(&self) -> bool {
        self.kind == ItemKind::Image
    }

    pub fn is_video(&self) -> bool {
        self.kind == ItemKind::Video
    }
}
