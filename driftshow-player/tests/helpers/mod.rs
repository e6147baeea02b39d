//! Shared test fixtures: mock fetch backend, mock rendering surface, and a
//! fully wired PlayerContext builder.
//!
//! The mock surface auto-acknowledges staging and transitions after a short
//! virtual-time delay, so tests running under a paused tokio clock stay
//! deterministic without real waiting.

#![allow(dead_code)]

use async_trait::async_trait;
use driftshow_common::{
    EventBus, HistoryStore, Item, MediaKind, PinnedStore, SharedOptions, TagsOperator,
};
use driftshow_player::{
    Error, ItemFetcher, ItemSwitcher, LoopEngine, MediaSurface, PlayerContext, Result, Slot,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::time::Duration;

/// Build an Item from a bare src path, panicking on invalid input
pub fn item(src: &str) -> Item {
    Item::from_src(src).expect("valid test item src")
}

/// Scripted fetch backend
///
/// `fetch_random_item` hands out `random_items` in order, cycling; the call
/// counters let tests assert deduplication and fan-out behavior.
pub struct MockFetcher {
    pub random_items: Mutex<Vec<Item>>,
    pub db_items: Mutex<Vec<Item>>,
    pub random_calls: AtomicUsize,
    pub db_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub fail_random: AtomicBool,
    /// Virtual-time latency applied to every random fetch
    pub random_delay: Duration,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            random_items: Mutex::new(Vec::new()),
            db_items: Mutex::new(Vec::new()),
            random_calls: AtomicUsize::new(0),
            db_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            fail_random: AtomicBool::new(false),
            random_delay: Duration::ZERO,
        }
    }

    pub fn with_random_items(items: Vec<Item>) -> Self {
        let fetcher = Self::new();
        *fetcher.random_items.lock().unwrap() = items;
        fetcher
    }

    pub fn with_db_items(items: Vec<Item>) -> Self {
        let fetcher = Self::new();
        *fetcher.db_items.lock().unwrap() = items;
        fetcher
    }

    pub fn with_random_delay(mut self, delay: Duration) -> Self {
        self.random_delay = delay;
        self
    }
}

#[async_trait]
impl ItemFetcher for MockFetcher {
    async fn fetch_random_item(&self, _folders: &[String]) -> Result<Item> {
        let call = self.random_calls.fetch_add(1, Ordering::SeqCst);
        if self.random_delay > Duration::ZERO {
            tokio::time::sleep(self.random_delay).await;
        }
        if self.fail_random.load(Ordering::SeqCst) {
            return Err(Error::Fetch("scripted failure".into()));
        }
        let items = self.random_items.lock().unwrap();
        if items.is_empty() {
            return Err(Error::Fetch("no scripted items".into()));
        }
        Ok(items[call % items.len()].clone())
    }

    async fn fetch_items_from_db(
        &self,
        _tag_ids: &[i64],
        _tags_operator: TagsOperator,
        _file_types: &[MediaKind],
    ) -> Result<Vec<Item>> {
        self.db_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.db_items.lock().unwrap().clone())
    }

    async fn delete_item(&self, _item: &Item) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn set_item_tags(&self, _item: &Item) -> Result<()> {
        Ok(())
    }
}

/// Rendering surface that acknowledges staging and transitions on its own
///
/// Holds a weak switcher reference (set after the switcher is built) and
/// fires `on_item_loaded` / `on_transition_end` 1 virtual ms after the
/// corresponding request. Set `auto_ack` to false for tests that drive the
/// signals by hand.
pub struct MockSurface {
    switcher: Mutex<Option<Weak<ItemSwitcher>>>,
    pub auto_ack: AtomicBool,
    pub fail_load: AtomicBool,
    pub video_duration_ms: Mutex<Option<u64>>,
    pub staged_srcs: Mutex<Vec<String>>,
    pub play_calls: AtomicUsize,
    pub pause_calls: AtomicUsize,
}

impl MockSurface {
    pub fn new() -> Self {
        Self {
            switcher: Mutex::new(None),
            auto_ack: AtomicBool::new(true),
            fail_load: AtomicBool::new(false),
            video_duration_ms: Mutex::new(None),
            staged_srcs: Mutex::new(Vec::new()),
            play_calls: AtomicUsize::new(0),
            pause_calls: AtomicUsize::new(0),
        }
    }

    pub fn attach(&self, switcher: &Arc<ItemSwitcher>) {
        *self.switcher.lock().unwrap() = Some(Arc::downgrade(switcher));
    }

    fn switcher(&self) -> Option<Arc<ItemSwitcher>> {
        self.switcher.lock().unwrap().as_ref().and_then(Weak::upgrade)
    }
}

impl MediaSurface for MockSurface {
    fn stage(&self, slot: Slot, _item: &Item, src: &str) {
        self.staged_srcs.lock().unwrap().push(src.to_string());
        if !self.auto_ack.load(Ordering::SeqCst) {
            return;
        }
        let fail = self.fail_load.load(Ordering::SeqCst);
        if let Some(switcher) = self.switcher() {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(1)).await;
                if fail {
                    switcher.on_item_error(slot, "scripted load failure").await;
                } else {
                    switcher.on_item_loaded(slot).await;
                }
            });
        }
    }

    fn play(&self, _slot: Slot) {
        self.play_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn pause(&self, _slot: Slot) {
        self.pause_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn duration_ms(&self, _slot: Slot) -> Option<u64> {
        *self.video_duration_ms.lock().unwrap()
    }

    fn begin_transition(&self, slot: Slot) {
        if !self.auto_ack.load(Ordering::SeqCst) {
            return;
        }
        if let Some(switcher) = self.switcher() {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(1)).await;
                switcher.on_transition_end(slot).await;
            });
        }
    }
}

/// Fully wired context around the given mocks
pub struct TestRig {
    pub ctx: PlayerContext,
    pub fetcher: Arc<MockFetcher>,
    pub surface: Arc<MockSurface>,
}

pub fn rig(fetcher: MockFetcher) -> TestRig {
    let fetcher = Arc::new(fetcher);
    let surface = Arc::new(MockSurface::new());
    let switcher = Arc::new(ItemSwitcher::new(surface.clone()));
    surface.attach(&switcher);
    let ctx = PlayerContext {
        fetcher: fetcher.clone(),
        options: SharedOptions::default(),
        pinned: PinnedStore::default(),
        history: HistoryStore::default(),
        events: EventBus::default(),
        switcher,
        loop_engine: LoopEngine::default(),
    };
    TestRig {
        ctx,
        fetcher,
        surface,
    }
}
