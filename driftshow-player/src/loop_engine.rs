//! Timed-loop engine driving automatic advancement
//!
//! Owns a monotonic progress value against a target duration, advances on a
//! fixed tick, and invokes a caller-supplied completion callback at 100%.
//!
//! The engine never self-restarts: callers sequence stop-then-start. A
//! strategy drives cycles by spawning [`LoopEngine::start_looping`] on a task
//! and synchronizes teardown through [`LoopEngine::stop_looping`], which
//! awaits the running cycle before resetting progress.
//!
//! Quirk preserved from the observed behavior: when stop or pause is asserted
//! while a tick fires, the engine snaps the value back by one step instead of
//! leaving it, so a paused loop retreats to its last settled position.

use crate::error::Result;
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Completion callback invoked when progress reaches the target duration
pub type LoopEndFn = Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Fixed timing parameters of the loop engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTiming {
    /// Progress step interval
    pub tick: Duration,
    /// Animation settle delay applied at boundary changes and completion
    pub settle: Duration,
}

impl Default for LoopTiming {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(100),
            settle: Duration::from_millis(200),
        }
    }
}

/// Observable progress state
///
/// `value`/`max_value` are `None` until a cycle is armed (unset sentinel);
/// `indeterminate` is true between items while the duration is unknown, so
/// the UI must show a busy indicator instead of a determinate bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopState {
    pub value: Option<u64>,
    pub max_value: Option<u64>,
    pub indeterminate: bool,
}

enum CycleOutcome {
    Completed,
    Halted,
}

/// Timer/progress state machine
///
/// States: Idle, Looping, Paused, Stopped. Looping→Paused retains progress;
/// Looping→Stopped resets it; restart goes through stop-then-start
/// sequencing enforced by callers.
#[derive(Clone)]
pub struct LoopEngine {
    timing: LoopTiming,
    state: Arc<RwLock<LoopState>>,
    stop_flag: Arc<AtomicBool>,
    pause_flag: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
    running_tx: Arc<watch::Sender<bool>>,
    // Held so send() on the watch channel never observes zero receivers
    _running_rx: watch::Receiver<bool>,
    on_loop_end: Arc<RwLock<Option<LoopEndFn>>>,
}

impl LoopEngine {
    pub fn new(timing: LoopTiming) -> Self {
        let (running_tx, running_rx) = watch::channel(false);
        Self {
            timing,
            state: Arc::new(RwLock::new(LoopState::default())),
            stop_flag: Arc::new(AtomicBool::new(false)),
            pause_flag: Arc::new(AtomicBool::new(false)),
            stopped: Arc::new(AtomicBool::new(false)),
            running_tx: Arc::new(running_tx),
            _running_rx: running_rx,
            on_loop_end: Arc::new(RwLock::new(None)),
        }
    }

    /// Register the completion callback for subsequent cycles
    ///
    /// The active strategy re-registers on every start, which keeps the
    /// single-writer discipline over the shared engine.
    pub async fn set_on_loop_end(&self, f: LoopEndFn) {
        *self.on_loop_end.write().await = Some(f);
    }

    /// Snapshot of the observable progress state
    pub async fn state(&self) -> LoopState {
        *self.state.read().await
    }

    /// Target duration for the current item (milliseconds)
    pub async fn set_max_value(&self, max_ms: u64) {
        self.state.write().await.max_value = Some(max_ms);
    }

    /// Busy indicator between items
    pub async fn set_indeterminate(&self, indeterminate: bool) {
        self.state.write().await.indeterminate = indeterminate;
    }

    /// Clear progress back to the unset sentinel (strategy reset)
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.value = None;
        state.max_value = None;
        state.indeterminate = false;
    }

    pub fn is_looping(&self) -> bool {
        *self.running_tx.borrow()
    }

    pub fn is_paused(&self) -> bool {
        self.pause_flag.load(Ordering::Acquire)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Begin a fresh cycle: reset progress to 0 and tick until completion
    ///
    /// Idempotent guard: a still-running cycle is signalled to halt and
    /// awaited first. Runs inline in the calling future; the completion
    /// callback's error propagates to this caller tagged `start_looping`.
    pub async fn start_looping(&self) -> Result<()> {
        if self.is_looping() {
            self.stop_flag.store(true, Ordering::Release);
            self.wait_until_halted().await;
        }
        self.stop_flag.store(false, Ordering::Release);
        self.pause_flag.store(false, Ordering::Release);
        self.stopped.store(false, Ordering::Release);
        self.reset_progress().await;
        self.run_cycle("start_looping").await
    }

    /// Cancel the pending tick, mark stopped, and reset progress to 0
    ///
    /// Must be awaited before starting a new cycle to avoid overlapping
    /// timers.
    pub async fn stop_looping(&self) {
        self.stop_flag.store(true, Ordering::Release);
        self.wait_until_halted().await;
        self.stop_flag.store(false, Ordering::Release);
        self.pause_flag.store(false, Ordering::Release);
        self.stopped.store(true, Ordering::Release);
        self.reset_progress().await;
        debug!("Loop stopped");
    }

    /// Cancel the pending tick without resetting progress
    pub async fn pause_looping(&self) {
        self.pause_flag.store(true, Ordering::Release);
        self.wait_until_halted().await;
        debug!("Loop paused");
    }

    /// Resume ticking from the current progress value
    ///
    /// No-op unless currently paused.
    pub async fn resume_looping(&self) -> Result<()> {
        if !self.is_paused() {
            return Ok(());
        }
        self.pause_flag.store(false, Ordering::Release);
        debug!("Loop resumed");
        self.run_cycle("resume_looping").await
    }

    /// Administrative jump to 0%
    pub async fn go_to_loop_start(&self) {
        let changed = {
            let mut state = self.state.write().await;
            let changed = state.value.unwrap_or(0) != 0;
            state.value = Some(0);
            changed
        };
        if changed {
            sleep(self.timing.settle).await;
        }
    }

    /// Administrative jump to 100%, optionally invoking the completion
    /// callback
    pub async fn go_to_loop_end(&self, invoke_callback: bool) -> Result<()> {
        let Some(max) = self.state.read().await.max_value else {
            warn!("go_to_loop_end called with no target duration");
            return Ok(());
        };
        let changed = {
            let mut state = self.state.write().await;
            let changed = state.value != Some(max);
            state.value = Some(max);
            changed
        };
        if changed {
            sleep(self.timing.settle).await;
        }
        if invoke_callback {
            self.invoke_on_loop_end("go_to_loop_end").await?;
        }
        Ok(())
    }

    async fn reset_progress(&self) {
        let changed = {
            let mut state = self.state.write().await;
            let changed = state.value.unwrap_or(0) != 0;
            state.value = Some(0);
            changed
        };
        if changed {
            sleep(self.timing.settle).await;
        }
    }

    async fn wait_until_halted(&self) {
        let mut rx = self.running_tx.subscribe();
        while *rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }

    async fn invoke_on_loop_end(&self, action: &'static str) -> Result<()> {
        let callback = self.on_loop_end.read().await.clone();
        if let Some(callback) = callback {
            callback().await.map_err(|e| e.in_action(action))?;
        }
        Ok(())
    }

    /// Tick until the target duration is reached or a halt is requested
    async fn run_cycle(&self, action: &'static str) -> Result<()> {
        let tick_ms = self.timing.tick.as_millis() as u64;
        let Some(max) = self.state.read().await.max_value else {
            warn!("Loop cycle requested with no target duration");
            return Ok(());
        };

        self.running_tx.send_replace(true);
        let outcome = loop {
            sleep(self.timing.tick).await;

            let halt_requested =
                self.stop_flag.load(Ordering::Acquire) || self.pause_flag.load(Ordering::Acquire);

            let mut state = self.state.write().await;
            let advanced = state.value.unwrap_or(0) + tick_ms;
            if halt_requested {
                // Snap back one step from the advanced value so the bar
                // settles on its last full step instead of mid-animation.
                state.value = Some(advanced.saturating_sub(tick_ms));
                break CycleOutcome::Halted;
            }
            state.value = Some(advanced.min(max));
            if advanced >= max {
                break CycleOutcome::Completed;
            }
        };
        self.running_tx.send_replace(false);

        match outcome {
            CycleOutcome::Halted => Ok(()),
            CycleOutcome::Completed => {
                debug!("Loop reached target after {} ms", max);
                sleep(self.timing.settle).await;
                self.invoke_on_loop_end(action).await
            }
        }
    }
}

impl Default for LoopEngine {
    fn default() -> Self {
        Self::new(LoopTiming::default())
    }
}
