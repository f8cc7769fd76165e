#![forbid(unsafe_code)]

//! Repeating per-frame work.
//!
//! A [`FrameScheduler`] runs a callback once per display frame until the
//! returned [`FrameTask`] is dropped. The browser adapter drives it from
//! `requestAnimationFrame`; [`ManualFrameScheduler`] advances frames from a
//! test clock.
//!
//! [`FrameRateMonitor`] is the struggle detector that device profiling runs
//! on top of a frame task.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::debug;
use web_time::Instant;

/// Per-frame callback, given the frame timestamp.
pub type FrameCallback = Box<dyn FnMut(Instant)>;

/// Source of display frames.
pub trait FrameScheduler {
    /// Run `callback` every frame; `None` when frames are unavailable.
    fn schedule_repeating(&self, callback: FrameCallback) -> Option<FrameTask>;
}

/// Scheduled repeating callback; cancelled when dropped.
#[must_use = "dropping the task cancels it"]
pub struct FrameTask {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl fmt::Debug for FrameTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameTask")
            .field("scheduled", &self.cancel.is_some())
            .finish()
    }
}

impl FrameTask {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for FrameTask {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

struct ManualState {
    now: Instant,
    next_id: u64,
    /// Callback slot is `None` while it runs.
    tasks: Vec<(u64, Option<FrameCallback>)>,
}

/// Frame scheduler advanced explicitly by the caller.
#[derive(Clone)]
pub struct ManualFrameScheduler {
    state: Rc<RefCell<ManualState>>,
}

impl fmt::Debug for ManualFrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ManualFrameScheduler")
            .field("tasks", &state.tasks.len())
            .finish()
    }
}

impl Default for ManualFrameScheduler {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl ManualFrameScheduler {
    #[must_use]
    pub fn new(start: Instant) -> Self {
        Self {
            state: Rc::new(RefCell::new(ManualState {
                now: start,
                next_id: 0,
                tasks: Vec::new(),
            })),
        }
    }

    #[must_use]
    pub fn now(&self) -> Instant {
        self.state.borrow().now
    }

    #[must_use]
    pub fn task_count(&self) -> usize {
        self.state.borrow().tasks.len()
    }

    /// Move the clock by `dt` and run every task once; returns tasks run.
    ///
    /// Tasks scheduled during the frame first run on the next one.
    pub fn advance_frame(&self, dt: Duration) -> usize {
        let (now, ids) = {
            let mut state = self.state.borrow_mut();
            state.now += dt;
            let ids: Vec<u64> = state.tasks.iter().map(|(id, _)| *id).collect();
            (state.now, ids)
        };
        let mut ran = 0;
        for id in ids {
            let callback = {
                let mut state = self.state.borrow_mut();
                state
                    .tasks
                    .iter_mut()
                    .find(|(task_id, _)| *task_id == id)
                    .and_then(|(_, cb)| cb.take())
            };
            let Some(mut callback) = callback else {
                continue;
            };
            callback(now);
            ran += 1;
            let mut state = self.state.borrow_mut();
            if let Some((_, slot)) = state.tasks.iter_mut().find(|(task_id, _)| *task_id == id) {
                *slot = Some(callback);
            }
        }
        ran
    }

    /// Run `count` frames spaced `dt` apart.
    pub fn run_frames(&self, count: usize, dt: Duration) {
        for _ in 0..count {
            self.advance_frame(dt);
        }
    }
}

fn cancel_manual(state: &Weak<RefCell<ManualState>>, id: u64) {
    if let Some(state) = state.upgrade() {
        state.borrow_mut().tasks.retain(|(task_id, _)| *task_id != id);
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn schedule_repeating(&self, callback: FrameCallback) -> Option<FrameTask> {
        let id = {
            let mut state = self.state.borrow_mut();
            state.next_id += 1;
            let id = state.next_id;
            state.tasks.push((id, Some(callback)));
            id
        };
        let weak = Rc::downgrade(&self.state);
        Some(FrameTask::new(move || cancel_manual(&weak, id)))
    }
}

/// Detects a sustained low frame rate.
///
/// Frames are counted in consecutive windows starting at the first recorded
/// frame. A window that closes with fewer than `min_frames` frames marks the
/// session as struggling; the flag is sticky.
#[derive(Debug, Clone)]
pub struct FrameRateMonitor {
    min_frames: u32,
    window: Duration,
    window_start: Option<Instant>,
    frames: u32,
    struggling: bool,
}

impl FrameRateMonitor {
    #[must_use]
    pub fn new(min_frames: u32, window: Duration) -> Self {
        Self {
            min_frames,
            window,
            window_start: None,
            frames: 0,
            struggling: false,
        }
    }

    /// Record a frame at `now`; returns whether the session is struggling.
    pub fn record_frame(&mut self, now: Instant) -> bool {
        if self.struggling {
            return true;
        }
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            self.frames = 0;
            return false;
        };
        self.frames += 1;
        let elapsed = now.saturating_duration_since(start);
        if elapsed >= self.window {
            if self.frames < self.min_frames {
                debug!(
                    target: "folio.device",
                    frames = self.frames,
                    window_ms = elapsed.as_millis() as u64,
                    "frame rate below floor, marking struggling"
                );
                self.struggling = true;
            }
            self.window_start = Some(now);
            self.frames = 0;
        }
        self.struggling
    }

    #[must_use]
    pub fn is_struggling(&self) -> bool {
        self.struggling
    }

    /// Forget the current window (e.g. after sampling paused).
    pub fn restart_window(&mut self) {
        self.window_start = None;
        self.frames = 0;
    }
}
