#![forbid(unsafe_code)]

//! Reactive device profile.
//!
//! [`DeviceProfileTracker`] combines two media queries, the hardware signals
//! read at mount and an on-demand frame-rate sampler into one observable
//! [`DeviceProfile`].
//!
//! # Invariants
//!
//! 1. Hardware classification happens once, at mount.
//! 2. Frames are sampled only while the viewport is mobile and the session
//!    is not yet struggling.
//! 3. Once struggling, the profile stays struggling for the life of the
//!    tracker, even if the viewport leaves mobile.
//! 4. Dropping the tracker removes both media listeners and cancels the
//!    frame task.
//!
//! # Failure Modes
//!
//! | Missing capability | Effect |
//! |--------------------|--------|
//! | `matchMedia` | both flags `false`, never updated |
//! | Listener API | flags keep their initial value |
//! | Frame callbacks | never struggling |

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use folio_core::device::{BackdropMode, DeviceProfile, HardwareSignals, REDUCED_MOTION_QUERY};
use tracing::debug;
use web_time::Instant;

use crate::config::DeviceConfig;
use crate::frames::{FrameRateMonitor, FrameScheduler, FrameTask};
use crate::media_query::{MediaQueryHost, MediaSubscription, subscribe_media_query};
use crate::reactive::{Observable, Subscription};

struct TrackerShared {
    profile: Observable<DeviceProfile>,
    frames: Rc<dyn FrameScheduler>,
    sampler: RefCell<Option<FrameTask>>,
    monitor: RefCell<FrameRateMonitor>,
}

impl TrackerShared {
    /// Start or stop the sampler to match the current profile.
    fn sync_sampling(self: &Rc<Self>) {
        let profile = self.profile.get();
        let wanted = profile.is_mobile_viewport && !profile.is_animation_struggling;
        let running = self.sampler.borrow().is_some();
        if wanted && !running {
            let weak = Rc::downgrade(self);
            let task = self
                .frames
                .schedule_repeating(Box::new(move |now| on_frame(&weak, now)));
            if task.is_some() {
                debug!(target: "folio.device", "frame sampling started");
            }
            *self.sampler.borrow_mut() = task;
        } else if !wanted && running {
            self.stop_sampling();
        }
    }

    fn stop_sampling(&self) {
        let task = self.sampler.borrow_mut().take();
        if task.is_some() {
            debug!(target: "folio.device", "frame sampling stopped");
        }
        drop(task);
        self.monitor.borrow_mut().restart_window();
    }
}

fn on_frame(shared: &Weak<TrackerShared>, now: Instant) {
    let Some(shared) = shared.upgrade() else {
        return;
    };
    let struggling = shared.monitor.borrow_mut().record_frame(now);
    if struggling {
        shared
            .profile
            .update(|p| p.is_animation_struggling = true);
        shared.stop_sampling();
    }
}

/// Live [`DeviceProfile`] for one mounted page.
pub struct DeviceProfileTracker {
    shared: Rc<TrackerShared>,
    _reduced_motion: MediaSubscription,
    _mobile: MediaSubscription,
}

impl fmt::Debug for DeviceProfileTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceProfileTracker")
            .field("profile", &self.profile())
            .field("sampling", &self.is_sampling())
            .finish()
    }
}

impl DeviceProfileTracker {
    /// Subscribe to the media queries, classify hardware and start sampling
    /// if the viewport is already mobile.
    pub fn mount(
        media: &dyn MediaQueryHost,
        frames: Rc<dyn FrameScheduler>,
        hardware: &HardwareSignals,
        config: &DeviceConfig,
    ) -> Self {
        let shared = Rc::new(TrackerShared {
            profile: Observable::new(DeviceProfile {
                is_low_end_hardware: hardware.is_low_end(&config.low_end()),
                ..DeviceProfile::default()
            }),
            frames,
            sampler: RefCell::new(None),
            monitor: RefCell::new(FrameRateMonitor::new(
                config.struggle_min_frames,
                config.struggle_window(),
            )),
        });

        let weak = Rc::downgrade(&shared);
        let reduced_motion = subscribe_media_query(media, REDUCED_MOTION_QUERY, move |matches| {
            if let Some(shared) = weak.upgrade() {
                shared
                    .profile
                    .update(|p| p.prefers_reduced_motion = matches);
            }
        });

        let weak = Rc::downgrade(&shared);
        let mobile = subscribe_media_query(media, &config.mobile_query(), move |matches| {
            if let Some(shared) = weak.upgrade() {
                shared.profile.update(|p| p.is_mobile_viewport = matches);
                shared.sync_sampling();
            }
        });

        shared.profile.update(|p| {
            p.prefers_reduced_motion = reduced_motion.initial_matches();
            p.is_mobile_viewport = mobile.initial_matches();
        });
        shared.sync_sampling();
        debug!(target: "folio.device", profile = ?shared.profile.get(), "device profile mounted");

        Self {
            shared,
            _reduced_motion: reduced_motion,
            _mobile: mobile,
        }
    }

    #[must_use]
    pub fn profile(&self) -> DeviceProfile {
        self.shared.profile.get()
    }

    /// Shared handle to the profile.
    #[must_use]
    pub fn observable(&self) -> Observable<DeviceProfile> {
        self.shared.profile.clone()
    }

    pub fn subscribe(&self, callback: impl Fn(&DeviceProfile) + 'static) -> Subscription {
        self.shared.profile.subscribe(callback)
    }

    #[must_use]
    pub fn backdrop(&self) -> BackdropMode {
        self.profile().backdrop()
    }

    /// Whether a frame task is currently sampling.
    #[must_use]
    pub fn is_sampling(&self) -> bool {
        self.shared.sampler.borrow().is_some()
    }
}

impl Drop for DeviceProfileTracker {
    fn drop(&mut self) {
        self.shared.stop_sampling();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::ManualFrameScheduler;
    use crate::media_query::SimulatedMediaHost;
    use std::time::Duration;

    const MOBILE: &str = "(max-width: 640px)";

    fn mount(media: &SimulatedMediaHost, frames: &ManualFrameScheduler) -> DeviceProfileTracker {
        DeviceProfileTracker::mount(
            media,
            Rc::new(frames.clone()),
            &HardwareSignals::default(),
            &DeviceConfig::default(),
        )
    }

    #[test]
    fn desktop_defaults_to_full_backdrop() {
        let media = SimulatedMediaHost::new();
        let frames = ManualFrameScheduler::default();
        let tracker = mount(&media, &frames);
        assert_eq!(tracker.profile(), DeviceProfile::default());
        assert_eq!(tracker.backdrop(), BackdropMode::Full);
        assert!(!tracker.is_sampling());
    }

    #[test]
    fn media_changes_flow_into_profile() {
        let media = SimulatedMediaHost::new();
        let frames = ManualFrameScheduler::default();
        let tracker = mount(&media, &frames);
        media.set_matches(REDUCED_MOTION_QUERY, true);
        assert!(tracker.profile().prefers_reduced_motion);
        assert_eq!(tracker.backdrop(), BackdropMode::Static);
        media.set_matches(MOBILE, true);
        assert!(tracker.is_sampling());
        media.set_matches(MOBILE, false);
        assert!(!tracker.is_sampling());
        assert_eq!(frames.task_count(), 0);
    }

    #[test]
    fn slow_mobile_becomes_struggling_and_stops_sampling() {
        let media = SimulatedMediaHost::new();
        media.set_matches(MOBILE, true);
        let frames = ManualFrameScheduler::default();
        let tracker = mount(&media, &frames);
        assert!(tracker.is_sampling());
        frames.run_frames(30, Duration::from_millis(50));
        let profile = tracker.profile();
        assert!(profile.is_animation_struggling);
        assert_eq!(tracker.backdrop(), BackdropMode::Static);
        assert!(!tracker.is_sampling());
        assert_eq!(frames.task_count(), 0);

        media.set_matches(MOBILE, false);
        assert!(tracker.profile().is_animation_struggling);
    }

    #[test]
    fn drop_releases_everything() {
        let media = SimulatedMediaHost::new();
        media.set_matches(MOBILE, true);
        let frames = ManualFrameScheduler::default();
        let tracker = mount(&media, &frames);
        assert_eq!(media.listener_count(MOBILE), 1);
        drop(tracker);
        assert_eq!(media.listener_count(MOBILE), 0);
        assert_eq!(media.listener_count(REDUCED_MOTION_QUERY), 0);
        assert_eq!(frames.task_count(), 0);
    }
}
