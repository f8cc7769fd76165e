//! Device profile tracking across media changes, hardware signals and frame
//! pacing.

#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use folio_core::device::{BackdropMode, DeviceProfile, HardwareSignals, REDUCED_MOTION_QUERY};
use folio_core::ui_mode::{ClassTarget, UiModeContext};
use folio_runtime::config::DeviceConfig;
use folio_runtime::device_profile::DeviceProfileTracker;
use folio_runtime::frames::ManualFrameScheduler;
use folio_runtime::media_query::{ListenerApi, SimulatedMediaHost};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const MOBILE: &str = "(max-width: 640px)";
const FRAME_60: Duration = Duration::from_millis(16);
const FRAME_20: Duration = Duration::from_millis(50);

fn mount_with(
    media: &SimulatedMediaHost,
    frames: &ManualFrameScheduler,
    hardware: HardwareSignals,
) -> DeviceProfileTracker {
    DeviceProfileTracker::mount(
        media,
        Rc::new(frames.clone()),
        &hardware,
        &DeviceConfig::default(),
    )
}

#[test]
fn two_cores_is_low_end_eight_is_not() {
    let media = SimulatedMediaHost::new();
    let frames = ManualFrameScheduler::default();
    let weak = mount_with(
        &media,
        &frames,
        HardwareSignals {
            logical_cores: Some(2),
            ..HardwareSignals::default()
        },
    );
    assert!(weak.profile().is_low_end_hardware);
    assert_eq!(weak.backdrop(), BackdropMode::Reduced);

    let strong = mount_with(
        &media,
        &frames,
        HardwareSignals {
            logical_cores: Some(8),
            device_memory_gb: Some(8.0),
            user_agent: Some("Mozilla/5.0 (X11; Linux x86_64) Firefox/130.0".into()),
        },
    );
    assert!(!strong.profile().is_low_end_hardware);
    assert_eq!(strong.backdrop(), BackdropMode::Full);
}

#[test]
fn absent_signals_are_not_low_end() {
    let media = SimulatedMediaHost::new();
    let frames = ManualFrameScheduler::default();
    let tracker = mount_with(&media, &frames, HardwareSignals::default());
    assert!(!tracker.profile().is_low_end_hardware);
}

#[test]
fn legacy_listener_api_still_tracks_changes() {
    let media = SimulatedMediaHost::with_api(ListenerApi::Legacy);
    let frames = ManualFrameScheduler::default();
    let tracker = mount_with(&media, &frames, HardwareSignals::default());
    media.set_matches(REDUCED_MOTION_QUERY, true);
    assert!(tracker.profile().prefers_reduced_motion);
    drop(tracker);
    assert_eq!(media.listener_count(REDUCED_MOTION_QUERY), 0);
}

#[test]
fn missing_match_media_leaves_defaults() {
    let media = SimulatedMediaHost::unsupported();
    let frames = ManualFrameScheduler::default();
    let tracker = mount_with(&media, &frames, HardwareSignals::default());
    assert_eq!(tracker.profile(), DeviceProfile::default());
    assert!(!tracker.is_sampling());
}

#[test]
fn smooth_mobile_never_struggles_and_sampling_follows_viewport() {
    let media = SimulatedMediaHost::new();
    let frames = ManualFrameScheduler::default();
    let tracker = mount_with(&media, &frames, HardwareSignals::default());
    media.set_matches(MOBILE, true);
    frames.run_frames(180, FRAME_60);
    assert!(!tracker.profile().is_animation_struggling);
    assert_eq!(tracker.backdrop(), BackdropMode::Reduced);

    media.set_matches(MOBILE, false);
    assert!(!tracker.is_sampling());
    frames.run_frames(180, FRAME_20);
    assert!(!tracker.profile().is_animation_struggling);
}

#[test]
fn desktop_frame_drops_are_ignored() {
    let media = SimulatedMediaHost::new();
    let frames = ManualFrameScheduler::default();
    let tracker = mount_with(&media, &frames, HardwareSignals::default());
    frames.run_frames(100, FRAME_20);
    assert!(!tracker.profile().is_animation_struggling);
    assert_eq!(frames.task_count(), 0);
}

#[test]
fn profile_changes_are_published() {
    let media = SimulatedMediaHost::new();
    let frames = ManualFrameScheduler::default();
    let tracker = mount_with(&media, &frames, HardwareSignals::default());
    let modes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&modes);
    let _sub = tracker.subscribe(move |p| sink.borrow_mut().push(p.backdrop()));

    media.set_matches(MOBILE, true);
    frames.run_frames(40, FRAME_20);
    assert_eq!(
        *modes.borrow(),
        vec![BackdropMode::Reduced, BackdropMode::Static]
    );
}

#[test]
fn ui_mode_mirrors_profile() {
    let media = SimulatedMediaHost::new();
    media.set_matches(MOBILE, true);
    media.set_matches(REDUCED_MOTION_QUERY, true);
    let frames = ManualFrameScheduler::default();
    let tracker = mount_with(&media, &frames, HardwareSignals::default());

    let before = UiModeContext::page_default();
    let mut after = before;
    after.apply_profile(&tracker.profile());
    let changes = after.changes_from(&before);
    assert_eq!(changes.len(), 2);
    assert!(changes.iter().all(|c| c.enabled));
    assert!(changes.iter().any(|c| c.target == ClassTarget::Body));
}

fn any_profile() -> impl Strategy<Value = DeviceProfile> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(prefers_reduced_motion, is_mobile_viewport, is_low_end_hardware, is_animation_struggling)| {
            DeviceProfile {
                prefers_reduced_motion,
                is_mobile_viewport,
                is_low_end_hardware,
                is_animation_struggling,
            }
        },
    )
}

proptest! {
    #[test]
    fn reduced_motion_never_selects_full(profile in any_profile()) {
        if profile.prefers_reduced_motion {
            prop_assert_ne!(profile.backdrop(), BackdropMode::Full);
            prop_assert_eq!(profile.backdrop(), BackdropMode::Static);
        }
    }

    #[test]
    fn full_only_when_nothing_is_constrained(profile in any_profile()) {
        let constrained = profile.prefers_reduced_motion
            || profile.is_mobile_viewport
            || profile.is_low_end_hardware
            || profile.is_animation_struggling;
        prop_assert_eq!(profile.backdrop() == BackdropMode::Full, !constrained);
    }
}
