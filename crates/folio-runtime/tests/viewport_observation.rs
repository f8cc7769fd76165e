//! Scroll-spy and reveal-on-view driven through the geometry host.

#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::rc::Rc;

use folio_core::device::{DeviceProfile, HardwareSignals};
use folio_core::geometry::Rect;
use folio_runtime::config::FolioConfig;
use folio_runtime::device_profile::DeviceProfileTracker;
use folio_runtime::frames::ManualFrameScheduler;
use folio_runtime::intersection::GeometryObserverHost;
use folio_runtime::media_query::SimulatedMediaHost;
use folio_runtime::reveal::{Reveal, RevealOptions};
use folio_runtime::scroll_spy::ScrollSpy;
use pretty_assertions::assert_eq;

const VIEWPORT_W: f64 = 1280.0;
const VIEWPORT_H: f64 = 800.0;
const SECTION_H: f64 = 900.0;

/// Page with stacked sections; `skip` lists ids that are not rendered.
fn page(ids: &[&str], skip: &[&str]) -> GeometryObserverHost {
    let host = GeometryObserverHost::new(VIEWPORT_W, VIEWPORT_H);
    for (i, id) in ids.iter().enumerate() {
        if !skip.contains(id) {
            host.insert_element(*id, Rect::new(0.0, i as f64 * SECTION_H, VIEWPORT_W, SECTION_H));
        }
    }
    host
}

/// Scroll offset that puts the spy band inside section `index`.
fn scroll_into(index: usize) -> f64 {
    // The band starts 60% down the viewport.
    index as f64 * SECTION_H + 100.0 - 0.6 * VIEWPORT_H
}

// =============================================================================
// Scroll-spy
// =============================================================================

#[test]
fn spy_skips_missing_middle_section() {
    let ids = ["home", "about", "contact"];
    let host = page(&ids, &["about"]);
    let mut spy = ScrollSpy::new(ids);
    assert_eq!(spy.attach(&host), 2);
    assert_eq!(spy.tracked(), ["home".to_string(), "contact".to_string()]);
    host.flush();
    assert_eq!(spy.active().as_deref(), Some("home"));

    // Scrolling through the missing section keeps the last active id.
    host.scroll_to(0.0, scroll_into(1));
    assert_eq!(spy.active().as_deref(), Some("home"));

    host.scroll_to(0.0, scroll_into(2));
    assert_eq!(spy.active().as_deref(), Some("contact"));

    host.scroll_to(0.0, scroll_into(0).max(0.0));
    assert_eq!(spy.active().as_deref(), Some("home"));
}

#[test]
fn spy_publishes_changes() {
    let ids = ["home", "skills", "projects"];
    let host = page(&ids, &[]);
    let mut spy = ScrollSpy::new(ids);
    spy.attach(&host);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _sub = spy
        .active_observable()
        .subscribe(move |id| sink.borrow_mut().push(id.clone()));
    host.flush();
    host.scroll_to(0.0, scroll_into(1));
    host.scroll_to(0.0, scroll_into(2));
    assert_eq!(
        *seen.borrow(),
        vec![Some("skills".to_string()), Some("projects".to_string())]
    );
}

#[test]
fn spy_uses_configured_band() {
    let options = FolioConfig::default()
        .scroll_spy
        .observer_options()
        .expect("default config is valid");
    let ids = ["a", "b"];
    let host = page(&ids, &[]);
    let mut spy = ScrollSpy::with_options(ids, options);
    spy.attach(&host);
    host.flush();
    host.scroll_to(0.0, scroll_into(1));
    assert!(spy.is_active("b"));
}

#[test]
fn spy_detach_on_drop() {
    let ids = ["a", "b"];
    let host = page(&ids, &[]);
    {
        let mut spy = ScrollSpy::new(ids);
        spy.attach(&host);
        assert_eq!(host.observer_count(), 2);
    }
    assert_eq!(host.observer_count(), 0);
}

// =============================================================================
// Reveal
// =============================================================================

#[test]
fn reveal_flips_exactly_once_under_repeated_enter_exit() {
    let host = GeometryObserverHost::new(VIEWPORT_W, VIEWPORT_H);
    host.insert_element("card", Rect::new(0.0, 2_000.0, VIEWPORT_W, 400.0));
    let mut reveal = Reveal::new("card", RevealOptions::default());
    let flips = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&flips);
    let _sub = reveal
        .revealed()
        .subscribe(move |v| sink.borrow_mut().push(*v));

    reveal.arm(&host, &DeviceProfile::default());
    host.flush();
    for _ in 0..5 {
        host.scroll_to(0.0, 1_800.0);
        host.scroll_to(0.0, 0.0);
        reveal.arm(&host, &DeviceProfile::default());
    }

    assert!(reveal.has_revealed());
    assert_eq!(*flips.borrow(), vec![true]);
    assert_eq!(host.observer_count(), 0);
}

#[test]
fn reveal_waits_for_threshold() {
    let host = GeometryObserverHost::new(VIEWPORT_W, VIEWPORT_H);
    host.insert_element("card", Rect::new(0.0, 1_000.0, VIEWPORT_W, 1_000.0));
    let mut reveal = Reveal::new(
        "card",
        RevealOptions {
            threshold: 0.5,
            bottom_margin: 0.1,
        },
    );
    reveal.arm(&host, &DeviceProfile::default());
    host.flush();
    // Trigger region bottom is scroll + 720; 300px of 1000 visible.
    host.scroll_to(0.0, 580.0);
    assert!(!reveal.has_revealed());
    // 600px of 1000 visible.
    host.scroll_to(0.0, 880.0);
    assert!(reveal.has_revealed());
}

#[test]
fn reveal_disarm_stops_observing() {
    let host = GeometryObserverHost::new(VIEWPORT_W, VIEWPORT_H);
    host.insert_element("card", Rect::new(0.0, 2_000.0, VIEWPORT_W, 400.0));
    let mut reveal = Reveal::new("card", RevealOptions::default());
    reveal.arm(&host, &DeviceProfile::default());
    reveal.disarm();
    host.scroll_to(0.0, 1_800.0);
    assert!(!reveal.has_revealed());
    assert_eq!(host.observer_count(), 0);
}

#[test]
fn reveal_follows_viewport_turning_mobile() {
    let media = SimulatedMediaHost::new();
    let config = FolioConfig::default();
    let tracker = DeviceProfileTracker::mount(
        &media,
        Rc::new(ManualFrameScheduler::default()),
        &HardwareSignals::default(),
        &config.device,
    );
    let host = GeometryObserverHost::new(VIEWPORT_W, VIEWPORT_H);
    host.insert_element("card", Rect::new(0.0, 2_000.0, VIEWPORT_W, 400.0));
    let mut reveal = Reveal::new("card", RevealOptions::from(config.reveal));
    let _follow = reveal.follow_profile(&tracker.observable());
    reveal.arm(&host, &tracker.profile());
    host.flush();
    assert!(!reveal.has_revealed());
    assert_eq!(host.observer_count(), 1);

    media.set_matches(&config.device.mobile_query(), true);
    assert!(tracker.profile().is_mobile_viewport);
    assert!(reveal.has_revealed());
    assert_eq!(host.observer_count(), 0);

    // Back to desktop: revealed stays revealed.
    media.set_matches(&config.device.mobile_query(), false);
    assert!(reveal.has_revealed());
    assert_eq!(reveal.css_class(), "reveal reveal--in");
}
