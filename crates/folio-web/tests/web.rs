//! Browser smoke tests; run with `wasm-pack test --headless --firefox`.

#![cfg(target_arch = "wasm32")]

use std::cell::Cell;
use std::rc::Rc;

use folio_runtime::frames::FrameScheduler;
use folio_runtime::intersection::{IntersectionHost, ObserverOptions};
use folio_runtime::media_query::{MediaQueryHost, MediaQueryList};
use folio_runtime::storage::KeyValueStore;
use folio_web::frames::RafScheduler;
use folio_web::intersection::BrowserIntersectionHost;
use folio_web::media::BrowserMediaHost;
use folio_web::app::FolioApp;
use folio_web::storage::LocalStore;
use js_sys::Function;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn local_store_round_trips() {
    let store = LocalStore;
    store.set("vcache:folio-test:site", "42").unwrap();
    assert_eq!(
        store.get("vcache:folio-test:site").unwrap().as_deref(),
        Some("42")
    );
    assert_eq!(store.get("vcache:folio-test:absent").unwrap(), None);
}

#[wasm_bindgen_test]
fn match_media_reports_a_listener_api() {
    let list = BrowserMediaHost
        .match_media("(min-width: 1px)")
        .expect("matchMedia available");
    assert!(list.supports_change_event() || list.supports_legacy_listener());
}

#[wasm_bindgen_test]
fn missing_element_is_not_observed() {
    let host = BrowserIntersectionHost;
    assert!(host.is_supported());
    let handle = host.observe(
        "folio-test-does-not-exist",
        &ObserverOptions::default(),
        Box::new(|_entries: &[folio_runtime::intersection::IntersectionEntry]| {}),
    );
    assert!(handle.is_none());
}

#[wasm_bindgen_test]
fn frame_task_cancels_on_drop() {
    let runs = Rc::new(Cell::new(0));
    let r = Rc::clone(&runs);
    let task = RafScheduler
        .schedule_repeating(Box::new(move |_now| r.set(r.get() + 1)))
        .expect("requestAnimationFrame available");
    drop(task);
    assert_eq!(runs.get(), 0);
}

#[wasm_bindgen_test]
fn retracking_sections_replaces_the_spy() {
    let mut app = FolioApp::new(None).expect("app mounts");
    let first = Function::new_with_args("id", "globalThis.folioFirstActive = id;");
    let second = Function::new_with_args("id", "globalThis.folioSecondActive = id;");
    assert_eq!(app.track_sections(vec!["folio-test-missing".into()], first).unwrap(), 0);
    assert_eq!(app.track_sections(Vec::new(), second).unwrap(), 0);
    assert_eq!(app.active_section(), None);
    app.dispose();
}
