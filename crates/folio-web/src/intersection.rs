#![forbid(unsafe_code)]

//! `IntersectionObserver` as an [`IntersectionHost`].
//!
//! One native observer is created per observation, mirroring how the page
//! observes each element independently. The JS closure lives inside the
//! returned handle; dropping the handle disconnects the observer and then
//! frees the closure.

use folio_runtime::intersection::{
    IntersectionCallback, IntersectionEntry, IntersectionHost, ObserverHandle, ObserverOptions,
};
use js_sys::{Array, Reflect};
use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use web_sys::{IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

use crate::js_error_message;

/// Browser intersection host.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserIntersectionHost;

fn to_entry(value: JsValue, fallback_id: &str) -> Option<IntersectionEntry> {
    let entry: IntersectionObserverEntry = value.dyn_into().ok()?;
    let id = entry.target().id();
    Some(IntersectionEntry {
        target_id: if id.is_empty() { fallback_id.to_string() } else { id },
        is_intersecting: entry.is_intersecting(),
        intersection_ratio: entry.intersection_ratio(),
    })
}

impl IntersectionHost for BrowserIntersectionHost {
    fn is_supported(&self) -> bool {
        web_sys::window().is_some_and(|w| {
            Reflect::has(&w, &JsValue::from_str("IntersectionObserver")).unwrap_or(false)
        })
    }

    fn observe(
        &self,
        element_id: &str,
        options: &ObserverOptions,
        mut callback: IntersectionCallback,
    ) -> Option<ObserverHandle> {
        if !self.is_supported() {
            return None;
        }
        let element = web_sys::window()?
            .document()?
            .get_element_by_id(element_id)?;

        let init = IntersectionObserverInit::new();
        init.set_root_margin(&options.root_margin.to_string());
        let thresholds: Array = options
            .thresholds
            .values()
            .iter()
            .map(|t| JsValue::from_f64(*t))
            .collect();
        init.set_threshold(&thresholds);

        let fallback_id = element_id.to_string();
        let closure = Closure::<dyn FnMut(Array, IntersectionObserver)>::new(
            move |entries: Array, _observer: IntersectionObserver| {
                let entries: Vec<IntersectionEntry> = entries
                    .iter()
                    .filter_map(|e| to_entry(e, &fallback_id))
                    .collect();
                callback(&entries);
            },
        );

        let observer =
            match IntersectionObserver::new_with_options(closure.as_ref().unchecked_ref(), &init) {
                Ok(observer) => observer,
                Err(err) => {
                    debug!(target: "folio.viewport", element = element_id, error = %js_error_message(&err), "IntersectionObserver rejected options");
                    return None;
                }
            };
        observer.observe(&element);

        Some(ObserverHandle::new(move || {
            observer.disconnect();
            drop(closure);
        }))
    }
}
