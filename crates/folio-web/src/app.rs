#![forbid(unsafe_code)]

//! JavaScript entry points.
//!
//! [`FolioApp`] owns every mounted behavior of one page. JS callbacks passed
//! in are invoked synchronously whenever the matching state changes; all
//! platform resources are released by `dispose()` or when the app is freed.

use std::cell::RefCell;
use std::rc::Rc;

use folio_core::counter_key::CounterKey;
use folio_core::ui_mode::UiModeContext;
use folio_runtime::config::{ContactConfig, FolioConfig};
use folio_runtime::contact::ContactForm;
use folio_runtime::device_profile::DeviceProfileTracker;
use folio_runtime::locale::LocaleContext;
use folio_runtime::pointer_fx::{CursorFx, HoverTarget};
use folio_runtime::reactive::Subscription;
use folio_runtime::reveal::{REVEAL_CLASS, REVEALED_CLASS, Reveal, RevealOptions};
use folio_runtime::scroll_spy::ScrollSpy;
use folio_runtime::view_counter::{CountDisplay, MountedCounter, ViewCounter};
use js_sys::Function;
use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use web_time::Instant;

use crate::dom::{apply_class_changes, apply_mode};
use crate::frames::RafScheduler;
use crate::hardware::read_navigator;
use crate::intersection::BrowserIntersectionHost;
use crate::logging;
use crate::media::BrowserMediaHost;
use crate::storage::LocalStore;
use crate::transport::{FetchHitTransport, post_contact};

fn call1(callback: &Function, arg: &JsValue) {
    if let Err(err) = callback.call1(&JsValue::NULL, arg) {
        warn!(target: "folio.web", error = %crate::js_error_message(&err), "page callback threw");
    }
}

fn emit_label(callback: &Function, display: CountDisplay, locale: &str) {
    call1(callback, &JsValue::from_str(&display.label(locale)));
}

/// Install console logging. `filter` uses `EnvFilter` syntax.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(filter: Option<String>) -> bool {
    logging::init(filter.as_deref().unwrap_or(logging::DEFAULT_FILTER))
}

/// Behaviors mounted on one page.
#[wasm_bindgen]
pub struct FolioApp {
    config: FolioConfig,
    store: Rc<LocalStore>,
    locale: LocaleContext,
    device: Option<DeviceProfileTracker>,
    ui: Rc<RefCell<UiModeContext>>,
    cursor: CursorFx,
    counters: Vec<CounterView>,
    spy: Option<(ScrollSpy, Subscription)>,
    reveals: Vec<RevealView>,
    _profile_sub: Option<Subscription>,
}

/// A mounted counter with the subscriptions rendering its label.
struct CounterView {
    _display: Subscription,
    _locale: Subscription,
    _counter: MountedCounter,
}

/// A reveal block with its class and mobile-profile subscriptions.
struct RevealView {
    _revealed: Subscription,
    _profile: Option<Subscription>,
    _reveal: Reveal,
}

#[wasm_bindgen]
impl FolioApp {
    /// Mount device profiling and page classes. `config_json` overrides
    /// the defaults field by field.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<FolioApp, JsValue> {
        let config = match config_json.as_deref() {
            Some(raw) if !raw.trim().is_empty() => {
                FolioConfig::from_json_str(raw).map_err(|e| JsValue::from_str(&e.to_string()))?
            }
            _ => FolioConfig::default(),
        };

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let locale = window
            .navigator()
            .language()
            .map_or_else(LocaleContext::system, LocaleContext::new);

        let device = DeviceProfileTracker::mount(
            &BrowserMediaHost,
            Rc::new(RafScheduler),
            &read_navigator(),
            &config.device,
        );
        let cursor = CursorFx::from_media(&BrowserMediaHost, width, height);

        let mut mode = UiModeContext::page_default();
        mode.apply_profile(&device.profile());
        cursor.apply_to(&mut mode);
        apply_mode(&mode);
        let ui = Rc::new(RefCell::new(mode));

        let ui_for_profile = Rc::clone(&ui);
        let profile_sub = device.subscribe(move |profile| {
            let mut mode = ui_for_profile.borrow_mut();
            let previous = *mode;
            mode.apply_profile(profile);
            apply_class_changes(&mode.changes_from(&previous));
        });

        info!(target: "folio.web", backdrop = device.backdrop().as_str(), "folio mounted");
        Ok(FolioApp {
            config,
            store: Rc::new(LocalStore),
            locale,
            device: Some(device),
            ui,
            cursor,
            counters: Vec::new(),
            spy: None,
            reveals: Vec::new(),
            _profile_sub: Some(profile_sub),
        })
    }

    /// Count one view of `label` (the site when omitted). `on_label` gets
    /// the rendered label now and whenever the count or locale changes.
    #[wasm_bindgen(js_name = mountViewCounter)]
    pub fn mount_view_counter(&mut self, label: Option<String>, on_label: Function) {
        let namespace = self.config.counter.namespace.clone();
        let key = match label.as_deref() {
            Some(title) => CounterKey::project(namespace, title),
            None => CounterKey::site(namespace),
        };
        let counter = ViewCounter::new(key, self.store.clone(), &self.config.counter);
        let mounted = MountedCounter::mount(counter, &FetchHitTransport, Instant::now());

        emit_label(&on_label, mounted.current(), &self.locale.current_locale());
        let locale = self.locale.clone();
        let callback = on_label.clone();
        let display_sub = mounted.display().subscribe(move |display| {
            emit_label(&callback, *display, &locale.current_locale());
        });
        let display = mounted.display();
        let locale_sub = self
            .locale
            .subscribe(move |locale| emit_label(&on_label, display.get(), locale));
        self.counters.push(CounterView {
            _display: display_sub,
            _locale: locale_sub,
            _counter: mounted,
        });
    }

    /// Switch the locale used for count labels; mounted labels re-render.
    #[wasm_bindgen(js_name = setLocale)]
    pub fn set_locale(&self, locale: String) {
        self.locale.set_locale(locale);
    }

    /// Track `ids` and report the active section id to `on_active`,
    /// replacing any previous tracking. Returns how many sections were
    /// found in the document.
    #[wasm_bindgen(js_name = trackSections)]
    pub fn track_sections(&mut self, ids: Vec<String>, on_active: Function) -> Result<usize, JsValue> {
        let options = self
            .config
            .scroll_spy
            .observer_options()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let mut spy = ScrollSpy::with_options(ids, options);
        let tracked = spy.attach(&BrowserIntersectionHost);

        let active = spy.active_observable();
        let emit = move |id: &Option<String>| {
            let arg = id.as_deref().map_or(JsValue::NULL, JsValue::from_str);
            call1(&on_active, &arg);
        };
        emit(&active.get());
        let sub = active.subscribe(emit);
        self.spy = Some((spy, sub));
        Ok(tracked)
    }

    /// Id of the section currently highlighted, if any.
    #[wasm_bindgen(js_name = activeSection)]
    pub fn active_section(&self) -> Option<String> {
        self.spy.as_ref().and_then(|(spy, _)| spy.active())
    }

    /// Reveal `element_id` once it scrolls into view, or at once on a
    /// mobile viewport. `on_reveal` receives the element's new class list.
    pub fn reveal(&mut self, element_id: String, threshold: Option<f64>, on_reveal: Function) {
        let mut options = RevealOptions::from(self.config.reveal);
        if let Some(threshold) = threshold.filter(|t| (0.0..=1.0).contains(t)) {
            options.threshold = threshold;
        }
        let mut reveal = Reveal::new(element_id, options);
        let sub = reveal.revealed().subscribe(move |revealed| {
            if *revealed {
                call1(
                    &on_reveal,
                    &JsValue::from_str(&format!("{REVEAL_CLASS} {REVEALED_CLASS}")),
                );
            }
        });
        let profile_sub = self
            .device
            .as_ref()
            .map(|device| reveal.follow_profile(&device.observable()));
        let profile = self.device.as_ref().map(DeviceProfileTracker::profile).unwrap_or_default();
        reveal.arm(&BrowserIntersectionHost, &profile);
        self.reveals.push(RevealView {
            _revealed: sub,
            _profile: profile_sub,
            _reveal: reveal,
        });
    }

    /// Current backdrop mode: `"full"`, `"reduced"` or `"static"`.
    pub fn backdrop(&self) -> String {
        self.device
            .as_ref()
            .map(|d| d.backdrop().as_str().to_string())
            .unwrap_or_default()
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.cursor.pointer_move(x, y);
    }

    /// `kind` is `"interactive"`, `"magnetic"` or anything else for plain.
    #[wasm_bindgen(js_name = pointerOver)]
    pub fn pointer_over(&mut self, kind: &str) {
        let target = match kind {
            "interactive" => HoverTarget::Interactive,
            "magnetic" => HoverTarget::Magnetic,
            _ => HoverTarget::Plain,
        };
        self.cursor.pointer_over(target);
    }

    #[wasm_bindgen(js_name = pointerOut)]
    pub fn pointer_out(&mut self) {
        self.cursor.pointer_out();
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self) {
        self.cursor.pointer_down();
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self) {
        self.cursor.pointer_up();
    }

    /// Advance the cursor one frame and return its CSS transform, or
    /// `undefined` when the custom cursor is disabled.
    #[wasm_bindgen(js_name = cursorFrame)]
    pub fn cursor_frame(&mut self) -> Option<String> {
        if !self.cursor.is_enabled() {
            return None;
        }
        self.cursor.tick();
        Some(self.cursor.transform())
    }

    /// Release every observer, listener, frame task and pending request.
    pub fn dispose(&mut self) {
        self._profile_sub = None;
        self.counters.clear();
        self.spy = None;
        self.reveals.clear();
        self.device = None;
        let mut mode = self.ui.borrow_mut();
        let previous = *mode;
        *mode = UiModeContext::default();
        apply_class_changes(&mode.changes_from(&previous));
    }
}

/// Send one contact message. Resolves with `"sent"`, rejects with the
/// message to show under the form.
#[wasm_bindgen(js_name = sendContact)]
pub async fn send_contact(endpoint: Option<String>, email: String, message: String) -> Result<JsValue, JsValue> {
    let config = endpoint.map_or_else(ContactConfig::default, |endpoint| ContactConfig { endpoint });
    let mut form = ContactForm::new(&config);
    form.email = email;
    form.message = message;
    let request = form
        .submit()
        .map_err(|rejection| JsValue::from_str(&rejection.to_string()))?;
    form.resolve(post_contact(&request).await);
    match form.failure_message() {
        Some(message) => Err(JsValue::from_str(message)),
        None => Ok(JsValue::from_str("sent")),
    }
}
