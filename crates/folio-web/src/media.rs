#![forbid(unsafe_code)]

//! `window.matchMedia` as a [`MediaQueryHost`].
//!
//! Listener API detection is done per list by probing for the methods, so
//! engines that only ship `addListener` (older Safari) still get updates.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use folio_runtime::media_query::{ListenerKey, MediaListener, MediaQueryHost, MediaQueryList};
use js_sys::{Function, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;

type JsListener = Closure<dyn FnMut(JsValue)>;

/// A native `MediaQueryList` plus the closures registered on it.
pub struct BrowserMediaList {
    list: web_sys::MediaQueryList,
    next_key: Cell<u64>,
    closures: RefCell<HashMap<ListenerKey, JsListener>>,
}

impl BrowserMediaList {
    fn has_method(&self, name: &str) -> bool {
        Reflect::get(&self.list, &JsValue::from_str(name))
            .map(|v| v.is_instance_of::<Function>())
            .unwrap_or(false)
    }

    fn wrap(listener: MediaListener) -> JsListener {
        Closure::new(move |event: JsValue| {
            let matches = Reflect::get(&event, &JsValue::from_str("matches"))
                .ok()
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            listener(matches);
        })
    }

    fn store(&self, closure: JsListener) -> ListenerKey {
        let key = ListenerKey(self.next_key.get());
        self.next_key.set(key.0 + 1);
        self.closures.borrow_mut().insert(key, closure);
        key
    }
}

impl MediaQueryList for BrowserMediaList {
    fn matches(&self) -> bool {
        self.list.matches()
    }

    fn supports_change_event(&self) -> bool {
        self.has_method("addEventListener")
    }

    fn supports_legacy_listener(&self) -> bool {
        self.has_method("addListener")
    }

    fn add_change_listener(&self, listener: MediaListener) -> ListenerKey {
        let closure = Self::wrap(listener);
        let _ = self
            .list
            .add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
        self.store(closure)
    }

    fn remove_change_listener(&self, key: ListenerKey) {
        if let Some(closure) = self.closures.borrow_mut().remove(&key) {
            let _ = self
                .list
                .remove_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
        }
    }

    fn add_legacy_listener(&self, listener: MediaListener) -> ListenerKey {
        let closure = Self::wrap(listener);
        let _ = self
            .list
            .add_listener_with_opt_callback(Some(closure.as_ref().unchecked_ref()));
        self.store(closure)
    }

    fn remove_legacy_listener(&self, key: ListenerKey) {
        if let Some(closure) = self.closures.borrow_mut().remove(&key) {
            let _ = self
                .list
                .remove_listener_with_opt_callback(Some(closure.as_ref().unchecked_ref()));
        }
    }
}

/// Browser media-query host.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserMediaHost;

impl MediaQueryHost for BrowserMediaHost {
    fn match_media(&self, query: &str) -> Option<Rc<dyn MediaQueryList>> {
        let list = web_sys::window()?.match_media(query).ok()??;
        Some(Rc::new(BrowserMediaList {
            list,
            next_key: Cell::new(0),
            closures: RefCell::new(HashMap::new()),
        }))
    }
}
