#![forbid(unsafe_code)]

//! Media-query subscriptions across listener API generations.
//!
//! Browsers expose two ways to hear about media-query changes: the `change`
//! event (`addEventListener`) and the older `addListener`/`removeListener`
//! pair. Some embedded engines expose neither. [`subscribe_media_query`]
//! picks the best available API once, at setup, and returns a
//! [`MediaSubscription`] that removes its listener on drop.
//!
//! # Invariants
//!
//! 1. At most one listener is registered per subscription.
//! 2. The listener is removed through the same API it was added with.
//! 3. `initial_matches` reflects the query at subscription time, even when no
//!    listener API exists.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

/// Which listener API a subscription uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerApi {
    /// `addEventListener("change", ..)`.
    ChangeEvent,
    /// `addListener(..)` / `removeListener(..)`.
    Legacy,
    /// Neither exists: the initial value is all there is.
    Unavailable,
}

/// Identifies a registered listener within one list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerKey(pub u64);

/// Receives the new `matches` value.
pub type MediaListener = Rc<dyn Fn(bool)>;

/// One evaluated media query (`MediaQueryList`).
pub trait MediaQueryList {
    fn matches(&self) -> bool;

    fn supports_change_event(&self) -> bool;
    fn supports_legacy_listener(&self) -> bool;

    fn add_change_listener(&self, listener: MediaListener) -> ListenerKey;
    fn remove_change_listener(&self, key: ListenerKey);

    fn add_legacy_listener(&self, listener: MediaListener) -> ListenerKey;
    fn remove_legacy_listener(&self, key: ListenerKey);
}

/// Platform entry point (`window.matchMedia`).
pub trait MediaQueryHost {
    /// `None` when media queries cannot be evaluated at all.
    fn match_media(&self, query: &str) -> Option<Rc<dyn MediaQueryList>>;
}

/// Live media-query subscription; removes its listener when dropped.
#[must_use = "dropping the subscription removes the listener"]
pub struct MediaSubscription {
    query: String,
    list: Option<Rc<dyn MediaQueryList>>,
    key: Option<ListenerKey>,
    api: ListenerApi,
    initial_matches: bool,
}

impl fmt::Debug for MediaSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaSubscription")
            .field("query", &self.query)
            .field("api", &self.api)
            .field("initial_matches", &self.initial_matches)
            .finish()
    }
}

impl MediaSubscription {
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn api(&self) -> ListenerApi {
        self.api
    }

    #[must_use]
    pub fn initial_matches(&self) -> bool {
        self.initial_matches
    }

    /// Current value, `false` when media queries are unsupported.
    #[must_use]
    pub fn matches(&self) -> bool {
        self.list.as_ref().is_some_and(|list| list.matches())
    }
}

impl Drop for MediaSubscription {
    fn drop(&mut self) {
        let (Some(list), Some(key)) = (self.list.as_ref(), self.key.take()) else {
            return;
        };
        match self.api {
            ListenerApi::ChangeEvent => list.remove_change_listener(key),
            ListenerApi::Legacy => list.remove_legacy_listener(key),
            ListenerApi::Unavailable => {}
        }
        trace!(target: "folio.media", query = %self.query, "media listener removed");
    }
}

/// Subscribe `on_change` to `query` with the best listener API available.
pub fn subscribe_media_query(
    host: &dyn MediaQueryHost,
    query: &str,
    on_change: impl Fn(bool) + 'static,
) -> MediaSubscription {
    let Some(list) = host.match_media(query) else {
        debug!(target: "folio.media", query, "matchMedia unavailable");
        return MediaSubscription {
            query: query.to_string(),
            list: None,
            key: None,
            api: ListenerApi::Unavailable,
            initial_matches: false,
        };
    };
    let initial_matches = list.matches();
    let listener: MediaListener = Rc::new(on_change);
    let (api, key) = if list.supports_change_event() {
        (ListenerApi::ChangeEvent, Some(list.add_change_listener(listener)))
    } else if list.supports_legacy_listener() {
        (ListenerApi::Legacy, Some(list.add_legacy_listener(listener)))
    } else {
        (ListenerApi::Unavailable, None)
    };
    debug!(target: "folio.media", query, ?api, initial_matches, "media query subscribed");
    MediaSubscription {
        query: query.to_string(),
        list: Some(list),
        key,
        api,
        initial_matches,
    }
}

// ---------------------------------------------------------------------------
// Simulated host
// ---------------------------------------------------------------------------

/// Media query list driven by [`SimulatedMediaHost::set_matches`].
pub struct SimulatedMediaList {
    api: ListenerApi,
    matches: Cell<bool>,
    next_key: Cell<u64>,
    listeners: RefCell<Vec<(ListenerKey, ListenerApi, MediaListener)>>,
}

impl fmt::Debug for SimulatedMediaList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedMediaList")
            .field("api", &self.api)
            .field("matches", &self.matches.get())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl SimulatedMediaList {
    fn new(api: ListenerApi, matches: bool) -> Self {
        Self {
            api,
            matches: Cell::new(matches),
            next_key: Cell::new(0),
            listeners: RefCell::new(Vec::new()),
        }
    }

    fn add(&self, api: ListenerApi, listener: MediaListener) -> ListenerKey {
        let key = ListenerKey(self.next_key.get());
        self.next_key.set(key.0 + 1);
        self.listeners.borrow_mut().push((key, api, listener));
        key
    }

    fn remove(&self, api: ListenerApi, key: ListenerKey) {
        self.listeners
            .borrow_mut()
            .retain(|(k, a, _)| !(*k == key && *a == api));
    }

    fn set(&self, matches: bool) {
        if self.matches.replace(matches) == matches {
            return;
        }
        let listeners: Vec<MediaListener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, _, l)| Rc::clone(l))
            .collect();
        for listener in listeners {
            listener(matches);
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl MediaQueryList for SimulatedMediaList {
    fn matches(&self) -> bool {
        self.matches.get()
    }

    fn supports_change_event(&self) -> bool {
        self.api == ListenerApi::ChangeEvent
    }

    fn supports_legacy_listener(&self) -> bool {
        self.api == ListenerApi::Legacy
    }

    fn add_change_listener(&self, listener: MediaListener) -> ListenerKey {
        self.add(ListenerApi::ChangeEvent, listener)
    }

    fn remove_change_listener(&self, key: ListenerKey) {
        self.remove(ListenerApi::ChangeEvent, key);
    }

    fn add_legacy_listener(&self, listener: MediaListener) -> ListenerKey {
        self.add(ListenerApi::Legacy, listener)
    }

    fn remove_legacy_listener(&self, key: ListenerKey) {
        self.remove(ListenerApi::Legacy, key);
    }
}

/// In-process media-query host for native hosts and tests.
///
/// Queries are matched by exact string. Unknown queries evaluate to `false`
/// until set.
#[derive(Debug, Clone)]
pub struct SimulatedMediaHost {
    api: ListenerApi,
    supported: bool,
    lists: Rc<RefCell<HashMap<String, Rc<SimulatedMediaList>>>>,
}

impl Default for SimulatedMediaHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedMediaHost {
    /// Host exposing the `change` event.
    #[must_use]
    pub fn new() -> Self {
        Self::with_api(ListenerApi::ChangeEvent)
    }

    /// Host whose lists expose only `api`.
    #[must_use]
    pub fn with_api(api: ListenerApi) -> Self {
        Self {
            api,
            supported: true,
            lists: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Host without `matchMedia`.
    #[must_use]
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    fn list(&self, query: &str) -> Rc<SimulatedMediaList> {
        let mut lists = self.lists.borrow_mut();
        Rc::clone(
            lists
                .entry(query.to_string())
                .or_insert_with(|| Rc::new(SimulatedMediaList::new(self.api, false))),
        )
    }

    /// Change the value of `query`, notifying listeners if it changed.
    pub fn set_matches(&self, query: &str, matches: bool) {
        let list = self.list(query);
        list.set(matches);
    }

    #[must_use]
    pub fn listener_count(&self, query: &str) -> usize {
        self.lists
            .borrow()
            .get(query)
            .map_or(0, |list| list.listener_count())
    }
}

impl MediaQueryHost for SimulatedMediaHost {
    fn match_media(&self, query: &str) -> Option<Rc<dyn MediaQueryList>> {
        if !self.supported {
            return None;
        }
        let list: Rc<dyn MediaQueryList> = self.list(query);
        Some(list)
    }
}
