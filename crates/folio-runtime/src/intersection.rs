#![forbid(unsafe_code)]

//! Intersection observation seam.
//!
//! Scroll-spy and reveal-on-view only need "tell me when this element's
//! visible fraction inside a margin-adjusted viewport crosses one of these
//! thresholds". [`IntersectionHost`] is that capability; the browser adapter
//! implements it with `IntersectionObserver`, and [`GeometryObserverHost`]
//! implements it deterministically from element rectangles for native hosts
//! and tests.
//!
//! # Invariants
//!
//! 1. A new observation delivers one initial entry on the next flush,
//!    whatever the element's visibility.
//! 2. Later entries are delivered only when the threshold index or the
//!    intersecting flag changes.
//! 3. Callbacks run with no host state borrowed: a callback may disconnect
//!    its own (or any other) observer, or register new ones.
//! 4. Dropping an [`ObserverHandle`] disconnects synchronously; no entry is
//!    delivered to a disconnected observer afterwards.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Missing element | Id not in the document | `observe` returns `None` |
//! | No platform support | Old browser, native host | `is_supported()` is `false`, `observe` returns `None` |

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use folio_core::geometry::{Rect, RootMargin, ThresholdSet, intersection_ratio};
use tracing::trace;

/// Root margin and thresholds of one observation.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverOptions {
    pub root_margin: RootMargin,
    pub thresholds: ThresholdSet,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            root_margin: RootMargin::ZERO,
            thresholds: ThresholdSet::default(),
        }
    }
}

impl ObserverOptions {
    /// A thin band 60% down the viewport, sampled at 0, 20, 50 and 100%.
    #[must_use]
    pub fn scroll_spy() -> Self {
        Self {
            root_margin: RootMargin::parse("-60% 0px -35% 0px").unwrap_or_default(),
            thresholds: ThresholdSet::new([0.0, 0.2, 0.5, 1.0]),
        }
    }

    /// Single threshold with the bottom of the viewport cut by `bottom_margin`.
    #[must_use]
    pub fn reveal(threshold: f64, bottom_margin: f64) -> Self {
        Self {
            root_margin: RootMargin::bottom_shrink(bottom_margin),
            thresholds: ThresholdSet::single(threshold),
        }
    }
}

/// One visibility report.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry {
    pub target_id: String,
    pub is_intersecting: bool,
    pub intersection_ratio: f64,
}

pub type IntersectionCallback = Box<dyn FnMut(&[IntersectionEntry])>;

/// Platform capability to observe element visibility.
pub trait IntersectionHost {
    /// Whether intersection observation exists at all.
    fn is_supported(&self) -> bool;

    /// Observe `element_id`; `None` if unsupported or the element is missing.
    fn observe(
        &self,
        element_id: &str,
        options: &ObserverOptions,
        callback: IntersectionCallback,
    ) -> Option<ObserverHandle>;
}

/// Live observation; disconnects when dropped.
#[must_use = "dropping the handle disconnects the observer"]
pub struct ObserverHandle {
    disconnect: Option<Box<dyn FnOnce()>>,
}

impl fmt::Debug for ObserverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverHandle")
            .field("connected", &self.disconnect.is_some())
            .finish()
    }
}

impl ObserverHandle {
    pub fn new(disconnect: impl FnOnce() + 'static) -> Self {
        Self {
            disconnect: Some(Box::new(disconnect)),
        }
    }

    /// Disconnect now instead of at drop.
    pub fn disconnect(mut self) {
        self.run_disconnect();
    }

    fn run_disconnect(&mut self) {
        if let Some(disconnect) = self.disconnect.take() {
            disconnect();
        }
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        self.run_disconnect();
    }
}

// ---------------------------------------------------------------------------
// Deterministic host
// ---------------------------------------------------------------------------

struct Observation {
    id: u64,
    element_id: String,
    options: ObserverOptions,
    /// `None` while the callback is running.
    callback: Option<IntersectionCallback>,
    /// `(threshold index, intersecting)` of the last delivered entry.
    last: Option<(usize, bool)>,
}

struct GeometryState {
    supported: bool,
    viewport: Rect,
    elements: HashMap<String, Rect>,
    observations: Vec<Observation>,
    next_id: u64,
}

impl GeometryState {
    fn entry_for(&self, element_id: &str, options: &ObserverOptions) -> (usize, IntersectionEntry) {
        let root = options.root_margin.apply(&self.viewport);
        let (is_intersecting, ratio) = match self.elements.get(element_id) {
            Some(rect) => intersection_ratio(rect, &root),
            None => (false, 0.0),
        };
        let index = if is_intersecting {
            options.thresholds.index_of(ratio)
        } else {
            0
        };
        (
            index,
            IntersectionEntry {
                target_id: element_id.to_string(),
                is_intersecting,
                intersection_ratio: ratio,
            },
        )
    }
}

/// Intersection host computed from element rectangles and a scrolled viewport.
///
/// Element rectangles are in document coordinates; the viewport is the
/// rectangle at the current scroll offset. Entries are computed on
/// [`flush`](Self::flush), which [`scroll_to`](Self::scroll_to) and
/// [`resize`](Self::resize) call for you.
///
/// ```
/// use folio_core::geometry::Rect;
/// use folio_runtime::intersection::{
///     GeometryObserverHost, IntersectionEntry, IntersectionHost, ObserverOptions,
/// };
/// use std::{cell::Cell, rc::Rc};
///
/// let host = GeometryObserverHost::new(800.0, 1000.0);
/// host.insert_element("about", Rect::new(0.0, 1500.0, 800.0, 600.0));
/// let seen = Rc::new(Cell::new(false));
/// let s = Rc::clone(&seen);
/// let _handle = host
///     .observe("about", &ObserverOptions::default(), Box::new(move |entries: &[IntersectionEntry]| {
///         s.set(entries.iter().any(|e| e.is_intersecting));
///     }))
///     .unwrap();
/// host.flush();
/// assert!(!seen.get());
/// host.scroll_to(0.0, 1000.0);
/// assert!(seen.get());
/// ```
#[derive(Clone)]
pub struct GeometryObserverHost {
    state: Rc<RefCell<GeometryState>>,
}

impl fmt::Debug for GeometryObserverHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("GeometryObserverHost")
            .field("supported", &state.supported)
            .field("viewport", &state.viewport)
            .field("elements", &state.elements.len())
            .field("observations", &state.observations.len())
            .finish()
    }
}

impl GeometryObserverHost {
    /// Supported host with a `width` x `height` viewport scrolled to the top.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            state: Rc::new(RefCell::new(GeometryState {
                supported: true,
                viewport: Rect::new(0.0, 0.0, width, height),
                elements: HashMap::new(),
                observations: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Host without intersection observation.
    #[must_use]
    pub fn unsupported(width: f64, height: f64) -> Self {
        let host = Self::new(width, height);
        host.state.borrow_mut().supported = false;
        host
    }

    pub fn insert_element(&self, element_id: impl Into<String>, rect: Rect) {
        self.state
            .borrow_mut()
            .elements
            .insert(element_id.into(), rect);
    }

    /// Remove an element; observers of it see it as not intersecting.
    pub fn remove_element(&self, element_id: &str) {
        self.state.borrow_mut().elements.remove(element_id);
    }

    #[must_use]
    pub fn has_element(&self, element_id: &str) -> bool {
        self.state.borrow().elements.contains_key(element_id)
    }

    /// Move the viewport without delivering entries.
    pub fn set_scroll(&self, x: f64, y: f64) {
        let mut state = self.state.borrow_mut();
        state.viewport.x = x;
        state.viewport.y = y;
    }

    /// Move the viewport and deliver the resulting entries.
    pub fn scroll_to(&self, x: f64, y: f64) -> usize {
        self.set_scroll(x, y);
        self.flush()
    }

    /// Resize the viewport and deliver the resulting entries.
    pub fn resize(&self, width: f64, height: f64) -> usize {
        {
            let mut state = self.state.borrow_mut();
            let viewport = state.viewport;
            state.viewport = Rect::new(viewport.x, viewport.y, width, height);
        }
        self.flush()
    }

    #[must_use]
    pub fn viewport(&self) -> Rect {
        self.state.borrow().viewport
    }

    /// Number of connected observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.state.borrow().observations.len()
    }

    /// Connected observers of `element_id`.
    #[must_use]
    pub fn observers_of(&self, element_id: &str) -> usize {
        self.state
            .borrow()
            .observations
            .iter()
            .filter(|o| o.element_id == element_id)
            .count()
    }

    /// Deliver pending entries in registration order; returns callbacks run.
    pub fn flush(&self) -> usize {
        let ids: Vec<u64> = self.state.borrow().observations.iter().map(|o| o.id).collect();
        let mut delivered = 0;
        for id in ids {
            let pending = {
                let mut state = self.state.borrow_mut();
                let Some(pos) = state.observations.iter().position(|o| o.id == id) else {
                    continue;
                };
                let (index, entry) = {
                    let observation = &state.observations[pos];
                    state.entry_for(&observation.element_id, &observation.options)
                };
                let observation = &mut state.observations[pos];
                let key = (index, entry.is_intersecting);
                if observation.last == Some(key) {
                    None
                } else {
                    observation.last = Some(key);
                    observation.callback.take().map(|cb| (cb, entry))
                }
            };
            let Some((mut callback, entry)) = pending else {
                continue;
            };
            trace!(
                target: "folio.viewport",
                element = %entry.target_id,
                intersecting = entry.is_intersecting,
                ratio = entry.intersection_ratio,
                "intersection entry"
            );
            callback(std::slice::from_ref(&entry));
            delivered += 1;
            let mut state = self.state.borrow_mut();
            if let Some(observation) = state.observations.iter_mut().find(|o| o.id == id) {
                observation.callback = Some(callback);
            }
        }
        delivered
    }
}

fn disconnect(state: &Weak<RefCell<GeometryState>>, id: u64) {
    if let Some(state) = state.upgrade() {
        state.borrow_mut().observations.retain(|o| o.id != id);
    }
}

impl IntersectionHost for GeometryObserverHost {
    fn is_supported(&self) -> bool {
        self.state.borrow().supported
    }

    fn observe(
        &self,
        element_id: &str,
        options: &ObserverOptions,
        callback: IntersectionCallback,
    ) -> Option<ObserverHandle> {
        let mut state = self.state.borrow_mut();
        if !state.supported || !state.elements.contains_key(element_id) {
            return None;
        }
        state.next_id += 1;
        let id = state.next_id;
        state.observations.push(Observation {
            id,
            element_id: element_id.to_string(),
            options: options.clone(),
            callback: Some(callback),
            last: None,
        });
        let weak = Rc::downgrade(&self.state);
        Some(ObserverHandle::new(move || disconnect(&weak, id)))
    }
}
