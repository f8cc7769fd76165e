#![forbid(unsafe_code)]

//! Reveal-once-on-view for content blocks.
//!
//! A [`Reveal`] flips from hidden to revealed the first time its element is
//! intersecting the viewport (minus a bottom margin) with at least the
//! configured visible fraction, then stops observing for good.
//!
//! # Invariants
//!
//! 1. `has_revealed` is monotonic: once `true` it never returns to `false`.
//! 2. The observer is disconnected as soon as the block is revealed.
//! 3. Arming a revealed block does nothing.
//! 4. A profile that turns mobile reveals a hidden block at once.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Mobile profile | Revealed at once, nothing observed |
//! | No intersection support | Revealed at once (static content) |
//! | Element missing | Stays hidden, nothing observed |

use std::cell::RefCell;
use std::rc::Rc;

use folio_core::device::DeviceProfile;
use tracing::debug;

use crate::config::RevealConfig;
use crate::intersection::{IntersectionEntry, IntersectionHost, ObserverHandle, ObserverOptions};
use crate::reactive::{Observable, Subscription};

/// Base class of every reveal block.
pub const REVEAL_CLASS: &str = "reveal";
/// Class added once the block is revealed.
pub const REVEALED_CLASS: &str = "reveal--in";

/// Ratios within this distance below the threshold still count as reaching it.
const RATIO_EPSILON: f64 = 1e-9;

/// Trigger settings of one reveal block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealOptions {
    /// Visible fraction that triggers the reveal.
    pub threshold: f64,
    /// Fraction of the viewport height excluded at the bottom.
    pub bottom_margin: f64,
}

impl Default for RevealOptions {
    fn default() -> Self {
        RevealConfig::default().into()
    }
}

impl From<RevealConfig> for RevealOptions {
    fn from(config: RevealConfig) -> Self {
        Self {
            threshold: config.threshold,
            bottom_margin: config.bottom_margin,
        }
    }
}

impl RevealOptions {
    #[must_use]
    pub fn observer_options(&self) -> ObserverOptions {
        ObserverOptions::reveal(self.threshold, self.bottom_margin)
    }
}

/// One reveal-on-view block.
#[derive(Debug)]
pub struct Reveal {
    element_id: String,
    options: RevealOptions,
    revealed: Observable<bool>,
    handle: Rc<RefCell<Option<ObserverHandle>>>,
}

impl Reveal {
    #[must_use]
    pub fn new(element_id: impl Into<String>, options: RevealOptions) -> Self {
        Self {
            element_id: element_id.into(),
            options,
            revealed: Observable::new(false),
            handle: Rc::new(RefCell::new(None)),
        }
    }

    /// Start observing, or reveal at once when observation is pointless.
    pub fn arm(&mut self, host: &dyn IntersectionHost, profile: &DeviceProfile) {
        if self.revealed.get() || self.is_observing() {
            return;
        }
        if !profile.animates_reveals() {
            debug!(target: "folio.viewport", element = %self.element_id, "mobile profile, revealed without observing");
            self.revealed.set(true);
            return;
        }
        if !host.is_supported() {
            debug!(target: "folio.viewport", element = %self.element_id, "no intersection support, revealed statically");
            self.revealed.set(true);
            return;
        }

        let revealed = self.revealed.clone();
        let slot = Rc::downgrade(&self.handle);
        let threshold = self.options.threshold;
        let callback = Box::new(move |entries: &[IntersectionEntry]| {
            if revealed.get() {
                return;
            }
            let hit = entries
                .iter()
                .any(|e| e.is_intersecting && e.intersection_ratio + RATIO_EPSILON >= threshold);
            if !hit {
                return;
            }
            revealed.set(true);
            if let Some(slot) = slot.upgrade() {
                let handle = slot.borrow_mut().take();
                drop(handle);
            }
        });

        match host.observe(&self.element_id, &self.options.observer_options(), callback) {
            Some(handle) if !self.revealed.get() => {
                *self.handle.borrow_mut() = Some(handle);
            }
            Some(_) => {}
            None => {
                debug!(target: "folio.viewport", element = %self.element_id, "reveal target missing");
            }
        }
    }

    /// Reveal at once, and stop observing, whenever `profile` turns mobile
    /// while the block is still hidden.
    pub fn follow_profile(&self, profile: &Observable<DeviceProfile>) -> Subscription {
        let revealed = self.revealed.clone();
        let slot = Rc::downgrade(&self.handle);
        let element_id = self.element_id.clone();
        profile.subscribe(move |profile| {
            if profile.animates_reveals() || revealed.get() {
                return;
            }
            if let Some(slot) = slot.upgrade() {
                let handle = slot.borrow_mut().take();
                drop(handle);
            }
            debug!(target: "folio.viewport", element = %element_id, "viewport turned mobile, revealed");
            revealed.set(true);
        })
    }

    /// Stop observing without revealing.
    pub fn disarm(&mut self) {
        let handle = self.handle.borrow_mut().take();
        drop(handle);
    }

    #[must_use]
    pub fn has_revealed(&self) -> bool {
        self.revealed.get()
    }

    /// Shared handle to the revealed flag.
    #[must_use]
    pub fn revealed(&self) -> Observable<bool> {
        self.revealed.clone()
    }

    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.handle.borrow().is_some()
    }

    #[must_use]
    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    /// `"reveal"` or `"reveal reveal--in"`.
    #[must_use]
    pub fn css_class(&self) -> String {
        if self.has_revealed() {
            format!("{REVEAL_CLASS} {REVEALED_CLASS}")
        } else {
            REVEAL_CLASS.to_string()
        }
    }
}
