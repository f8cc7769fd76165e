#![forbid(unsafe_code)]

//! Document-level presentation modes.
//!
//! The page toggles a handful of global classes (smooth scrolling, hidden
//! native cursor, reduced motion, mobile layout). Instead of mutating the
//! document from inside each effect, components update a [`UiModeContext`]
//! and a thin host adapter applies the resulting [`ClassChange`]s.
//!
//! # Invariants
//!
//! 1. `changes_from(a)` applied to `a`'s classes yields exactly `self`'s.
//! 2. A class appears at most once per target.

use crate::device::DeviceProfile;

pub const CLASS_SCROLL_SMOOTH: &str = "scroll-smooth";
pub const CLASS_CURSOR_NONE: &str = "cursor-none";
pub const CLASS_REDUCE_MOTION: &str = "reduce-motion";
pub const CLASS_MOBILE: &str = "is-mobile";

/// Element a class is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassTarget {
    /// The document root (`<html>`).
    Root,
    /// The document body.
    Body,
}

/// One class toggle the host must perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassChange {
    pub target: ClassTarget,
    pub class: &'static str,
    pub enabled: bool,
}

/// Explicit, injectable replacement for ambient document mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiModeContext {
    pub smooth_scroll: bool,
    pub native_cursor_hidden: bool,
    pub reduced_motion: bool,
    pub mobile: bool,
}

impl UiModeContext {
    /// Mode of a freshly mounted page: smooth scrolling on, nothing else.
    #[must_use]
    pub fn page_default() -> Self {
        Self {
            smooth_scroll: true,
            ..Self::default()
        }
    }

    /// Mirror the motion and viewport flags of a device profile.
    pub fn apply_profile(&mut self, profile: &DeviceProfile) {
        self.reduced_motion = profile.prefers_reduced_motion;
        self.mobile = profile.is_mobile_viewport;
    }

    /// All classes this mode wants present, in a stable order.
    #[must_use]
    pub fn classes(&self) -> Vec<(ClassTarget, &'static str)> {
        self.entries()
            .into_iter()
            .filter(|(_, _, on)| *on)
            .map(|(target, class, _)| (target, class))
            .collect()
    }

    /// Toggles that turn `previous` into `self`.
    #[must_use]
    pub fn changes_from(&self, previous: &UiModeContext) -> Vec<ClassChange> {
        self.entries()
            .into_iter()
            .zip(previous.entries())
            .filter(|((_, _, now), (_, _, before))| now != before)
            .map(|((target, class, enabled), _)| ClassChange {
                target,
                class,
                enabled,
            })
            .collect()
    }

    fn entries(&self) -> [(ClassTarget, &'static str, bool); 4] {
        [
            (ClassTarget::Root, CLASS_SCROLL_SMOOTH, self.smooth_scroll),
            (ClassTarget::Root, CLASS_CURSOR_NONE, self.native_cursor_hidden),
            (ClassTarget::Root, CLASS_REDUCE_MOTION, self.reduced_motion),
            (ClassTarget::Body, CLASS_MOBILE, self.mobile),
        ]
    }
}
