#![forbid(unsafe_code)]

//! Custom cursor and magnetic hover offsets.
//!
//! [`CursorFx`] follows the pointer with a per-frame linear interpolation
//! and picks a scale from the element under the pointer. It is only enabled
//! on fine-pointer devices without a reduced-motion preference; when enabled
//! it asks for the native cursor to be hidden through [`UiModeContext`].
//!
//! [`magnetic_offset`] is the translation applied to "magnetic" elements so
//! they lean toward the pointer.

use folio_core::device::{COARSE_POINTER_QUERY, REDUCED_MOTION_QUERY};
use folio_core::geometry::Rect;
use folio_core::ui_mode::UiModeContext;
use tracing::debug;

use crate::media_query::MediaQueryHost;

/// Fraction of the remaining distance covered each frame.
pub const FOLLOW_FACTOR: f64 = 0.18;
pub const MAGNETIC_STRENGTH: f64 = 0.25;
pub const MAGNETIC_MAX_TRANSLATE_PX: f64 = 18.0;

/// Cursor appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CursorVariant {
    #[default]
    Default,
    Hover,
    Down,
    Magnetic,
}

impl CursorVariant {
    #[must_use]
    pub const fn scale(self) -> f64 {
        match self {
            Self::Default => 1.0,
            Self::Hover => 1.5,
            Self::Down => 0.95,
            Self::Magnetic => 2.0,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Hover => "hover",
            Self::Down => "down",
            Self::Magnetic => "magnetic",
        }
    }
}

/// What the pointer is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HoverTarget {
    /// Nothing interactive.
    Plain,
    /// Links, buttons and elements marked as cursor targets.
    Interactive,
    /// Elements marked magnetic.
    Magnetic,
}

/// Follow-the-pointer cursor state.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorFx {
    enabled: bool,
    position: (f64, f64),
    target: (f64, f64),
    variant: CursorVariant,
}

impl CursorFx {
    /// Cursor centered in a `width` x `height` viewport.
    #[must_use]
    pub fn new(enabled: bool, width: f64, height: f64) -> Self {
        let center = (width / 2.0, height / 2.0);
        Self {
            enabled,
            position: center,
            target: center,
            variant: CursorVariant::Default,
        }
    }

    /// Enabled unless the device has a coarse pointer, no hover, or prefers
    /// reduced motion.
    #[must_use]
    pub fn from_media(media: &dyn MediaQueryHost, width: f64, height: f64) -> Self {
        let matches = |query: &str| media.match_media(query).is_some_and(|list| list.matches());
        let enabled = !matches(COARSE_POINTER_QUERY) && !matches(REDUCED_MOTION_QUERY);
        debug!(target: "folio.pointer", enabled, "custom cursor");
        Self::new(enabled, width, height)
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn variant(&self) -> CursorVariant {
        self.variant
    }

    #[must_use]
    pub fn position(&self) -> (f64, f64) {
        self.position
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.target = (x, y);
    }

    /// Pressing keeps the magnetic look.
    pub fn pointer_down(&mut self) {
        if self.variant != CursorVariant::Magnetic {
            self.variant = CursorVariant::Down;
        }
    }

    pub fn pointer_up(&mut self) {
        self.variant = CursorVariant::Default;
    }

    pub fn pointer_over(&mut self, target: HoverTarget) {
        self.variant = match target {
            HoverTarget::Plain => CursorVariant::Default,
            HoverTarget::Interactive => CursorVariant::Hover,
            HoverTarget::Magnetic => CursorVariant::Magnetic,
        };
    }

    pub fn pointer_out(&mut self) {
        self.variant = CursorVariant::Default;
    }

    /// Advance one frame toward the pointer.
    pub fn tick(&mut self) {
        self.position.0 += (self.target.0 - self.position.0) * FOLLOW_FACTOR;
        self.position.1 += (self.target.1 - self.position.1) * FOLLOW_FACTOR;
    }

    /// CSS transform for the cursor element.
    #[must_use]
    pub fn transform(&self) -> String {
        format!(
            "translate({}px, {}px) translate(-50%, -50%) scale({})",
            self.position.0,
            self.position.1,
            self.variant.scale()
        )
    }

    /// Hide the native cursor while this one is shown.
    pub fn apply_to(&self, mode: &mut UiModeContext) {
        mode.native_cursor_hidden = self.enabled;
    }
}

/// Translation of a magnetic element toward `pointer`, per axis clamped to
/// `±max_translate`.
#[must_use]
pub fn magnetic_offset(rect: &Rect, pointer: (f64, f64), strength: f64, max_translate: f64) -> (f64, f64) {
    let cx = rect.x + rect.width / 2.0;
    let cy = rect.y + rect.height / 2.0;
    let clamp = |d: f64| (d * strength).clamp(-max_translate, max_translate);
    (clamp(pointer.0 - cx), clamp(pointer.1 - cy))
}

/// CSS transform for a magnetic element; `None` resets it.
#[must_use]
pub fn magnetic_transform(offset: Option<(f64, f64)>) -> String {
    let (x, y) = offset.unwrap_or((0.0, 0.0));
    format!("translate({x}px, {y}px)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media_query::SimulatedMediaHost;

    #[test]
    fn disabled_on_coarse_pointer_or_reduced_motion() {
        let media = SimulatedMediaHost::new();
        assert!(CursorFx::from_media(&media, 100.0, 100.0).is_enabled());
        media.set_matches(COARSE_POINTER_QUERY, true);
        assert!(!CursorFx::from_media(&media, 100.0, 100.0).is_enabled());

        let media = SimulatedMediaHost::new();
        media.set_matches(REDUCED_MOTION_QUERY, true);
        let fx = CursorFx::from_media(&media, 100.0, 100.0);
        let mut mode = UiModeContext::page_default();
        fx.apply_to(&mut mode);
        assert!(!mode.native_cursor_hidden);
    }

    #[test]
    fn variants_and_scales() {
        let mut fx = CursorFx::new(true, 100.0, 100.0);
        fx.pointer_over(HoverTarget::Interactive);
        assert_eq!(fx.variant(), CursorVariant::Hover);
        fx.pointer_down();
        assert_eq!(fx.variant(), CursorVariant::Down);
        fx.pointer_up();
        fx.pointer_over(HoverTarget::Magnetic);
        fx.pointer_down();
        assert_eq!(fx.variant(), CursorVariant::Magnetic);
        assert_eq!(fx.variant().scale(), 2.0);
        fx.pointer_out();
        assert_eq!(fx.variant(), CursorVariant::Default);
    }

    #[test]
    fn lerp_follow() {
        let mut fx = CursorFx::new(true, 200.0, 200.0);
        fx.pointer_move(200.0, 100.0);
        fx.tick();
        let (x, y) = fx.position();
        assert!((x - 118.0).abs() < 1e-9);
        assert!((y - 100.0).abs() < 1e-9);
        assert_eq!(fx.transform(), format!("translate({x}px, 100px) translate(-50%, -50%) scale(1)"));
        for _ in 0..200 {
            fx.tick();
        }
        assert!((fx.position().0 - 200.0).abs() < 1e-6);
    }

    #[test]
    fn magnetic_offset_is_clamped() {
        let rect = Rect::new(0.0, 0.0, 100.0, 40.0);
        assert_eq!(magnetic_offset(&rect, (60.0, 20.0), 0.25, 18.0), (2.5, 0.0));
        assert_eq!(magnetic_offset(&rect, (500.0, -500.0), 0.25, 18.0), (18.0, -18.0));
        assert_eq!(magnetic_transform(None), "translate(0px, 0px)");
    }
}
