#![forbid(unsafe_code)]

//! Device capability and motion-preference profile.
//!
//! [`DeviceProfile`] is the derived, read-only input to every "should this be
//! animated" decision on the page. The runtime keeps it current; this module
//! only defines the flags, the hardware heuristics and the backdrop choice.
//!
//! # Invariants
//!
//! 1. Reduced motion never selects [`BackdropMode::Full`].
//! 2. An absent hardware signal never makes a device low-end.
//! 3. [`BackdropMode::select`] is a pure function of the profile.

use core::fmt;
use std::sync::LazyLock;

use regex_lite::Regex;

/// Media query for the platform motion preference.
pub const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

/// Media query for touch-first devices without hover.
pub const COARSE_POINTER_QUERY: &str = "(pointer: coarse), (hover: none)";

/// Widest viewport, in CSS pixels, still classified as mobile.
pub const MOBILE_MAX_WIDTH_PX: u32 = 640;

/// Media query matching viewports up to `max_width_px` wide.
#[must_use]
pub fn mobile_query(max_width_px: u32) -> String {
    format!("(max-width: {max_width_px}px)")
}

/// Flags that gate expensive decorative rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DeviceProfile {
    pub prefers_reduced_motion: bool,
    pub is_mobile_viewport: bool,
    pub is_low_end_hardware: bool,
    /// Sticky: once the frame rate dropped on mobile it stays set.
    pub is_animation_struggling: bool,
}

impl DeviceProfile {
    /// Decorative background for this profile.
    #[must_use]
    pub fn backdrop(&self) -> BackdropMode {
        BackdropMode::select(self)
    }

    /// Whether reveal-on-view animations should run at all.
    ///
    /// Mobile viewports render content as already revealed.
    #[must_use]
    pub fn animates_reveals(&self) -> bool {
        !self.is_mobile_viewport
    }
}

/// Rendering path of the decorative page background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackdropMode {
    /// Every layer animated (rotation, float, gradient drift).
    Full,
    /// Fewer layers, no per-frame drift.
    Reduced,
    /// A single static gradient.
    Static,
}

impl BackdropMode {
    /// Pick the background path.
    ///
    /// Reduced motion or a struggling frame rate force the static gradient;
    /// low-end hardware or a mobile viewport get the reduced animation.
    #[must_use]
    pub fn select(profile: &DeviceProfile) -> Self {
        if profile.prefers_reduced_motion || profile.is_animation_struggling {
            Self::Static
        } else if profile.is_low_end_hardware || profile.is_mobile_viewport {
            Self::Reduced
        } else {
            Self::Full
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Reduced => "reduced",
            Self::Static => "static",
        }
    }
}

impl fmt::Display for BackdropMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Limits below which hardware counts as low-end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LowEndThresholds {
    pub max_cores: u32,
    pub max_memory_gb: f64,
}

impl Default for LowEndThresholds {
    fn default() -> Self {
        Self {
            max_cores: 2,
            max_memory_gb: 2.0,
        }
    }
}

/// Raw hardware signals as reported by the platform.
///
/// `None` means the platform did not report the signal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HardwareSignals {
    pub logical_cores: Option<u32>,
    pub device_memory_gb: Option<f64>,
    pub user_agent: Option<String>,
}

impl HardwareSignals {
    /// Low-end if any reported signal is at or under its limit.
    ///
    /// A core count of zero is treated as unreported.
    #[must_use]
    pub fn is_low_end(&self, limits: &LowEndThresholds) -> bool {
        let few_cores = self
            .logical_cores
            .is_some_and(|cores| cores > 0 && cores <= limits.max_cores);
        let little_memory = self
            .device_memory_gb
            .is_some_and(|gb| gb.is_finite() && gb > 0.0 && gb <= limits.max_memory_gb);
        let old_browser = self
            .user_agent
            .as_deref()
            .is_some_and(is_legacy_mobile_user_agent);
        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "folio.device",
            few_cores,
            little_memory,
            old_browser,
            "hardware classified"
        );
        few_cores || little_memory || old_browser
    }
}

/// Discontinued mobile platforms, Android before 7 and iOS before 13.
const LEGACY_MOBILE_UA_PATTERN: &str = concat!(
    r"Opera Mini|IEMobile|Windows Phone|BlackBerry|BB10|webOS|Symbian",
    r"|Android [0-6](?:[^0-9]|$)",
    r"|(?:iPhone|iPad|iPod).* OS (?:[0-9]|1[0-2])(?:[^0-9]|$)",
);

static LEGACY_MOBILE_UA: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(LEGACY_MOBILE_UA_PATTERN).ok());

/// Whether a user agent belongs to an old mobile browser.
///
/// Matches discontinued mobile platforms, Android before 7 and iOS before 13.
#[must_use]
pub fn is_legacy_mobile_user_agent(ua: &str) -> bool {
    LEGACY_MOBILE_UA
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(ua))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODERN_ANDROID: &str = "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Mobile Safari/537.36";
    const OLD_ANDROID: &str = "Mozilla/5.0 (Linux; U; Android 4.4.2; en-us; GT-I9505) AppleWebKit/534.30 (KHTML, like Gecko) Version/4.0 Mobile Safari/534.30";
    const OLD_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 9_3_5 like Mac OS X) AppleWebKit/601.1.46 (KHTML, like Gecko) Version/9.0 Mobile/13G36 Safari/601.1";
    const NEW_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1";
    const DESKTOP: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0";

    fn cores(n: u32) -> HardwareSignals {
        HardwareSignals {
            logical_cores: Some(n),
            ..HardwareSignals::default()
        }
    }

    #[test]
    fn two_cores_is_low_end_eight_is_not() {
        let limits = LowEndThresholds::default();
        assert!(cores(2).is_low_end(&limits));
        assert!(!cores(8).is_low_end(&limits));
    }

    #[test]
    fn absent_signals_are_not_low_end() {
        assert!(!HardwareSignals::default().is_low_end(&LowEndThresholds::default()));
        assert!(!cores(0).is_low_end(&LowEndThresholds::default()));
    }

    #[test]
    fn small_memory_is_low_end() {
        let signals = HardwareSignals {
            logical_cores: Some(8),
            device_memory_gb: Some(2.0),
            user_agent: Some(DESKTOP.into()),
        };
        assert!(signals.is_low_end(&LowEndThresholds::default()));
        let roomy = HardwareSignals {
            device_memory_gb: Some(8.0),
            ..signals
        };
        assert!(!roomy.is_low_end(&LowEndThresholds::default()));
    }

    #[test]
    fn legacy_user_agents() {
        assert!(is_legacy_mobile_user_agent(OLD_ANDROID));
        assert!(is_legacy_mobile_user_agent(OLD_IPHONE));
        assert!(is_legacy_mobile_user_agent("Opera/9.80 (J2ME/MIDP; Opera Mini/9.80)"));
        assert!(!is_legacy_mobile_user_agent(MODERN_ANDROID));
        assert!(!is_legacy_mobile_user_agent(NEW_IPHONE));
        assert!(!is_legacy_mobile_user_agent(DESKTOP));
    }

    #[test]
    fn legacy_version_boundaries() {
        assert!(LEGACY_MOBILE_UA.is_some());
        assert!(is_legacy_mobile_user_agent("Mozilla/5.0 (Linux; Android 6.0.1; Nexus 5)"));
        assert!(!is_legacy_mobile_user_agent("Mozilla/5.0 (Linux; Android 7.0; SM-G930F)"));
        assert!(!is_legacy_mobile_user_agent("Mozilla/5.0 (Linux; Android 10; K)"));
        assert!(is_legacy_mobile_user_agent(
            "Mozilla/5.0 (iPad; CPU OS 12_5_7 like Mac OS X) AppleWebKit/605.1.15"
        ));
        assert!(!is_legacy_mobile_user_agent(
            "Mozilla/5.0 (iPad; CPU OS 13_0 like Mac OS X) AppleWebKit/605.1.15"
        ));
        assert!(!is_legacy_mobile_user_agent(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) Safari/605.1.15"
        ));
    }

    #[test]
    fn reduced_motion_never_selects_full() {
        for bits in 0u8..8 {
            let profile = DeviceProfile {
                prefers_reduced_motion: true,
                is_mobile_viewport: bits & 1 != 0,
                is_low_end_hardware: bits & 2 != 0,
                is_animation_struggling: bits & 4 != 0,
            };
            assert_ne!(profile.backdrop(), BackdropMode::Full, "{profile:?}");
        }
    }

    #[test]
    fn backdrop_selection_table() {
        let base = DeviceProfile::default();
        assert_eq!(base.backdrop(), BackdropMode::Full);
        let mobile = DeviceProfile {
            is_mobile_viewport: true,
            ..base
        };
        assert_eq!(mobile.backdrop(), BackdropMode::Reduced);
        let struggling = DeviceProfile {
            is_animation_struggling: true,
            ..mobile
        };
        assert_eq!(struggling.backdrop(), BackdropMode::Static);
        let low_end = DeviceProfile {
            is_low_end_hardware: true,
            ..base
        };
        assert_eq!(low_end.backdrop(), BackdropMode::Reduced);
    }

    #[test]
    fn mobile_query_format() {
        assert_eq!(mobile_query(MOBILE_MAX_WIDTH_PX), "(max-width: 640px)");
    }
}
