#![forbid(unsafe_code)]

//! Tunables for every Folio state machine.
//!
//! [`FolioConfig::default()`] reproduces the constants the page ships with.
//! With the `policy-config` feature the same structure loads from TOML or
//! JSON; missing tables and fields fall back to their defaults.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Syntax error | Malformed TOML/JSON | `ConfigError::Parse` |
//! | Bad root margin | `"1em"` in `scroll_spy.root_margin` | `ConfigError::Invalid` |
//! | Out-of-range value | threshold outside `[0, 1]`, zero timeout | `ConfigError::Invalid` |

use std::time::Duration;

use folio_core::device::{LowEndThresholds, MOBILE_MAX_WIDTH_PX, mobile_query};
use folio_core::geometry::{RootMargin, ThresholdSet};
use serde::Deserialize;

use crate::intersection::ObserverOptions;

/// Errors from loading or validating configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The document could not be parsed.
    Parse(String),
    /// A field holds a value outside its domain.
    Invalid { field: &'static str, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "config parse error: {msg}"),
            Self::Invalid { field, reason } => write!(f, "invalid config field {field}: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    pub counter: CounterConfig,
    pub scroll_spy: ScrollSpyConfig,
    pub reveal: RevealConfig,
    pub device: DeviceConfig,
    pub contact: ContactConfig,
}

/// View-counter settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    /// Base URL of the counting service.
    pub host: String,
    /// Namespace used when a counter does not name one.
    pub namespace: String,
    /// Deadline of a single hit request.
    pub timeout_ms: u64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            host: "https://api.countapi.xyz".to_string(),
            namespace: "portfolio".to_string(),
            timeout_ms: 2_000,
        }
    }
}

impl CounterConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Scroll-spy observer settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScrollSpyConfig {
    /// CSS margin shorthand applied to the viewport.
    pub root_margin: String,
    pub thresholds: Vec<f64>,
}

impl Default for ScrollSpyConfig {
    fn default() -> Self {
        Self {
            root_margin: "-60% 0px -35% 0px".to_string(),
            thresholds: vec![0.0, 0.2, 0.5, 1.0],
        }
    }
}

impl ScrollSpyConfig {
    /// Observer options for one spied section.
    pub fn observer_options(&self) -> Result<ObserverOptions, ConfigError> {
        let root_margin = RootMargin::parse(&self.root_margin).map_err(|e| ConfigError::Invalid {
            field: "scroll_spy.root_margin",
            reason: e.to_string(),
        })?;
        Ok(ObserverOptions {
            root_margin,
            thresholds: ThresholdSet::new(self.thresholds.iter().copied()),
        })
    }
}

/// Reveal-on-view defaults.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Visible fraction of the block that triggers the reveal.
    pub threshold: f64,
    /// Fraction of the viewport height cut from the bottom of the trigger region.
    pub bottom_margin: f64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            threshold: 0.2,
            bottom_margin: 0.1,
        }
    }
}

/// Device profiling limits.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub mobile_max_width_px: u32,
    pub low_end_max_cores: u32,
    pub low_end_max_memory_gb: f64,
    /// Frames per window below which a mobile session counts as struggling.
    pub struggle_min_frames: u32,
    pub struggle_window_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            mobile_max_width_px: MOBILE_MAX_WIDTH_PX,
            low_end_max_cores: 2,
            low_end_max_memory_gb: 2.0,
            struggle_min_frames: 30,
            struggle_window_ms: 1_000,
        }
    }
}

impl DeviceConfig {
    #[must_use]
    pub fn mobile_query(&self) -> String {
        mobile_query(self.mobile_max_width_px)
    }

    #[must_use]
    pub fn low_end(&self) -> LowEndThresholds {
        LowEndThresholds {
            max_cores: self.low_end_max_cores,
            max_memory_gb: self.low_end_max_memory_gb,
        }
    }

    #[must_use]
    pub fn struggle_window(&self) -> Duration {
        Duration::from_millis(self.struggle_window_ms)
    }
}

/// Contact form relay settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    pub endpoint: String,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://formspree.io/f/folio".to_string(),
        }
    }
}

impl FolioConfig {
    /// Check every field against its domain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, reason: &str| {
            Err(ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            })
        };
        if self.counter.host.trim().is_empty() {
            return invalid("counter.host", "must not be empty");
        }
        if self.counter.namespace.trim().is_empty() {
            return invalid("counter.namespace", "must not be empty");
        }
        if self.counter.timeout_ms == 0 {
            return invalid("counter.timeout_ms", "must be positive");
        }
        self.scroll_spy.observer_options()?;
        if self
            .scroll_spy
            .thresholds
            .iter()
            .any(|t| !(0.0..=1.0).contains(t))
        {
            return invalid("scroll_spy.thresholds", "values must be within [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.reveal.threshold) {
            return invalid("reveal.threshold", "must be within [0, 1]");
        }
        if !(0.0..1.0).contains(&self.reveal.bottom_margin) {
            return invalid("reveal.bottom_margin", "must be within [0, 1)");
        }
        if self.device.struggle_window_ms == 0 {
            return invalid("device.struggle_window_ms", "must be positive");
        }
        if self.contact.endpoint.trim().is_empty() {
            return invalid("contact.endpoint", "must not be empty");
        }
        Ok(())
    }

    /// Load and validate a TOML document.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON document.
    #[cfg(feature = "policy-config")]
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = FolioConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.counter.timeout(), Duration::from_secs(2));
        assert_eq!(config.device.mobile_query(), "(max-width: 640px)");
    }

    #[test]
    fn spy_options_from_defaults() {
        let options = FolioConfig::default()
            .scroll_spy
            .observer_options()
            .unwrap();
        assert_eq!(options.thresholds.values(), &[0.0, 0.2, 0.5, 1.0]);
        assert_eq!(options.root_margin.to_string(), "-60% 0px -35% 0px");
    }

    #[test]
    fn invalid_fields_are_reported() {
        let mut config = FolioConfig::default();
        config.reveal.threshold = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "reveal.threshold",
                ..
            })
        ));

        let mut config = FolioConfig::default();
        config.scroll_spy.root_margin = "1em".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "scroll_spy.root_margin",
                ..
            })
        ));
    }
}
