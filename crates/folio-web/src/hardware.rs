#![forbid(unsafe_code)]

//! Hardware signals from `navigator`.

use folio_core::device::HardwareSignals;

/// Normalize raw `navigator` values.
///
/// `hardwareConcurrency` reports `0` or nothing when hidden, and
/// `deviceMemory` is missing outside Chromium; both map to "unreported".
#[must_use]
pub fn signals_from_navigator(
    hardware_concurrency: Option<f64>,
    device_memory: Option<f64>,
    user_agent: Option<String>,
) -> HardwareSignals {
    let logical_cores = hardware_concurrency
        .filter(|c| c.is_finite() && *c >= 1.0)
        .map(|c| c.min(f64::from(u32::MAX)) as u32);
    let device_memory_gb = device_memory.filter(|m| m.is_finite() && *m > 0.0);
    HardwareSignals {
        logical_cores,
        device_memory_gb,
        user_agent: user_agent.filter(|ua| !ua.is_empty()),
    }
}

/// Read the signals of the current page.
#[cfg(target_arch = "wasm32")]
#[must_use]
pub fn read_navigator() -> HardwareSignals {
    use wasm_bindgen::JsValue;

    let Some(navigator) = web_sys::window().map(|w| w.navigator()) else {
        return HardwareSignals::default();
    };
    let memory = js_sys::Reflect::get(&navigator, &JsValue::from_str("deviceMemory"))
        .ok()
        .and_then(|v| v.as_f64());
    signals_from_navigator(
        Some(navigator.hardware_concurrency()),
        memory,
        navigator.user_agent().ok(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::device::LowEndThresholds;

    #[test]
    fn hidden_values_are_unreported() {
        let signals = signals_from_navigator(Some(0.0), Some(f64::NAN), Some(String::new()));
        assert_eq!(signals, HardwareSignals::default());
        assert!(!signals.is_low_end(&LowEndThresholds::default()));
    }

    #[test]
    fn reported_values_pass_through() {
        let signals = signals_from_navigator(Some(2.0), Some(4.0), Some("Mozilla/5.0".into()));
        assert_eq!(signals.logical_cores, Some(2));
        assert_eq!(signals.device_memory_gb, Some(4.0));
        assert!(signals.is_low_end(&LowEndThresholds::default()));
    }
}
