#![forbid(unsafe_code)]

//! Platform-independent building blocks for Folio.
//!
//! This crate owns the plain data types that both the runtime state machines
//! and the browser adapters agree on:
//!
//! - [`CounterKey`] and [`slugify`] for view-counter identity.
//! - [`Rect`], [`RootMargin`] and [`ThresholdSet`] for intersection geometry.
//! - [`DeviceProfile`], [`HardwareSignals`] and [`BackdropMode`] for
//!   capability-driven rendering choices.
//! - [`UiModeContext`] for the document-level classes a host applies.
//!
//! Nothing here performs I/O or touches a platform API.

pub mod counter_key;
pub mod device;
pub mod geometry;
pub mod ui_mode;

pub use counter_key::{CounterKey, slugify};
pub use device::{BackdropMode, DeviceProfile, HardwareSignals, LowEndThresholds};
pub use geometry::{MarginLength, MarginParseError, Rect, RootMargin, ThresholdSet};
pub use ui_mode::{ClassChange, ClassTarget, UiModeContext};
