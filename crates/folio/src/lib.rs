#![forbid(unsafe_code)]

//! Folio public facade.
//!
//! Re-exports the core types and, with the default `runtime` feature, the
//! page state machines. Most users only need the [`prelude`].
//!
//! ```
//! use folio::prelude::*;
//!
//! let key = CounterKey::project("folio", "Carla-RL Bus");
//! assert_eq!(key.cache_key(), "vcache:folio:project-carla-rl-bus");
//! ```

pub use folio_core as core;
#[cfg(feature = "runtime")]
pub use folio_runtime as runtime;

pub use folio_core::counter_key::CounterKey;
pub use folio_core::device::{BackdropMode, DeviceProfile, HardwareSignals};
pub use folio_core::geometry::{Rect, RootMargin, ThresholdSet};
pub use folio_core::ui_mode::UiModeContext;

#[cfg(feature = "runtime")]
pub use folio_runtime::{
    CountDisplay, CountError, CursorFx, DeviceProfileTracker, FolioConfig, IntersectionHost,
    KeyValueStore, MediaQueryHost, MountedCounter, Observable, Reveal, ScrollSpy, ViewCounter,
};

/// Everything a page host typically needs.
pub mod prelude {
    pub use folio_core::counter_key::CounterKey;
    pub use folio_core::device::{BackdropMode, DeviceProfile, HardwareSignals};
    pub use folio_core::geometry::{Rect, RootMargin};
    pub use folio_core::ui_mode::{ClassChange, UiModeContext};

    #[cfg(feature = "runtime")]
    pub use folio_runtime::{
        ContactForm, CountDisplay, CursorFx, DeviceProfileTracker, FolioConfig,
        FrameScheduler, HitTransport, IntersectionHost, KeyValueStore, LocaleContext,
        MediaQueryHost, MountedCounter, Observable, ObserverOptions, Reveal, RevealOptions,
        ScrollSpy, Subscription, ViewCounter,
    };
}

#[cfg(all(test, feature = "runtime"))]
mod tests {
    use super::prelude::*;
    use pretty_assertions::assert_eq;
    use std::rc::Rc;
    use std::time::Instant;

    #[test]
    fn prelude_mounts_a_counter_from_cache() {
        let store = Rc::new(folio_runtime::MemoryStore::with_entries([(
            "vcache:portfolio:site",
            "9",
        )]));
        let config = FolioConfig::default();
        let mut counter = ViewCounter::new(
            CounterKey::site(config.counter.namespace.clone()),
            store,
            &config.counter,
        );
        let _request = counter.activate(Instant::now());
        assert_eq!(counter.current(), CountDisplay::Count(9));
    }
}
