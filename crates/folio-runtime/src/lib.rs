#![forbid(unsafe_code)]

//! Host-driven state machines behind the Folio portfolio page.
//!
//! # Role in Folio
//! `folio-runtime` holds every piece of page behavior that is not markup:
//! the view counter, scroll-spy, reveal-on-view, device profiling, the
//! contact form and the custom cursor. Each is a plain state machine that
//! talks to the platform only through the traits in this crate, so the same
//! code runs in the browser (through `folio-web`) and in native tests.
//!
//! # Platform seams
//! - [`storage::KeyValueStore`] for the count cache.
//! - [`view_counter::HitTransport`] for the counting service.
//! - [`intersection::IntersectionHost`] for element visibility.
//! - [`media_query::MediaQueryHost`] for media queries.
//! - [`frames::FrameScheduler`] for per-frame callbacks.
//!
//! Deterministic in-process implementations ([`MemoryStore`],
//! [`GeometryObserverHost`], [`SimulatedMediaHost`],
//! [`ManualFrameScheduler`]) ship alongside for native hosts and tests.
//!
//! # Threading
//! Everything is single-threaded: shared state is `Rc<RefCell<_>>` and no
//! type is `Send`. Handles returned by `observe`/`subscribe`/`schedule`
//! release their platform resource synchronously on drop.

pub mod abort;
pub mod config;
pub mod contact;
pub mod device_profile;
pub mod frames;
pub mod intersection;
pub mod locale;
pub mod media_query;
pub mod pointer_fx;
pub mod reactive;
pub mod reveal;
pub mod scroll_spy;
pub mod storage;
pub mod view_counter;

pub use abort::AbortSignal;
pub use config::{
    ConfigError, ContactConfig, CounterConfig, DeviceConfig, FolioConfig, RevealConfig,
    ScrollSpyConfig,
};
pub use contact::{ContactForm, ContactRejection, ContactStatus, RelayError, RelayRequest};
pub use device_profile::DeviceProfileTracker;
pub use frames::{FrameRateMonitor, FrameScheduler, FrameTask, ManualFrameScheduler};
pub use intersection::{
    GeometryObserverHost, IntersectionEntry, IntersectionHost, ObserverHandle, ObserverOptions,
};
pub use locale::{LocaleContext, format_grouped};
pub use media_query::{
    ListenerApi, MediaQueryHost, MediaQueryList, MediaSubscription, SimulatedMediaHost,
    subscribe_media_query,
};
pub use pointer_fx::{CursorFx, CursorVariant, HoverTarget, magnetic_offset};
pub use reactive::{Binding, Observable, Subscription};
pub use reveal::{Reveal, RevealOptions};
pub use scroll_spy::ScrollSpy;
pub use storage::{CountCache, KeyValueStore, MemoryStore, StorageError};
pub use view_counter::{
    CountDisplay, CountError, HitRequest, HitTicket, HitTransport, MountedCounter, ViewCounter,
    parse_hit_response,
};
