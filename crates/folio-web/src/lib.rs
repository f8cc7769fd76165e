#![forbid(unsafe_code)]

//! Browser adapters for Folio.
//!
//! Implements the platform traits of `folio-runtime` on top of `web-sys`
//! and exposes the mounted page as a `wasm-bindgen` class:
//!
//! | Runtime seam | Adapter |
//! |--------------|---------|
//! | `KeyValueStore` | `storage::LocalStore` (`localStorage`) |
//! | `HitTransport` | `transport::FetchHitTransport` (`fetch` + `AbortController`) |
//! | `IntersectionHost` | `intersection::BrowserIntersectionHost` |
//! | `MediaQueryHost` | `media::BrowserMediaHost` (`matchMedia`) |
//! | `FrameScheduler` | `frames::RafScheduler` (`requestAnimationFrame`) |
//!
//! Only [`hardware`] normalization and [`logging`] build on native targets;
//! everything touching `web-sys` is `wasm32`-only.

pub mod hardware;
pub mod logging;

#[cfg(target_arch = "wasm32")]
pub mod app;
#[cfg(target_arch = "wasm32")]
pub mod dom;
#[cfg(target_arch = "wasm32")]
pub mod frames;
#[cfg(target_arch = "wasm32")]
pub mod intersection;
#[cfg(target_arch = "wasm32")]
pub mod media;
#[cfg(target_arch = "wasm32")]
pub mod storage;
#[cfg(target_arch = "wasm32")]
pub mod transport;

#[cfg(target_arch = "wasm32")]
pub use app::FolioApp;

/// Best-effort text of a thrown JS value.
#[cfg(target_arch = "wasm32")]
pub(crate) fn js_error_message(err: &wasm_bindgen::JsValue) -> String {
    use wasm_bindgen::JsCast;

    if let Some(error) = err.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}
